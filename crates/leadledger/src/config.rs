//! Service configuration.
//!
//! Loaded from a JSON file, with secrets overridable from the environment.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use leadledger_core::followup::{DEFAULT_PAGE_SIZE, DEFAULT_THRESHOLD_HOURS};
use leadledger_core::{FollowUpSelector, FollowUpSettings, HttpMailerConfig, NotificationSettings};
use serde::{Deserialize, Serialize};

/// Environment variable overriding the follow-up trigger secret.
pub const ENV_CRON_SECRET: &str = "LEADLEDGER_CRON_SECRET";
/// Environment variable overriding the admin token.
pub const ENV_ADMIN_TOKEN: &str = "LEADLEDGER_ADMIN_TOKEN";
/// Environment variable overriding the email API key.
pub const ENV_MAIL_API_KEY: &str = "LEADLEDGER_MAIL_API_KEY";
/// Environment variable overriding the database path.
pub const ENV_DATABASE: &str = "LEADLEDGER_DATABASE";

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address the HTTP service binds to.
    pub listen: SocketAddr,
    /// `SQLite` database file. Defaults to the user data directory.
    pub database: Option<PathBuf>,
    /// Bearer secret for the follow-up trigger. Unset leaves it open.
    pub cron_secret: Option<String>,
    /// Bearer token for admin routes. Unset disables them.
    pub admin_token: Option<String>,
    /// Business details used in outgoing mail.
    pub business: BusinessConfig,
    /// Email API settings.
    pub mail: MailConfig,
    /// Follow-up batch tuning.
    pub follow_up: FollowUpConfig,
}

/// Business details used in outgoing mail.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BusinessConfig {
    /// Name used in greetings and signatures.
    pub name: String,
    /// Inbox for new-lead alerts.
    pub alert_to: String,
    /// Reply-To for mail sent to leads.
    pub reply_to: Option<String>,
    /// Public site URL.
    pub site_url: Option<String>,
}

/// Email API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    /// API base URL.
    pub api_url: String,
    /// API key.
    pub api_key: String,
    /// From header.
    pub from: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

/// Follow-up batch tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FollowUpConfig {
    /// Hours before an unanswered enquiry is stale.
    pub threshold_hours: i64,
    /// Pause between sends in milliseconds.
    pub pacing_ms: u64,
    /// Enquiries loaded per store query.
    pub page_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([127, 0, 0, 1], 3000)),
            database: None,
            cron_secret: None,
            admin_token: None,
            business: BusinessConfig::default(),
            mail: MailConfig::default(),
            follow_up: FollowUpConfig::default(),
        }
    }
}

impl Default for BusinessConfig {
    fn default() -> Self {
        Self {
            name: "LeadLedger".to_string(),
            alert_to: "leads@localhost".to_string(),
            reply_to: None,
            site_url: None,
        }
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.resend.com".to_string(),
            api_key: String::new(),
            from: "LeadLedger <noreply@localhost>".to_string(),
            timeout_secs: 15,
        }
    }
}

impl Default for FollowUpConfig {
    fn default() -> Self {
        Self {
            threshold_hours: DEFAULT_THRESHOLD_HOURS,
            pacing_ms: 600,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Config {
    /// Default config file location.
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("leadledger")
            .join("config.json")
    }

    /// Load configuration from `path`, or the default location.
    ///
    /// A missing file yields the defaults. Environment overrides are applied
    /// afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = path.map_or_else(Self::default_path, Path::to_path_buf);

        let mut config = if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            let contents = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("reading {}", path.display()))?;
            Self::from_json(&contents).with_context(|| format!("parsing {}", path.display()))?
        } else {
            tracing::debug!("No config at {:?}, using defaults", path);
            Self::default()
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse configuration JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed.
    pub fn from_json(contents: &str) -> serde_json::Result<Self> {
        serde_json::from_str(contents)
    }

    /// Apply environment overrides using `lookup` to read variables.
    /// Empty values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |key| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(secret) = var(ENV_CRON_SECRET) {
            self.cron_secret = Some(secret);
        }
        if let Some(token) = var(ENV_ADMIN_TOKEN) {
            self.admin_token = Some(token);
        }
        if let Some(key) = var(ENV_MAIL_API_KEY) {
            self.mail.api_key = key;
        }
        if let Some(path) = var(ENV_DATABASE) {
            self.database = Some(PathBuf::from(path));
        }
    }

    /// Database file path.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.database.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("leadledger")
                .join("leadledger.db")
        })
    }

    /// Business details for outgoing mail.
    #[must_use]
    pub fn notification_settings(&self) -> NotificationSettings {
        NotificationSettings {
            business_name: self.business.name.clone(),
            alert_to: self.business.alert_to.clone(),
            reply_to: self.business.reply_to.clone(),
            site_url: self.business.site_url.clone(),
        }
    }

    /// Email API client settings.
    #[must_use]
    pub fn mailer_config(&self) -> HttpMailerConfig {
        HttpMailerConfig {
            api_url: self.mail.api_url.clone(),
            api_key: self.mail.api_key.clone(),
            from: self.mail.from.clone(),
            timeout: Duration::from_secs(self.mail.timeout_secs),
        }
    }

    /// Follow-up batch settings.
    #[must_use]
    pub fn follow_up_settings(&self) -> FollowUpSettings {
        FollowUpSettings {
            selector: FollowUpSelector::new(chrono::Duration::hours(
                self.follow_up.threshold_hours,
            )),
            pacing: Duration::from_millis(self.follow_up.pacing_ms),
            page_size: self.follow_up.page_size,
        }
    }
}
