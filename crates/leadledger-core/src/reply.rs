//! Admin replies to enquiries.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{info, warn};

use crate::enquiry::{Enquiry, EnquiryId, EnquiryStatus, EnquiryStore, EnquiryUpdate};
use crate::service::{MailSender, NotificationSettings, templates};
use crate::{Error, Result};

/// An admin-written reply. The body may contain enquiry placeholders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReplyDraft {
    /// Subject line.
    pub subject: String,
    /// Body template.
    pub body: String,
}

impl ReplyDraft {
    /// Creates a draft.
    #[must_use]
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
        }
    }

    fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.subject.trim().is_empty() {
            missing.push("subject");
        }
        if self.body.trim().is_empty() {
            missing.push("body");
        }
        missing
    }
}

/// Audit line recorded in the enquiry notes after a reply.
#[must_use]
pub fn reply_audit_line(subject: &str, at: DateTime<Utc>) -> String {
    format!("[{}] Replied: \"{subject}\"", at.format("%Y-%m-%d %H:%M"))
}

/// Sends admin replies and records them on the enquiry.
#[derive(Clone)]
pub struct ReplyComposer {
    store: Arc<dyn EnquiryStore>,
    mailer: Arc<dyn MailSender>,
    settings: NotificationSettings,
}

impl ReplyComposer {
    /// Creates a new reply composer.
    #[must_use]
    pub fn new(
        store: Arc<dyn EnquiryStore>,
        mailer: Arc<dyn MailSender>,
        settings: NotificationSettings,
    ) -> Self {
        Self {
            store,
            mailer,
            settings,
        }
    }

    /// Send a reply and mark the enquiry `REPLIED`.
    ///
    /// The enquiry is only changed once the mail sender confirms the send.
    ///
    /// # Errors
    ///
    /// Returns `Error::MissingFields` for an empty subject or body,
    /// `Error::InvalidInput` for a subject spanning several lines,
    /// `Error::NotFound` for an unknown id, `Error::Send` if the reply could
    /// not be sent, or a database error.
    pub async fn send_reply(
        &self,
        id: EnquiryId,
        draft: &ReplyDraft,
        now: DateTime<Utc>,
    ) -> Result<Enquiry> {
        let missing = draft.missing_fields();
        if !missing.is_empty() {
            return Err(Error::MissingFields(missing));
        }

        let subject = draft.subject.trim();
        if subject.contains(['\r', '\n']) {
            return Err(Error::InvalidInput(
                "subject must be a single line".to_string(),
            ));
        }

        let enquiry = self.store.find_by_id(id).await?.ok_or(Error::NotFound(id))?;
        let email = templates::reply(&enquiry, subject, &draft.body, &self.settings);

        self.mailer.send(&email).await.map_err(|e| {
            warn!(%id, error = %e, "Reply send failed");
            Error::Send(e)
        })?;

        let update = EnquiryUpdate {
            status: Some(EnquiryStatus::Replied),
            append_note: Some(reply_audit_line(subject, now)),
            ..EnquiryUpdate::default()
        };
        let updated = self.store.update(id, &update).await?;

        info!(%id, "Reply sent");
        Ok(updated)
    }
}
