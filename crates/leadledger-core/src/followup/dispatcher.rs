//! Follow-up batch execution.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::selector::FollowUpSelector;
use crate::enquiry::{Enquiry, EnquiryId, EnquiryStore, EnquiryUpdate};
use crate::service::{MailSender, NotificationSettings, templates};
use crate::{Error, Result};

/// Default pause between successive follow-up sends.
pub const DEFAULT_PACING: Duration = Duration::from_millis(600);

/// Default number of enquiries loaded per store query.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Tunables for a follow-up batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FollowUpSettings {
    /// Which enquiries are due.
    pub selector: FollowUpSelector,
    /// Pause between sends; zero disables it.
    pub pacing: Duration,
    /// Enquiries loaded per store query.
    pub page_size: u32,
}

impl Default for FollowUpSettings {
    fn default() -> Self {
        Self {
            selector: FollowUpSelector::default(),
            pacing: DEFAULT_PACING,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Counts from one batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FollowUpReport {
    /// Enquiries a send was attempted for.
    pub attempted: u32,
    /// Sends confirmed and recorded.
    pub sent: u32,
    /// Sends that failed; these stay eligible for the next run.
    pub failed: u32,
}

/// Sends follow-ups to stale enquiries.
///
/// Each enquiry is handled in turn: send, and only if the send is confirmed,
/// record `follow_up_sent_at`. That record is what keeps the enquiry out of
/// later selections, so a confirmed send is always marked and an unconfirmed
/// one never is.
///
/// Runs must not overlap; the caller is responsible for serialising them.
#[derive(Clone)]
pub struct FollowUpDispatcher {
    store: Arc<dyn EnquiryStore>,
    mailer: Arc<dyn MailSender>,
    notifications: NotificationSettings,
    settings: FollowUpSettings,
}

impl FollowUpDispatcher {
    /// Creates a dispatcher with default settings.
    #[must_use]
    pub fn new(
        store: Arc<dyn EnquiryStore>,
        mailer: Arc<dyn MailSender>,
        notifications: NotificationSettings,
    ) -> Self {
        Self {
            store,
            mailer,
            notifications,
            settings: FollowUpSettings::default(),
        }
    }

    /// Replaces the batch settings.
    #[must_use]
    pub const fn with_settings(mut self, settings: FollowUpSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Sets the pause between sends.
    #[must_use]
    pub const fn with_pacing(mut self, pacing: Duration) -> Self {
        self.settings.pacing = pacing;
        self
    }

    /// Enquiries the next run would contact, without sending anything.
    ///
    /// # Errors
    ///
    /// Returns an error if the store query fails.
    pub async fn preview(&self, now: DateTime<Utc>) -> Result<Vec<Enquiry>> {
        self.settings.selector.select(self.store.as_ref(), now).await
    }

    /// Run one batch.
    ///
    /// A failed send is logged and skipped. A store failure aborts the batch,
    /// since an unrecorded send would be repeated next run.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be queried or a confirmed send
    /// cannot be recorded.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<FollowUpReport> {
        let page_size = self.settings.page_size.max(1);
        let mut report = FollowUpReport::default();
        let mut cursor: Option<EnquiryId> = None;

        loop {
            let page = self
                .settings
                .selector
                .select_page(self.store.as_ref(), now, cursor, page_size)
                .await
                .inspect_err(|e| error!(error = %e, "Follow-up selection failed"))?;

            let Some(last) = page.last() else {
                break;
            };
            cursor = Some(last.id);
            debug!(count = page.len(), "Loaded follow-up page");

            for enquiry in &page {
                if report.attempted > 0 && !self.settings.pacing.is_zero() {
                    tokio::time::sleep(self.settings.pacing).await;
                }
                report.attempted += 1;

                if self.follow_up(enquiry, now).await? {
                    report.sent += 1;
                } else {
                    report.failed += 1;
                }
            }

            if page.len() < page_size as usize {
                break;
            }
        }

        info!(
            attempted = report.attempted,
            sent = report.sent,
            failed = report.failed,
            "Follow-up batch finished"
        );
        Ok(report)
    }

    /// Send one follow-up. Returns whether it was sent.
    async fn follow_up(&self, enquiry: &Enquiry, now: DateTime<Utc>) -> Result<bool> {
        if !self.settings.selector.is_eligible(enquiry, now) {
            warn!(id = %enquiry.id, "Store returned an ineligible enquiry; skipping");
            return Ok(false);
        }

        let email = templates::follow_up(enquiry, &self.notifications);

        if let Err(e) = self.mailer.send(&email).await {
            warn!(id = %enquiry.id, error = %e, "Follow-up send failed; will retry next run");
            return Ok(false);
        }

        match self
            .store
            .update(enquiry.id, &EnquiryUpdate::follow_up_sent(now))
            .await
        {
            Ok(_) => {
                info!(id = %enquiry.id, priority = %enquiry.priority, "Follow-up sent");
                Ok(true)
            }
            // Deleted mid-run; nothing left to re-select.
            Err(Error::NotFound(id)) => {
                warn!(%id, "Follow-up sent but enquiry no longer exists");
                Ok(true)
            }
            Err(e) => {
                error!(
                    id = %enquiry.id,
                    error = %e,
                    "Follow-up sent but could not be recorded; aborting batch"
                );
                Err(e)
            }
        }
    }
}
