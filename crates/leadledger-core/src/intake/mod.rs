//! Enquiry intake.
//!
//! Turns a raw form submission into a stored, scored enquiry:
//!
//! 1. [`validate_submission`] checks and normalises the fields.
//! 2. The scoring engine stamps a priority.
//! 3. The record store creates the enquiry with status `NEW`.
//! 4. [`IntakeService`] then sends a lead alert and a submitter confirmation
//!    side by side. Either may fail without affecting the other or the
//!    submission result; failures are only logged.

mod validation;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

pub use validation::{
    MAX_MESSAGE_CHARS, MIN_MESSAGE_CHARS, RawSubmission, ValidSubmission, ValidationError,
    ValidationResult, validate_submission,
};

use crate::enquiry::{Enquiry, EnquiryId, EnquiryStatus, EnquiryStore};
use crate::scoring::{Priority, is_known_service};
use crate::service::{MailSender, NotificationSettings, templates};
use crate::{Error, Result};

/// What the submitter is told after a successful submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SubmissionReceipt {
    /// Id of the stored enquiry.
    pub id: EnquiryId,
    /// Tier assigned by scoring.
    pub priority: Priority,
}

/// Outcome of the two intake notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NotificationOutcome {
    /// Internal lead alert accepted by the mail sender.
    pub alert_sent: bool,
    /// Submitter confirmation accepted by the mail sender.
    pub confirmation_sent: bool,
}

/// Validate, score and store a submission.
///
/// Sends no mail.
///
/// # Errors
///
/// Returns `Error::Validation` for bad input, or a database error if the
/// enquiry could not be stored.
pub async fn accept_submission(
    store: &dyn EnquiryStore,
    raw: &RawSubmission,
    now: DateTime<Utc>,
) -> Result<Enquiry> {
    let valid = validate_submission(raw).map_err(Error::Validation)?;

    if let Some(service) = valid.service.as_deref().filter(|s| !is_known_service(s)) {
        debug!(service, "Enquiry names an unlisted service");
    }

    let new = valid.into_new_enquiry(now);
    let id = store.create(&new).await?;

    Ok(Enquiry {
        id,
        created_at: new.created_at,
        name: new.name,
        email: new.email,
        phone: new.phone,
        service: new.service,
        budget: new.budget,
        message: new.message,
        priority: new.priority,
        status: EnquiryStatus::New,
        notes: None,
        follow_up_sent_at: None,
    })
}

/// Send the lead alert and submitter confirmation concurrently.
///
/// Never fails: each send error is logged and reported in the outcome.
pub async fn send_intake_notifications(
    mailer: &dyn MailSender,
    enquiry: &Enquiry,
    settings: &NotificationSettings,
) -> NotificationOutcome {
    let alert = templates::lead_alert(enquiry, settings);
    let confirmation = templates::enquiry_confirmation(enquiry, settings);

    let (alert_result, confirmation_result) =
        tokio::join!(mailer.send(&alert), mailer.send(&confirmation));

    if let Err(e) = &alert_result {
        warn!(id = %enquiry.id, error = %e, "Lead alert failed");
    }
    if let Err(e) = &confirmation_result {
        warn!(id = %enquiry.id, error = %e, "Enquiry confirmation failed");
    }

    NotificationOutcome {
        alert_sent: alert_result.is_ok(),
        confirmation_sent: confirmation_result.is_ok(),
    }
}

/// Intake entry point used by the HTTP layer.
#[derive(Clone)]
pub struct IntakeService {
    store: Arc<dyn EnquiryStore>,
    mailer: Arc<dyn MailSender>,
    settings: NotificationSettings,
}

impl IntakeService {
    /// Creates a new intake service.
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

    /// Accept a submission and notify.
    ///
    /// Succeeds once the enquiry is stored, whatever happens to the emails.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` for bad input, or a database error if the
    /// enquiry could not be stored.
    pub async fn submit(
        &self,
        raw: &RawSubmission,
        now: DateTime<Utc>,
    ) -> Result<SubmissionReceipt> {
        let enquiry = accept_submission(self.store.as_ref(), raw, now).await?;
        info!(id = %enquiry.id, priority = %enquiry.priority, "Enquiry received");

        let outcome =
            send_intake_notifications(self.mailer.as_ref(), &enquiry, &self.settings).await;
        debug!(
            id = %enquiry.id,
            alert_sent = outcome.alert_sent,
            confirmation_sent = outcome.confirmation_sent,
            "Intake notifications finished"
        );

        Ok(SubmissionReceipt {
            id: enquiry.id,
            priority: enquiry.priority,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::enquiry::EnquiryRepository;
    use crate::service::mailer::testing::RecordingMailer;
    use chrono::TimeZone;

    fn settings() -> NotificationSettings {
        NotificationSettings {
            business_name: "Harbour Buyers Agency".to_string(),
            alert_to: "leads@harbour.example".to_string(),
            reply_to: None,
            site_url: Some("https://harbour.example".to_string()),
        }
    }

    fn raw() -> RawSubmission {
        RawSubmission {
            first_name: Some("Jane".to_string()),
            last_name: Some("Citizen".to_string()),
            email: Some("jane@example.com".to_string()),
            phone: None,
            service: Some("Full Service Buyers Agency".to_string()),
            budget: Some("$1,000,000 - $1,250,000".to_string()),
            message: Some("Looking to buy a family home this spring.".to_string()),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_submit_stores_scored_enquiry_and_notifies() {
        let store = Arc::new(EnquiryRepository::in_memory().await.unwrap());
        let mailer = Arc::new(RecordingMailer::new());
        let intake = IntakeService::new(store.clone(), mailer.clone(), settings());

        let receipt = intake.submit(&raw(), now()).await.unwrap();

        assert_eq!(receipt.priority, Priority::Hot);
        let stored = store.find_by_id(receipt.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Jane Citizen");
        assert_eq!(stored.status, EnquiryStatus::New);
        assert_eq!(stored.created_at, now());
        assert_eq!(mailer.sent_to("leads@harbour.example"), 1);
        assert_eq!(mailer.sent_to("jane@example.com"), 1);
    }

    #[tokio::test]
    async fn test_notification_failures_do_not_fail_submission() {
        let store = Arc::new(EnquiryRepository::in_memory().await.unwrap());
        let mailer = Arc::new(RecordingMailer::new());
        mailer.fail_for("leads@harbour.example");
        let intake = IntakeService::new(store.clone(), mailer.clone(), settings());

        let receipt = intake.submit(&raw(), now()).await.unwrap();

        assert!(store.find_by_id(receipt.id).await.unwrap().is_some());
        assert_eq!(mailer.attempts(), 2);
        assert_eq!(mailer.sent_to("jane@example.com"), 1);
    }

    #[tokio::test]
    async fn test_notification_outcome_reports_each_send() {
        let store = EnquiryRepository::in_memory().await.unwrap();
        let mailer = RecordingMailer::new();
        mailer.fail_for("jane@example.com");
        let enquiry = accept_submission(&store, &raw(), now()).await.unwrap();

        let outcome = send_intake_notifications(&mailer, &enquiry, &settings()).await;

        assert!(outcome.alert_sent);
        assert!(!outcome.confirmation_sent);
    }

    #[tokio::test]
    async fn test_invalid_submission_is_not_stored() {
        let store = Arc::new(EnquiryRepository::in_memory().await.unwrap());
        let mailer = Arc::new(RecordingMailer::new());
        let intake = IntakeService::new(store.clone(), mailer.clone(), settings());
        let mut bad = raw();
        bad.email = Some("not-an-email".to_string());

        let err = intake.submit(&bad, now()).await.unwrap_err();

        assert!(matches!(&err, Error::Validation(e) if e == &[ValidationError::InvalidEmail]));
        assert_eq!(store.stats().await.unwrap().total, 0);
        assert_eq!(mailer.attempts(), 0);
    }

    #[tokio::test]
    async fn test_store_failure_fails_submission() {
        let store = Arc::new(EnquiryRepository::in_memory().await.unwrap());
        store.close().await;
        let mailer = Arc::new(RecordingMailer::new());
        let intake = IntakeService::new(store, mailer.clone(), settings());

        let err = intake.submit(&raw(), now()).await.unwrap_err();

        assert!(err.is_store_unavailable());
        assert_eq!(mailer.attempts(), 0);
    }
}
