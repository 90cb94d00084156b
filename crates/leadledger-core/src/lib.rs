//! # leadledger-core
//!
//! Lead lifecycle engine for a service business's enquiry inbox.
//!
//! This crate provides:
//! - Lead scoring (HOT / WARM / COLD)
//! - Enquiry intake validation and notifications
//! - Enquiry storage (`SQLite`)
//! - Automated follow-up of stale high-value enquiries
//! - Admin replies with an audit trail in the enquiry notes
//! - Outbound mail over an HTTP email API

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod enquiry;
mod error;
pub mod followup;
pub mod intake;
pub mod reply;
pub mod scoring;
pub mod service;
pub mod trigger;

pub use enquiry::{
    Enquiry, EnquiryFilter, EnquiryId, EnquiryRepository, EnquiryStats, EnquiryStatus,
    EnquiryStore, EnquiryUpdate, NewEnquiry, SortOrder,
};
pub use error::{Error, Result};
pub use followup::{FollowUpDispatcher, FollowUpReport, FollowUpSelector, FollowUpSettings};
pub use intake::{
    IntakeService, RawSubmission, SubmissionReceipt, ValidationError, ValidationResult,
    validate_submission,
};
pub use reply::{ReplyComposer, ReplyDraft};
pub use scoring::{Priority, score_lead};
pub use service::{
    HttpMailer, HttpMailerConfig, MailSender, NotificationSettings, OutgoingEmail, SendError,
};
pub use trigger::authorize_bearer;
