//! Outbound mail.
//!
//! This module provides the [`MailSender`] contract the engine sends through,
//! an HTTP implementation, and the content of every email the engine sends.

pub mod mailer;
pub mod templates;

pub use mailer::{HttpMailer, HttpMailerConfig, MailSender, OutgoingEmail, SendError};
pub use templates::NotificationSettings;
