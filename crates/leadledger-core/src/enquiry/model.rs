//! Enquiry data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scoring::Priority;

/// Unique identifier for an enquiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnquiryId(pub i64);

impl EnquiryId {
    /// Create a new enquiry ID.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for EnquiryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Review state of an enquiry.
///
/// There are no transition guards: an admin may set any status at any time.
/// The automation only ever reads `New`, and only the reply composer writes
/// `Replied`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EnquiryStatus {
    /// Not yet looked at.
    #[default]
    New,
    /// Opened by an admin.
    Read,
    /// Answered via the reply composer.
    Replied,
    /// Closed out.
    Archived,
}

impl EnquiryStatus {
    /// All statuses, in workflow order.
    pub const ALL: [Self; 4] = [Self::New, Self::Read, Self::Replied, Self::Archived];

    /// Parse from database string representation.
    ///
    /// Unknown values fall back to `New`.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        Self::try_parse(s).unwrap_or_default()
    }

    /// Parse a user-supplied value, rejecting anything unknown.
    #[must_use]
    pub fn try_parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "NEW" => Some(Self::New),
            "READ" => Some(Self::Read),
            "REPLIED" => Some(Self::Replied),
            "ARCHIVED" => Some(Self::Archived),
            _ => None,
        }
    }

    /// Convert to database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::Read => "READ",
            Self::Replied => "REPLIED",
            Self::Archived => "ARCHIVED",
        }
    }
}

impl std::fmt::Display for EnquiryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored enquiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enquiry {
    /// Unique identifier.
    pub id: EnquiryId,
    /// When the enquiry was submitted.
    pub created_at: DateTime<Utc>,
    /// Full name of the submitter.
    pub name: String,
    /// Email address of the submitter (lowercase).
    pub email: String,
    /// Phone number, if given.
    pub phone: Option<String>,
    /// Requested service category.
    pub service: Option<String>,
    /// Budget range as typed by the submitter.
    pub budget: Option<String>,
    /// Message body.
    pub message: String,
    /// Tier assigned at creation.
    pub priority: Priority,
    /// Review state.
    pub status: EnquiryStatus,
    /// Newline-separated audit log.
    pub notes: Option<String>,
    /// When the automated follow-up was confirmed sent.
    pub follow_up_sent_at: Option<DateTime<Utc>>,
}

impl Enquiry {
    /// First word of the submitter's name, used in greetings.
    #[must_use]
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.name)
    }

    /// Whether an automated follow-up has already gone out.
    #[must_use]
    pub const fn follow_up_sent(&self) -> bool {
        self.follow_up_sent_at.is_some()
    }
}

/// A validated enquiry ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEnquiry {
    /// Full name of the submitter.
    pub name: String,
    /// Email address of the submitter.
    pub email: String,
    /// Phone number, if given.
    pub phone: Option<String>,
    /// Requested service category.
    pub service: Option<String>,
    /// Budget range.
    pub budget: Option<String>,
    /// Message body.
    pub message: String,
    /// Tier from the scoring engine.
    pub priority: Priority,
    /// Submission time.
    pub created_at: DateTime<Utc>,
}

/// A partial update to an enquiry. `None` fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnquiryUpdate {
    /// New status.
    pub status: Option<EnquiryStatus>,
    /// Admin priority override.
    pub priority: Option<Priority>,
    /// Replacement notes. An empty string clears them.
    pub notes: Option<String>,
    /// A line appended after any replacement.
    pub append_note: Option<String>,
    /// Follow-up send time. Ignored when one is already recorded.
    pub follow_up_sent_at: Option<DateTime<Utc>>,
}

impl EnquiryUpdate {
    /// Update that records a confirmed follow-up send.
    #[must_use]
    pub fn follow_up_sent(at: DateTime<Utc>) -> Self {
        Self {
            follow_up_sent_at: Some(at),
            ..Self::default()
        }
    }

    /// Whether the update changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.priority.is_none()
            && self.notes.is_none()
            && self.append_note.is_none()
            && self.follow_up_sent_at.is_none()
    }

    /// Apply the update to an enquiry in place.
    ///
    /// `follow_up_sent_at` is only ever set once.
    pub fn apply(&self, enquiry: &mut Enquiry) {
        if let Some(status) = self.status {
            enquiry.status = status;
        }
        if let Some(priority) = self.priority {
            enquiry.priority = priority;
        }
        if let Some(notes) = &self.notes {
            enquiry.notes = (!notes.is_empty()).then(|| notes.clone());
        }
        if let Some(line) = &self.append_note {
            enquiry.notes = Some(append_line(enquiry.notes.as_deref(), line));
        }
        if enquiry.follow_up_sent_at.is_none() {
            enquiry.follow_up_sent_at = self.follow_up_sent_at;
        }
    }
}

/// Append a line to a notes log without touching existing lines.
#[must_use]
pub fn append_line(notes: Option<&str>, line: &str) -> String {
    match notes {
        Some(existing) if !existing.is_empty() => format!("{existing}\n{line}"),
        _ => line.to_string(),
    }
}

/// Query over stored enquiries. Empty/`None` criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnquiryFilter {
    /// Only this status.
    pub status: Option<EnquiryStatus>,
    /// Only these priorities.
    pub priorities: Vec<Priority>,
    /// Whether a follow-up has been sent.
    pub follow_up_sent: Option<bool>,
    /// Only enquiries created strictly before this time.
    pub created_before: Option<DateTime<Utc>>,
    /// Only ids strictly greater than this (keyset paging).
    pub after_id: Option<EnquiryId>,
    /// Result ordering.
    pub order: SortOrder,
    /// Maximum number of rows.
    pub limit: Option<u32>,
}

impl EnquiryFilter {
    /// Whether an enquiry satisfies every criterion except paging.
    #[must_use]
    pub fn matches(&self, enquiry: &Enquiry) -> bool {
        self.status.is_none_or(|s| enquiry.status == s)
            && (self.priorities.is_empty() || self.priorities.contains(&enquiry.priority))
            && self
                .follow_up_sent
                .is_none_or(|sent| enquiry.follow_up_sent() == sent)
            && self.created_before.is_none_or(|t| enquiry.created_at < t)
    }
}

/// Ordering of query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Ascending id; stable for keyset paging.
    #[default]
    Oldest,
    /// Most recent submissions first.
    Newest,
}

/// Counts of enquiries by state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnquiryStats {
    /// All enquiries.
    pub total: u32,
    /// In `NEW`.
    pub new: u32,
    /// In `READ`.
    pub read: u32,
    /// In `REPLIED`.
    pub replied: u32,
    /// In `ARCHIVED`.
    pub archived: u32,
    /// Tier HOT.
    pub hot: u32,
    /// Tier WARM.
    pub warm: u32,
    /// Tier COLD.
    pub cold: u32,
    /// Follow-ups already sent.
    pub followed_up: u32,
}
