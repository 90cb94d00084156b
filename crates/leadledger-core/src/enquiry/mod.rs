//! Enquiry records and their storage.
//!
//! An [`Enquiry`] is created once by intake and then moves through the review
//! workflow:
//!
//! - **Status** is a plain value (`NEW`, `READ`, `REPLIED`, `ARCHIVED`) that an
//!   admin may set freely. Automation only selects `NEW` enquiries and only the
//!   reply composer writes `REPLIED`.
//! - **Priority** is stamped by the scoring engine at creation and is never
//!   recomputed.
//! - **Notes** is an append-only audit log in practice.
//! - **`follow_up_sent_at`** moves from null to a timestamp exactly once.
//!
//! Storage goes through the [`EnquiryStore`] contract; [`EnquiryRepository`]
//! is the `SQLite` implementation.

mod model;
mod repository;
mod store;

pub use model::{
    Enquiry, EnquiryFilter, EnquiryId, EnquiryStats, EnquiryStatus, EnquiryUpdate, NewEnquiry,
    SortOrder, append_line,
};
pub use repository::EnquiryRepository;
pub use store::EnquiryStore;
