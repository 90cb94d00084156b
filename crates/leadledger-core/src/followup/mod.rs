//! Automated follow-up of stale high-value enquiries.
//!
//! The [`FollowUpSelector`] decides which enquiries are due and the
//! [`FollowUpDispatcher`] sends to them one at a time, recording each
//! confirmed send so no enquiry is contacted twice.

mod dispatcher;
mod selector;

pub use dispatcher::{
    DEFAULT_PACING, DEFAULT_PAGE_SIZE, FollowUpDispatcher, FollowUpReport, FollowUpSettings,
};
pub use selector::{DEFAULT_THRESHOLD_HOURS, FollowUpSelector};
