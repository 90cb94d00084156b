//! Selection of stale enquiries due a follow-up.

use chrono::{DateTime, Duration, Utc};

use crate::Result;
use crate::enquiry::{Enquiry, EnquiryFilter, EnquiryId, EnquiryStatus, EnquiryStore};
use crate::scoring::Priority;

/// Default age after which an unanswered enquiry is stale.
pub const DEFAULT_THRESHOLD_HOURS: i64 = 48;

/// Picks enquiries that are `NEW`, HOT or WARM, never followed up, and older
/// than the staleness threshold.
///
/// COLD enquiries are never selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FollowUpSelector {
    threshold: Duration,
}

impl Default for FollowUpSelector {
    fn default() -> Self {
        Self::new(Duration::hours(DEFAULT_THRESHOLD_HOURS))
    }
}

impl FollowUpSelector {
    /// Creates a selector with the given staleness threshold.
    #[must_use]
    pub const fn new(threshold: Duration) -> Self {
        Self { threshold }
    }

    /// The staleness threshold.
    #[must_use]
    pub const fn threshold(&self) -> Duration {
        self.threshold
    }

    /// Enquiries created before this instant are stale.
    #[must_use]
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.threshold
    }

    /// Store query for eligible enquiries.
    #[must_use]
    pub fn filter(&self, now: DateTime<Utc>) -> EnquiryFilter {
        EnquiryFilter {
            status: Some(EnquiryStatus::New),
            priorities: vec![Priority::Hot, Priority::Warm],
            follow_up_sent: Some(false),
            created_before: Some(self.cutoff(now)),
            ..EnquiryFilter::default()
        }
    }

    /// Whether a single enquiry is due a follow-up at `now`.
    #[must_use]
    pub fn is_eligible(&self, enquiry: &Enquiry, now: DateTime<Utc>) -> bool {
        enquiry.priority.is_follow_up_worthy() && self.filter(now).matches(enquiry)
    }

    /// Every eligible enquiry.
    ///
    /// # Errors
    ///
    /// Returns an error if the store query fails.
    pub async fn select(&self, store: &dyn EnquiryStore, now: DateTime<Utc>) -> Result<Vec<Enquiry>> {
        store.find_many(&self.filter(now)).await
    }

    /// One page of eligible enquiries with ids above `after`, in id order.
    ///
    /// # Errors
    ///
    /// Returns an error if the store query fails.
    pub async fn select_page(
        &self,
        store: &dyn EnquiryStore,
        now: DateTime<Utc>,
        after: Option<EnquiryId>,
        limit: u32,
    ) -> Result<Vec<Enquiry>> {
        let filter = EnquiryFilter {
            after_id: after,
            limit: Some(limit),
            ..self.filter(now)
        };
        store.find_many(&filter).await
    }
}
