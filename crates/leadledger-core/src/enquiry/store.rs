//! Record store contract.

use async_trait::async_trait;

use super::model::{Enquiry, EnquiryFilter, EnquiryId, EnquiryStats, EnquiryUpdate, NewEnquiry};
use crate::Result;

/// Persistence for enquiries.
///
/// Implementations must give read-after-write consistency for a single
/// record: a `follow_up_sent_at` written by [`EnquiryStore::update`] is
/// visible to the next [`EnquiryStore::find_many`]. Failures are returned as
/// [`crate::Error::Database`]; a write must never silently do nothing.
#[async_trait]
pub trait EnquiryStore: Send + Sync {
    /// Store a new enquiry and return its id.
    async fn create(&self, enquiry: &NewEnquiry) -> Result<EnquiryId>;

    /// Look up an enquiry. `None` if it does not exist.
    async fn find_by_id(&self, id: EnquiryId) -> Result<Option<Enquiry>>;

    /// All enquiries matching a filter.
    async fn find_many(&self, filter: &EnquiryFilter) -> Result<Vec<Enquiry>>;

    /// Apply a partial update and return the updated record.
    ///
    /// Fails with [`crate::Error::NotFound`] if the enquiry does not exist.
    async fn update(&self, id: EnquiryId, update: &EnquiryUpdate) -> Result<Enquiry>;

    /// Delete an enquiry. Returns whether a record was removed.
    async fn delete(&self, id: EnquiryId) -> Result<bool>;

    /// Counts by status and priority.
    async fn stats(&self) -> Result<EnquiryStats>;

    /// Check the store is reachable.
    async fn ping(&self) -> Result<()>;
}
