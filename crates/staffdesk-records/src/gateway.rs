//! Remote gateway traits
//!
//! These are the seams between the record lifecycle and whatever persists
//! records: the HTTP client in `staffdesk-client` in production, or
//! [`MockGateway`](crate::mock::MockGateway) in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use staffdesk_core::{Record, RecordId, Result};

/// Fetch, create, update and delete for one entity kind
#[async_trait]
pub trait RecordEndpoint<R: Record>: Send + Sync {
    /// Fetch every record visible to the current portal
    async fn fetch_all(&self) -> Result<Vec<R>>;

    /// Create a record; the server assigns the id
    async fn create(&self, draft: &R::Draft) -> Result<R>;

    /// Apply field edits
    async fn update(&self, id: &RecordId, patch: &R::Patch) -> Result<R>;

    /// Delete a record
    async fn delete(&self, id: &RecordId) -> Result<()>;
}

/// Persist a status change for a single record
#[async_trait]
pub trait StatusEndpoint<R: Record>: Send + Sync {
    /// Set the status; returns the server's copy including computed fields
    async fn update_status(&self, id: &RecordId, status: R::Status) -> Result<R>;
}

/// Persist one status change over a set of records as a single request
///
/// The server applies the whole batch or none of it.
#[async_trait]
pub trait BulkStatusEndpoint<R: Record>: StatusEndpoint<R> {
    /// Set the status on every id
    async fn update_status_bulk(&self, ids: &[RecordId], status: R::Status)
    -> Result<BulkOutcome<R>>;
}

/// Server response to a bulk status change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkOutcome<R> {
    /// Records the server matched
    #[serde(default)]
    pub matched_count: Option<u64>,

    /// Records the server changed
    #[serde(default)]
    pub modified_count: Option<u64>,

    /// Updated records, when the server returns them
    #[serde(default = "Vec::new")]
    pub records: Vec<R>,
}

impl<R> BulkOutcome<R> {
    /// Outcome carrying only counts
    pub const fn counts(matched: u64, modified: u64) -> Self {
        Self {
            matched_count: Some(matched),
            modified_count: Some(modified),
            records: Vec::new(),
        }
    }
}

impl<R> Default for BulkOutcome<R> {
    fn default() -> Self {
        Self {
            matched_count: None,
            modified_count: None,
            records: Vec::new(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use staffdesk_core::WorkLog;

    #[test]
    fn test_bulk_outcome_tolerates_counts_only() {
        let outcome: BulkOutcome<WorkLog> =
            serde_json::from_str(r#"{"matchedCount": 3, "modifiedCount": 2}"#).unwrap();

        assert_eq!(outcome.matched_count, Some(3));
        assert_eq!(outcome.modified_count, Some(2));
        assert!(outcome.records.is_empty());
    }

    #[test]
    fn test_bulk_outcome_tolerates_empty_object() {
        let outcome: BulkOutcome<WorkLog> = serde_json::from_str("{}").unwrap();
        assert_eq!(outcome, BulkOutcome::default());
    }
}
