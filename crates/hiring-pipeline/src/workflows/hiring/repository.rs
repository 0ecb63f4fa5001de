use serde::Serialize;

use super::domain::{ApplicantId, ApplicantRecord, StatusType};
use super::ledger::{PendingStatusEntry, StatusHistoryEntry};
use super::transition::TransitionPlan;

/// Storage abstraction. Implementations must apply the record write and the ledger
/// append of one commit atomically.
pub trait HiringRepository: Send + Sync {
    /// Store a new record together with its seed ledger entries.
    fn insert(
        &self,
        record: ApplicantRecord,
        seed: Vec<PendingStatusEntry>,
    ) -> Result<ApplicantRecord, RepositoryError>;

    fn fetch(&self, id: &ApplicantId) -> Result<Option<ApplicantRecord>, RepositoryError>;

    fn list(&self) -> Result<Vec<ApplicantRecord>, RepositoryError>;

    /// Write `plan.record` and append `plan.entries` if the stored revision still equals
    /// `plan.expected_revision`.
    fn commit(&self, plan: TransitionPlan) -> Result<CommittedChange, RepositoryError>;

    /// Append an entry without touching the record.
    fn append_note(
        &self,
        id: &ApplicantId,
        entry: PendingStatusEntry,
    ) -> Result<StatusHistoryEntry, RepositoryError>;

    /// Newest first.
    fn history(&self, id: &ApplicantId) -> Result<Vec<StatusHistoryEntry>, RepositoryError>;

    fn current_value(
        &self,
        id: &ApplicantId,
        status_type: StatusType,
    ) -> Result<Option<String>, RepositoryError>;
}

/// Result of a successful commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommittedChange {
    pub record: ApplicantRecord,
    pub entries: Vec<StatusHistoryEntry>,
}

/// Error enumeration for repository failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("record changed concurrently (expected revision {expected}, found {found})")]
    StaleRevision { expected: u64, found: u64 },
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
