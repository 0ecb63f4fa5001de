use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::domain::{ApplicantId, ApplicantRecord, StatusType};
use super::ledger::{Clock, PendingStatusEntry, StatusHistoryEntry, StatusLedger, SystemClock};
use super::repository::{CommittedChange, HiringRepository, RepositoryError};
use super::transition::TransitionPlan;

#[derive(Debug, Default)]
struct StoreState {
    records: BTreeMap<ApplicantId, ApplicantRecord>,
    ledger: StatusLedger,
}

/// Process-local repository. One mutex covers records and ledger, so a commit is a
/// single transaction and readers only ever see whole commits.
#[derive(Clone)]
pub struct InMemoryHiringStore {
    state: Arc<Mutex<StoreState>>,
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryHiringStore {
    fn default() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }
}

impl InMemoryHiringStore {
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Arc::new(Mutex::new(StoreState::default())),
            clock,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreState>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store mutex poisoned".to_string()))
    }
}

impl HiringRepository for InMemoryHiringStore {
    fn insert(
        &self,
        mut record: ApplicantRecord,
        seed: Vec<PendingStatusEntry>,
    ) -> Result<ApplicantRecord, RepositoryError> {
        let mut guard = self.lock()?;
        if guard.records.contains_key(&record.applicant_id) {
            return Err(RepositoryError::Conflict);
        }

        let id = record.applicant_id.clone();
        let mut stamp = None;
        for pending in seed {
            let entry = guard.ledger.append(&id, pending, self.clock.as_ref());
            stamp = Some(entry.status_created);
        }
        let stamp = stamp.unwrap_or_else(|| self.clock.now());
        record.created_at = stamp;
        record.updated_at = stamp;

        guard.records.insert(id, record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &ApplicantId) -> Result<Option<ApplicantRecord>, RepositoryError> {
        let guard = self.lock()?;
        Ok(guard.records.get(id).cloned())
    }

    fn list(&self) -> Result<Vec<ApplicantRecord>, RepositoryError> {
        let guard = self.lock()?;
        Ok(guard.records.values().cloned().collect())
    }

    fn commit(&self, plan: TransitionPlan) -> Result<CommittedChange, RepositoryError> {
        let TransitionPlan {
            mut record,
            expected_revision,
            entries,
        } = plan;

        let mut guard = self.lock()?;
        let found = guard
            .records
            .get(&record.applicant_id)
            .map(|stored| stored.revision)
            .ok_or(RepositoryError::NotFound)?;
        if found != expected_revision {
            return Err(RepositoryError::StaleRevision {
                expected: expected_revision,
                found,
            });
        }

        let id = record.applicant_id.clone();
        let committed: Vec<StatusHistoryEntry> = entries
            .into_iter()
            .map(|pending| guard.ledger.append(&id, pending, self.clock.as_ref()))
            .collect();

        record.revision = found + 1;
        record.updated_at = committed
            .last()
            .map(|entry| entry.status_created)
            .unwrap_or_else(|| self.clock.now());
        guard.records.insert(id, record.clone());

        Ok(CommittedChange {
            record,
            entries: committed,
        })
    }

    fn append_note(
        &self,
        id: &ApplicantId,
        entry: PendingStatusEntry,
    ) -> Result<StatusHistoryEntry, RepositoryError> {
        let mut guard = self.lock()?;
        if !guard.records.contains_key(id) {
            return Err(RepositoryError::NotFound);
        }
        Ok(guard.ledger.append(id, entry, self.clock.as_ref()))
    }

    fn history(&self, id: &ApplicantId) -> Result<Vec<StatusHistoryEntry>, RepositoryError> {
        let guard = self.lock()?;
        if !guard.records.contains_key(id) {
            return Err(RepositoryError::NotFound);
        }
        Ok(guard.ledger.history_for(id))
    }

    fn current_value(
        &self,
        id: &ApplicantId,
        status_type: StatusType,
    ) -> Result<Option<String>, RepositoryError> {
        let guard = self.lock()?;
        if !guard.records.contains_key(id) {
            return Err(RepositoryError::NotFound);
        }
        Ok(guard
            .ledger
            .current_value(id, status_type)
            .map(str::to_string))
    }
}
