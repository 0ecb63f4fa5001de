//! Append-only status history kept per applicant.
//!
//! The ledger stamps every entry itself. Stamps are strictly increasing per ledger, so
//! history order never depends on the caller's clock or on commit interleaving.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{Actor, ApplicantId, StatusType};

/// Ledger-assigned sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StatusId(pub u64);

/// One committed status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    pub status_id: StatusId,
    pub applicant_id: ApplicantId,
    pub status_type: StatusType,
    pub status_value: String,
    pub comment: String,
    pub updated_by: String,
    pub updated_by_role: String,
    pub status_created: DateTime<Utc>,
}

/// Entry produced by the transition engine, waiting for the ledger to stamp it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingStatusEntry {
    pub status_type: StatusType,
    pub status_value: String,
    pub comment: String,
    pub actor: Actor,
}

impl PendingStatusEntry {
    pub fn new(
        status_type: StatusType,
        status_value: impl Into<String>,
        comment: impl Into<String>,
        actor: &Actor,
    ) -> Self {
        Self {
            status_type,
            status_value: status_value.into(),
            comment: comment.into(),
            actor: actor.clone(),
        }
    }
}

/// Source of wall-clock time for ledger stamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// In-memory ledger. Callers hold it behind the same lock as the applicant records.
#[derive(Debug, Default)]
pub struct StatusLedger {
    entries: HashMap<ApplicantId, Vec<StatusHistoryEntry>>,
    next_status_id: u64,
    last_stamp: Option<DateTime<Utc>>,
}

impl StatusLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(
        &mut self,
        applicant_id: &ApplicantId,
        pending: PendingStatusEntry,
        clock: &dyn Clock,
    ) -> StatusHistoryEntry {
        let status_created = self.next_stamp(clock.now());
        self.next_status_id += 1;

        let entry = StatusHistoryEntry {
            status_id: StatusId(self.next_status_id),
            applicant_id: applicant_id.clone(),
            status_type: pending.status_type,
            status_value: pending.status_value,
            comment: pending.comment,
            updated_by: pending.actor.name,
            updated_by_role: pending.actor.role,
            status_created,
        };

        self.entries
            .entry(applicant_id.clone())
            .or_default()
            .push(entry.clone());
        entry
    }

    /// Newest first.
    pub fn history_for(&self, applicant_id: &ApplicantId) -> Vec<StatusHistoryEntry> {
        self.entries
            .get(applicant_id)
            .map(|entries| entries.iter().rev().cloned().collect())
            .unwrap_or_default()
    }

    pub fn current_value(&self, applicant_id: &ApplicantId, status_type: StatusType) -> Option<&str> {
        self.entries.get(applicant_id).and_then(|entries| {
            entries
                .iter()
                .rev()
                .find(|entry| entry.status_type == status_type)
                .map(|entry| entry.status_value.as_str())
        })
    }

    pub fn len_for(&self, applicant_id: &ApplicantId) -> usize {
        self.entries.get(applicant_id).map_or(0, Vec::len)
    }

    fn next_stamp(&mut self, now: DateTime<Utc>) -> DateTime<Utc> {
        let stamp = match self.last_stamp {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_stamp = Some(stamp);
        stamp
    }
}
