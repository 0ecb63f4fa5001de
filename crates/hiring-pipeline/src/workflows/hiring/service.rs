use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::domain::{
    normalize_tag, Actor, ApplicantId, ApplicantIntake, ApplicantProfile, ApplicantRecord,
    ApplicationStage, EmploymentStatus, InterviewSchedule, StatusType,
};
use super::ledger::{PendingStatusEntry, StatusHistoryEntry};
use super::repository::{CommittedChange, HiringRepository, RepositoryError};
use super::transition::{
    ApplicantUpdate, Direction, StageTransitionEngine, TagToggle, TransitionError,
    TransitionPlan, TransitionRequest,
};
use crate::config::PipelineConfig;

const INTAKE_COMMENT: &str = "Application received";

static APPLICANT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_applicant_id() -> ApplicantId {
    let id = APPLICANT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ApplicantId(format!("applicant-{id:06}"))
}

/// Service composing the transition engine and the applicant repository.
pub struct HiringPipelineService<R> {
    engine: StageTransitionEngine,
    repository: Arc<R>,
}

impl<R> HiringPipelineService<R>
where
    R: HiringRepository + 'static,
{
    pub fn new(repository: Arc<R>, policy: PipelineConfig) -> Self {
        Self {
            engine: StageTransitionEngine::new(policy),
            repository,
        }
    }

    pub fn engine(&self) -> &StageTransitionEngine {
        &self.engine
    }

    /// Register a new applicant at the entry stage and seed both ledger axes.
    pub fn intake(
        &self,
        intake: ApplicantIntake,
        actor: &Actor,
    ) -> Result<ApplicantRecord, ServiceError> {
        if actor.name.trim().is_empty() {
            return Err(TransitionError::MissingActor.into());
        }
        if intake.full_name.trim().is_empty() {
            return Err(ServiceError::InvalidIntake("full_name must not be empty"));
        }
        if !intake.email.contains('@') {
            return Err(ServiceError::InvalidIntake("email must be an address"));
        }

        let extra_tags: BTreeSet<String> = intake
            .extra_tags
            .iter()
            .filter_map(|tag| normalize_tag(tag))
            .collect();
        let now = Utc::now();
        let record = ApplicantRecord {
            applicant_id: next_applicant_id(),
            profile: ApplicantProfile {
                full_name: intake.full_name.trim().to_string(),
                email: intake.email.trim().to_string(),
                position: intake.position.trim().to_string(),
            },
            employment_status: EmploymentStatus::Applicant,
            application_status: ApplicationStage::Applicant,
            extra_tags,
            schedule: InterviewSchedule::default(),
            revision: 0,
            created_at: now,
            updated_at: now,
        };
        let seed = vec![
            PendingStatusEntry::new(
                StatusType::Employment,
                record.employment_status.label(),
                INTAKE_COMMENT,
                actor,
            ),
            PendingStatusEntry::new(
                StatusType::Application,
                record.application_status.label(),
                INTAKE_COMMENT,
                actor,
            ),
        ];

        let stored = self.repository.insert(record, seed)?;
        info!(applicant_id = %stored.applicant_id, position = %stored.profile.position, "applicant registered");
        Ok(stored)
    }

    pub fn get(&self, applicant_id: &ApplicantId) -> Result<ApplicantRecord, ServiceError> {
        let record = self
            .repository
            .fetch(applicant_id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }

    pub fn list(&self) -> Result<Vec<ApplicantRecord>, ServiceError> {
        Ok(self.repository.list()?)
    }

    /// Step buttons: move one stage forwards or backwards.
    pub fn advance(
        &self,
        applicant_id: &ApplicantId,
        direction: Direction,
        request: TransitionRequest,
        expected_stage: Option<ApplicationStage>,
    ) -> Result<CommittedChange, ServiceError> {
        let record = self.observed(applicant_id, expected_stage)?;
        let plan = self.engine.advance(&record, direction, &request);
        self.apply(&record, plan, "advance")
    }

    /// Stage selector: jump to any stage.
    pub fn set_stage_direct(
        &self,
        applicant_id: &ApplicantId,
        stage: ApplicationStage,
        request: TransitionRequest,
        expected_stage: Option<ApplicationStage>,
    ) -> Result<CommittedChange, ServiceError> {
        let record = self.observed(applicant_id, expected_stage)?;
        let plan = self.engine.set_stage_direct(&record, stage, &request);
        self.apply(&record, plan, "set_stage_direct")
    }

    pub fn set_employment_status(
        &self,
        applicant_id: &ApplicantId,
        status: EmploymentStatus,
        comment: &str,
        actor: &Actor,
    ) -> Result<CommittedChange, ServiceError> {
        let record = self.get(applicant_id)?;
        let plan = self
            .engine
            .set_employment_status(&record, status, comment, actor);
        self.apply(&record, plan, "set_employment_status")
    }

    pub fn reject_or_restore(
        &self,
        applicant_id: &ApplicantId,
        comment: &str,
        actor: &Actor,
    ) -> Result<CommittedChange, ServiceError> {
        let record = self.get(applicant_id)?;
        let plan = self.engine.reject_or_restore(&record, comment, actor);
        self.apply(&record, plan, "reject_or_restore")
    }

    pub fn apply_tag(
        &self,
        applicant_id: &ApplicantId,
        tag: &str,
        toggle: TagToggle,
    ) -> Result<ApplicantRecord, ServiceError> {
        let record = self.get(applicant_id)?;
        let plan = self.engine.apply_tag(&record, tag, toggle);
        Ok(self.apply(&record, plan, "apply_tag")?.record)
    }

    /// Combined edit: tags, employment status and stage in one transaction.
    pub fn update(
        &self,
        applicant_id: &ApplicantId,
        update: ApplicantUpdate,
        expected_stage: Option<ApplicationStage>,
    ) -> Result<CommittedChange, ServiceError> {
        let record = self.observed(applicant_id, expected_stage)?;
        let plan = self.engine.update(&record, &update);
        self.apply(&record, plan, "update")
    }

    pub fn history(
        &self,
        applicant_id: &ApplicantId,
    ) -> Result<Vec<StatusHistoryEntry>, ServiceError> {
        Ok(self.repository.history(applicant_id)?)
    }

    pub fn current_value(
        &self,
        applicant_id: &ApplicantId,
        status_type: StatusType,
    ) -> Result<Option<String>, ServiceError> {
        Ok(self.repository.current_value(applicant_id, status_type)?)
    }

    /// Explicit ledger append. Axis entries go through the matching transition so the
    /// record never drifts from its newest ledger entry.
    pub fn annotate(
        &self,
        applicant_id: &ApplicantId,
        status_type: StatusType,
        status_value: &str,
        comment: &str,
        actor: &Actor,
    ) -> Result<StatusHistoryEntry, ServiceError> {
        let change = match status_type {
            StatusType::Note => {
                if actor.name.trim().is_empty() {
                    return Err(TransitionError::MissingActor.into());
                }
                let value = status_value.trim();
                if value.is_empty() {
                    return Err(ServiceError::UnknownStatusValue {
                        status_type,
                        value: status_value.to_string(),
                    });
                }
                let entry = self.repository.append_note(
                    applicant_id,
                    PendingStatusEntry::new(StatusType::Note, value, comment.trim(), actor),
                )?;
                info!(applicant_id = %applicant_id, value = %entry.status_value, "status note recorded");
                return Ok(entry);
            }
            StatusType::Employment => {
                let status = EmploymentStatus::from_label(status_value).ok_or_else(|| {
                    ServiceError::UnknownStatusValue {
                        status_type,
                        value: status_value.to_string(),
                    }
                })?;
                self.set_employment_status(applicant_id, status, comment, actor)?
            }
            StatusType::Application => {
                let stage = ApplicationStage::from_label(status_value).ok_or_else(|| {
                    ServiceError::UnknownStatusValue {
                        status_type,
                        value: status_value.to_string(),
                    }
                })?;
                let request = TransitionRequest::new(comment, actor.clone());
                self.set_stage_direct(applicant_id, stage, request, None)?
            }
        };

        change
            .entries
            .into_iter()
            .next()
            .ok_or(ServiceError::Repository(RepositoryError::Unavailable(
                "commit produced no ledger entry".to_string(),
            )))
    }

    fn observed(
        &self,
        applicant_id: &ApplicantId,
        expected_stage: Option<ApplicationStage>,
    ) -> Result<ApplicantRecord, ServiceError> {
        let record = self.get(applicant_id)?;
        match expected_stage {
            Some(expected) if expected != record.application_status => {
                warn!(
                    applicant_id = %applicant_id,
                    expected = %expected,
                    found = %record.application_status,
                    "stage changed since the caller last looked"
                );
                Err(ServiceError::StaleStage {
                    expected,
                    found: record.application_status,
                })
            }
            _ => Ok(record),
        }
    }

    fn apply(
        &self,
        original: &ApplicantRecord,
        plan: Result<TransitionPlan, TransitionError>,
        operation: &'static str,
    ) -> Result<CommittedChange, ServiceError> {
        let plan = plan.map_err(|err| {
            warn!(applicant_id = %original.applicant_id, operation, error = %err, "transition rejected");
            err
        })?;

        if plan.is_noop(original) {
            return Ok(CommittedChange {
                record: original.clone(),
                entries: Vec::new(),
            });
        }

        let change = self.repository.commit(plan).map_err(|err| {
            warn!(applicant_id = %original.applicant_id, operation, error = %err, "commit failed");
            err
        })?;

        info!(
            applicant_id = %change.record.applicant_id,
            operation,
            employment_status = %change.record.employment_status,
            application_status = %change.record.application_status,
            ledger_entries = change.entries.len(),
            "applicant updated"
        );
        Ok(change)
    }
}

/// Error raised by the hiring pipeline service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("applicant is at {found}, not {expected}; refresh and retry")]
    StaleStage {
        expected: ApplicationStage,
        found: ApplicationStage,
    },
    #[error("unknown {} status value '{value}'", .status_type.label())]
    UnknownStatusValue {
        status_type: StatusType,
        value: String,
    },
    #[error("invalid intake: {0}")]
    InvalidIntake(&'static str),
}

impl ServiceError {
    /// Concurrent modification the caller can resolve by refreshing.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            ServiceError::StaleStage { .. }
                | ServiceError::Repository(RepositoryError::StaleRevision { .. })
                | ServiceError::Repository(RepositoryError::Conflict)
        )
    }
}
