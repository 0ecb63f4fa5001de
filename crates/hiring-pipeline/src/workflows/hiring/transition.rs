use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::domain::{
    normalize_tag, Actor, ApplicantRecord, ApplicationStage, EmploymentStatus, InterviewSchedule,
    StageSelection, StatusType,
};
use super::ledger::PendingStatusEntry;
use crate::config::PipelineConfig;

/// Step direction for the console's next/previous buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Next,
    Previous,
}

impl Direction {
    pub const fn label(self) -> &'static str {
        match self {
            Direction::Next => "next",
            Direction::Previous => "previous",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagToggle {
    On,
    Off,
}

impl From<bool> for TagToggle {
    fn from(enabled: bool) -> Self {
        if enabled {
            TagToggle::On
        } else {
            TagToggle::Off
        }
    }
}

/// Caller-supplied side data for a stage move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRequest {
    pub comment: String,
    pub actor: Actor,
    pub schedule: InterviewSchedule,
}

impl TransitionRequest {
    pub fn new(comment: impl Into<String>, actor: Actor) -> Self {
        Self {
            comment: comment.into(),
            actor,
            schedule: InterviewSchedule::default(),
        }
    }

    pub fn with_schedule(mut self, schedule: InterviewSchedule) -> Self {
        self.schedule = schedule;
        self
    }
}

/// Combined edit submitted through the record's update endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicantUpdate {
    pub application_status: Option<StageSelection>,
    pub employment_status: Option<EmploymentStatus>,
    pub extra_tags: Option<Vec<String>>,
    pub request: TransitionRequest,
}

/// Validated mutation ready for the repository. Nothing has been written yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionPlan {
    pub record: ApplicantRecord,
    pub expected_revision: u64,
    pub entries: Vec<PendingStatusEntry>,
}

impl TransitionPlan {
    fn from_original(original: &ApplicantRecord) -> Self {
        Self {
            record: original.clone(),
            expected_revision: original.revision,
            entries: Vec::new(),
        }
    }

    /// True when committing would leave the record and the ledger untouched.
    pub fn is_noop(&self, original: &ApplicantRecord) -> bool {
        self.entries.is_empty() && self.record == *original
    }
}

/// Validation failures. Raised before any write is attempted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("no {} stage available after {from}", .direction.label())]
    NoFurtherStage {
        from: ApplicationStage,
        direction: Direction,
    },
    #[error("a comment is required for this change")]
    MissingComment,
    #[error("updated_by must identify the acting user")]
    MissingActor,
    #[error("{field} is required when moving an applicant into {stage}")]
    MissingScheduledDate {
        stage: ApplicationStage,
        field: &'static str,
    },
    #[error("hired applicants cannot be rejected or restored")]
    HiredApplicantLocked,
    #[error("rejected applicants must be restored before changing stage")]
    ApplicantRejected,
    #[error("{} status is already {value}", .status_type.label())]
    Unchanged {
        status_type: StatusType,
        value: String,
    },
    #[error("tag must not be empty")]
    EmptyTag,
    #[error("application status Reject conflicts with employment status {0}")]
    ConflictingSelection(EmploymentStatus),
}

/// Rule set for legal moves between stages and the ledger entries they produce.
#[derive(Debug, Clone, Default)]
pub struct StageTransitionEngine {
    policy: PipelineConfig,
}

impl StageTransitionEngine {
    pub fn new(policy: PipelineConfig) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &PipelineConfig {
        &self.policy
    }

    /// Step one stage forwards or backwards.
    pub fn advance(
        &self,
        record: &ApplicantRecord,
        direction: Direction,
        request: &TransitionRequest,
    ) -> Result<TransitionPlan, TransitionError> {
        require_actor(&request.actor)?;
        if record.employment_status == EmploymentStatus::Rejected {
            return Err(TransitionError::ApplicantRejected);
        }

        let current = record.application_status;
        let target = match direction {
            Direction::Next => ApplicationStage::at(current.index() + 1),
            Direction::Previous => current.index().checked_sub(1).and_then(ApplicationStage::at),
        }
        .ok_or(TransitionError::NoFurtherStage {
            from: current,
            direction,
        })?;

        if self.policy.require_advance_comment {
            require_comment(&request.comment)?;
        }

        let mut plan = TransitionPlan::from_original(record);
        move_to_stage(&mut plan, target, request)?;
        Ok(plan)
    }

    /// Administrative jump to any stage, no adjacency constraint.
    pub fn set_stage_direct(
        &self,
        record: &ApplicantRecord,
        stage: ApplicationStage,
        request: &TransitionRequest,
    ) -> Result<TransitionPlan, TransitionError> {
        require_actor(&request.actor)?;
        if record.application_status == stage {
            return Err(TransitionError::Unchanged {
                status_type: StatusType::Application,
                value: stage.label().to_string(),
            });
        }
        require_comment(&request.comment)?;

        let mut plan = TransitionPlan::from_original(record);
        move_to_stage(&mut plan, stage, request)?;
        Ok(plan)
    }

    /// Select an employment status from the console's selector.
    pub fn set_employment_status(
        &self,
        record: &ApplicantRecord,
        status: EmploymentStatus,
        comment: &str,
        actor: &Actor,
    ) -> Result<TransitionPlan, TransitionError> {
        require_actor(actor)?;
        if record.employment_status == status {
            return Err(TransitionError::Unchanged {
                status_type: StatusType::Employment,
                value: status.label().to_string(),
            });
        }
        hired_lock(record.application_status, record.employment_status, status)?;
        require_comment(comment)?;

        let mut plan = TransitionPlan::from_original(record);
        set_employment(&mut plan, status, comment, actor);
        Ok(plan)
    }

    /// Reject an applicant, or lift an existing rejection.
    pub fn reject_or_restore(
        &self,
        record: &ApplicantRecord,
        comment: &str,
        actor: &Actor,
    ) -> Result<TransitionPlan, TransitionError> {
        require_actor(actor)?;
        if record.application_status == ApplicationStage::Hired {
            return Err(TransitionError::HiredApplicantLocked);
        }

        let mut plan = TransitionPlan::from_original(record);
        if record.employment_status == EmploymentStatus::Rejected {
            set_employment(
                &mut plan,
                EmploymentStatus::Applicant,
                &self.policy.restore_comment,
                actor,
            );
        } else {
            require_comment(comment)?;
            set_employment(&mut plan, EmploymentStatus::Rejected, comment, actor);
        }
        Ok(plan)
    }

    /// Add or remove a classification tag. Tags never reach the ledger.
    pub fn apply_tag(
        &self,
        record: &ApplicantRecord,
        tag: &str,
        toggle: TagToggle,
    ) -> Result<TransitionPlan, TransitionError> {
        let tag = normalize_tag(tag).ok_or(TransitionError::EmptyTag)?;
        let mut plan = TransitionPlan::from_original(record);
        match toggle {
            TagToggle::On => {
                plan.record.extra_tags.insert(tag);
            }
            TagToggle::Off => {
                plan.record.extra_tags.remove(&tag);
            }
        }
        Ok(plan)
    }

    /// Apply every field present in a combined edit, one ledger entry per axis that changes.
    pub fn update(
        &self,
        record: &ApplicantRecord,
        update: &ApplicantUpdate,
    ) -> Result<TransitionPlan, TransitionError> {
        let request = &update.request;

        let (stage_target, mut employment_target) = match update.application_status {
            Some(StageSelection::Stage(stage)) => (Some(stage), update.employment_status),
            Some(StageSelection::LegacyReject) => match update.employment_status {
                None | Some(EmploymentStatus::Rejected) => (None, Some(EmploymentStatus::Rejected)),
                Some(other) => return Err(TransitionError::ConflictingSelection(other)),
            },
            None => (None, update.employment_status),
        };
        let stage_target = stage_target.filter(|stage| *stage != record.application_status);
        employment_target = employment_target.filter(|status| *status != record.employment_status);

        let mut tags = None;
        if let Some(raw) = &update.extra_tags {
            let normalized: BTreeSet<String> = raw
                .iter()
                .map(|tag| normalize_tag(tag).ok_or(TransitionError::EmptyTag))
                .collect::<Result<_, _>>()?;
            tags = Some(normalized);
        }

        if stage_target.is_some() || employment_target.is_some() {
            require_actor(&request.actor)?;
            require_comment(&request.comment)?;
        }
        if let Some(status) = employment_target {
            let final_stage = stage_target.unwrap_or(record.application_status);
            hired_lock(final_stage, record.employment_status, status)?;
        }

        let mut plan = TransitionPlan::from_original(record);
        if let Some(tags) = tags {
            plan.record.extra_tags = tags;
        }
        if let Some(status) = employment_target {
            set_employment(&mut plan, status, &request.comment, &request.actor);
        }
        if let Some(stage) = stage_target {
            move_to_stage(&mut plan, stage, request)?;
        }
        Ok(plan)
    }
}

fn move_to_stage(
    plan: &mut TransitionPlan,
    stage: ApplicationStage,
    request: &TransitionRequest,
) -> Result<(), TransitionError> {
    if let Some(kind) = stage.required_date() {
        let date = request
            .schedule
            .get(kind)
            .ok_or(TransitionError::MissingScheduledDate {
                stage,
                field: kind.field(),
            })?;
        plan.record.schedule.set(kind, date);
    }

    plan.record.application_status = stage;
    plan.entries.push(PendingStatusEntry::new(
        StatusType::Application,
        stage.label(),
        request.comment.trim(),
        &request.actor,
    ));
    Ok(())
}

fn set_employment(
    plan: &mut TransitionPlan,
    status: EmploymentStatus,
    comment: &str,
    actor: &Actor,
) {
    plan.record.employment_status = status;
    plan.entries.push(PendingStatusEntry::new(
        StatusType::Employment,
        status.label(),
        comment.trim(),
        actor,
    ));
}

/// Rejection and its reversal are frozen once the applicant sits at `Hired`.
fn hired_lock(
    stage: ApplicationStage,
    from: EmploymentStatus,
    to: EmploymentStatus,
) -> Result<(), TransitionError> {
    let touches_rejection =
        to == EmploymentStatus::Rejected || from == EmploymentStatus::Rejected;
    if stage == ApplicationStage::Hired && touches_rejection {
        Err(TransitionError::HiredApplicantLocked)
    } else {
        Ok(())
    }
}

fn require_comment(comment: &str) -> Result<(), TransitionError> {
    if comment.trim().is_empty() {
        Err(TransitionError::MissingComment)
    } else {
        Ok(())
    }
}

fn require_actor(actor: &Actor) -> Result<(), TransitionError> {
    if actor.name.trim().is_empty() {
        Err(TransitionError::MissingActor)
    } else {
        Ok(())
    }
}
