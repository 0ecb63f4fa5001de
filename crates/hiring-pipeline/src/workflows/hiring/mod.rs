//! Applicant hiring pipeline: the stage transition engine, the status history ledger,
//! and the service and HTTP router that commit both in one step.
//!
//! Validation lives in [`transition`] and never touches storage. The repository applies
//! a validated [`TransitionPlan`] atomically against the revision the plan was built from.

pub mod domain;
pub mod ledger;
pub mod repository;
pub mod router;
pub mod service;
pub mod store;
pub mod transition;

#[cfg(test)]
mod tests;

pub use domain::{
    Actor, ApplicantId, ApplicantIntake, ApplicantProfile, ApplicantRecord, ApplicationStage,
    EmploymentStatus, InterviewSchedule, ScheduledDateKind, StageSelection, StatusType,
};
pub use ledger::{
    Clock, PendingStatusEntry, StatusHistoryEntry, StatusId, StatusLedger, SystemClock,
};
pub use repository::{CommittedChange, HiringRepository, RepositoryError};
pub use router::hiring_router;
pub use service::{HiringPipelineService, ServiceError};
pub use store::InMemoryHiringStore;
pub use transition::{
    ApplicantUpdate, Direction, StageTransitionEngine, TagToggle, TransitionError,
    TransitionPlan, TransitionRequest,
};
