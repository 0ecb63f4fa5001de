use std::collections::BTreeSet;
use std::sync::Arc;

use axum::response::Response;
use chrono::{NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::config::PipelineConfig;
use crate::workflows::hiring::domain::{
    Actor, ApplicantId, ApplicantIntake, ApplicantProfile, ApplicantRecord, ApplicationStage,
    EmploymentStatus, InterviewSchedule, StatusType,
};
use crate::workflows::hiring::ledger::{PendingStatusEntry, StatusHistoryEntry};
use crate::workflows::hiring::repository::{CommittedChange, HiringRepository, RepositoryError};
use crate::workflows::hiring::transition::{TransitionPlan, TransitionRequest};
use crate::workflows::hiring::{hiring_router, HiringPipelineService, InMemoryHiringStore};

pub(super) fn actor() -> Actor {
    Actor::new("Dana Cruz", "HR Officer")
}

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn request(comment: &str) -> TransitionRequest {
    TransitionRequest::new(comment, actor())
}

pub(super) fn exam_request(comment: &str) -> TransitionRequest {
    request(comment).with_schedule(InterviewSchedule {
        examination_date: Some(date(2025, 10, 6)),
        final_interview_date: None,
    })
}

pub(super) fn final_interview_request(comment: &str) -> TransitionRequest {
    request(comment).with_schedule(InterviewSchedule {
        examination_date: None,
        final_interview_date: Some(date(2025, 10, 13)),
    })
}

/// Detached record for exercising the engine without a repository.
pub(super) fn record_at(stage: ApplicationStage, employment: EmploymentStatus) -> ApplicantRecord {
    let stamp = Utc.with_ymd_and_hms(2025, 9, 29, 8, 30, 0).unwrap();
    ApplicantRecord {
        applicant_id: ApplicantId("applicant-fixture".to_string()),
        profile: ApplicantProfile {
            full_name: "Marco Reyes".to_string(),
            email: "marco.reyes@example.com".to_string(),
            position: "Payroll Specialist".to_string(),
        },
        employment_status: employment,
        application_status: stage,
        extra_tags: BTreeSet::new(),
        schedule: InterviewSchedule::default(),
        revision: 3,
        created_at: stamp,
        updated_at: stamp,
    }
}

pub(super) fn intake() -> ApplicantIntake {
    ApplicantIntake {
        full_name: "Marco Reyes".to_string(),
        email: "marco.reyes@example.com".to_string(),
        position: "Payroll Specialist".to_string(),
        extra_tags: vec!["referral".to_string()],
    }
}

pub(super) fn build_service() -> (
    HiringPipelineService<InMemoryHiringStore>,
    Arc<InMemoryHiringStore>,
) {
    let store = Arc::new(InMemoryHiringStore::default());
    let service = HiringPipelineService::new(store.clone(), PipelineConfig::default());
    (service, store)
}

/// Registers an applicant and walks it to `stage` with the direct selector.
pub(super) fn applicant_at(
    service: &HiringPipelineService<InMemoryHiringStore>,
    stage: ApplicationStage,
) -> ApplicantRecord {
    let record = service.intake(intake(), &actor()).expect("intake succeeds");
    if stage == ApplicationStage::Applicant {
        return record;
    }
    let request = request("moved for test setup").with_schedule(InterviewSchedule {
        examination_date: Some(date(2025, 10, 6)),
        final_interview_date: Some(date(2025, 10, 13)),
    });
    service
        .set_stage_direct(&record.applicant_id, stage, request, None)
        .expect("setup transition succeeds")
        .record
}

/// Asserts the record's fields agree with the newest ledger entry of each axis.
pub(super) fn assert_ledger_matches_record(
    service: &HiringPipelineService<InMemoryHiringStore>,
    id: &ApplicantId,
) {
    let record = service.get(id).expect("record exists");
    let history = service.history(id).expect("history exists");
    for status_type in [StatusType::Employment, StatusType::Application] {
        let newest = history
            .iter()
            .find(|entry| entry.status_type == status_type)
            .map(|entry| entry.status_value.as_str());
        assert_eq!(newest, record.current_label(status_type));
        assert_eq!(
            service
                .current_value(id, status_type)
                .expect("current value")
                .as_deref(),
            record.current_label(status_type)
        );
    }
}

pub(super) struct UnavailableRepository;

impl HiringRepository for UnavailableRepository {
    fn insert(
        &self,
        _record: ApplicantRecord,
        _seed: Vec<PendingStatusEntry>,
    ) -> Result<ApplicantRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &ApplicantId) -> Result<Option<ApplicantRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list(&self) -> Result<Vec<ApplicantRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn commit(&self, _plan: TransitionPlan) -> Result<CommittedChange, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn append_note(
        &self,
        _id: &ApplicantId,
        _entry: PendingStatusEntry,
    ) -> Result<StatusHistoryEntry, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn history(&self, _id: &ApplicantId) -> Result<Vec<StatusHistoryEntry>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn current_value(
        &self,
        _id: &ApplicantId,
        _status_type: StatusType,
    ) -> Result<Option<String>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) fn router_with_service(
    service: HiringPipelineService<InMemoryHiringStore>,
) -> axum::Router {
    hiring_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
