use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{
    Actor, ApplicantId, ApplicantIntake, ApplicationStage, EmploymentStatus, InterviewSchedule,
    StageSelection, StatusType,
};
use super::repository::{HiringRepository, RepositoryError};
use super::service::{HiringPipelineService, ServiceError};
use super::transition::{ApplicantUpdate, Direction, TagToggle, TransitionRequest};

/// Router builder exposing the applicant and status-history endpoints.
pub fn hiring_router<R>(service: Arc<HiringPipelineService<R>>) -> Router
where
    R: HiringRepository + 'static,
{
    Router::new()
        .route("/api/v1/stages", get(stages_handler))
        .route(
            "/api/v1/applicants",
            post(intake_handler::<R>).get(list_handler::<R>),
        )
        .route(
            "/api/v1/applicants/:applicant_id",
            get(applicant_handler::<R>).put(update_handler::<R>),
        )
        .route(
            "/api/v1/applicants/:applicant_id/advance",
            post(advance_handler::<R>),
        )
        .route(
            "/api/v1/applicants/:applicant_id/rejection",
            post(rejection_handler::<R>),
        )
        .route(
            "/api/v1/applicants/:applicant_id/tags",
            post(tag_handler::<R>),
        )
        .route(
            "/api/v1/status/applicant/:applicant_id",
            get(history_handler::<R>).post(annotate_handler::<R>),
        )
        .route(
            "/api/v1/status/applicant/:applicant_id/current",
            get(current_value_handler::<R>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct IntakeRequest {
    #[serde(flatten)]
    pub(crate) intake: ApplicantIntake,
    #[serde(flatten)]
    pub(crate) actor: Actor,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UpdateRequest {
    #[serde(default)]
    pub(crate) application_status: Option<StageSelection>,
    #[serde(default)]
    pub(crate) employment_status: Option<EmploymentStatus>,
    #[serde(default)]
    pub(crate) comment: String,
    #[serde(flatten)]
    pub(crate) actor: Actor,
    #[serde(default)]
    pub(crate) examination_date: Option<NaiveDate>,
    #[serde(default)]
    pub(crate) final_interview_date: Option<NaiveDate>,
    #[serde(default)]
    pub(crate) extra_tags: Option<Vec<String>>,
    #[serde(default)]
    pub(crate) expected_stage: Option<ApplicationStage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AdvanceRequest {
    pub(crate) direction: Direction,
    #[serde(default)]
    pub(crate) comment: String,
    #[serde(flatten)]
    pub(crate) actor: Actor,
    #[serde(default)]
    pub(crate) examination_date: Option<NaiveDate>,
    #[serde(default)]
    pub(crate) final_interview_date: Option<NaiveDate>,
    #[serde(default)]
    pub(crate) expected_stage: Option<ApplicationStage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RejectionRequest {
    #[serde(default)]
    pub(crate) comment: String,
    #[serde(flatten)]
    pub(crate) actor: Actor,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TagRequest {
    pub(crate) tag: String,
    pub(crate) enabled: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AnnotateRequest {
    pub(crate) status_type: StatusType,
    pub(crate) status_value: String,
    #[serde(default)]
    pub(crate) comment: String,
    #[serde(flatten)]
    pub(crate) actor: Actor,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CurrentValueQuery {
    pub(crate) status_type: StatusType,
}

#[derive(Debug, Serialize)]
pub(crate) struct StageView {
    pub(crate) index: usize,
    pub(crate) label: &'static str,
    pub(crate) requires: Option<&'static str>,
}

pub(crate) async fn stages_handler() -> Json<Vec<StageView>> {
    let stages = ApplicationStage::ordered()
        .into_iter()
        .map(|stage| StageView {
            index: stage.index(),
            label: stage.label(),
            requires: stage.required_date().map(|kind| kind.field()),
        })
        .collect();
    Json(stages)
}

pub(crate) async fn intake_handler<R>(
    State(service): State<Arc<HiringPipelineService<R>>>,
    Json(payload): Json<IntakeRequest>,
) -> Response
where
    R: HiringRepository + 'static,
{
    match service.intake(payload.intake, &payload.actor) {
        Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn list_handler<R>(State(service): State<Arc<HiringPipelineService<R>>>) -> Response
where
    R: HiringRepository + 'static,
{
    match service.list() {
        Ok(records) => (StatusCode::OK, Json(records)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn applicant_handler<R>(
    State(service): State<Arc<HiringPipelineService<R>>>,
    Path(applicant_id): Path<String>,
) -> Response
where
    R: HiringRepository + 'static,
{
    match service.get(&ApplicantId(applicant_id)) {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn update_handler<R>(
    State(service): State<Arc<HiringPipelineService<R>>>,
    Path(applicant_id): Path<String>,
    Json(payload): Json<UpdateRequest>,
) -> Response
where
    R: HiringRepository + 'static,
{
    let update = ApplicantUpdate {
        application_status: payload.application_status,
        employment_status: payload.employment_status,
        extra_tags: payload.extra_tags,
        request: TransitionRequest::new(payload.comment, payload.actor).with_schedule(
            InterviewSchedule {
                examination_date: payload.examination_date,
                final_interview_date: payload.final_interview_date,
            },
        ),
    };

    match service.update(&ApplicantId(applicant_id), update, payload.expected_stage) {
        Ok(change) => (StatusCode::OK, Json(change)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn advance_handler<R>(
    State(service): State<Arc<HiringPipelineService<R>>>,
    Path(applicant_id): Path<String>,
    Json(payload): Json<AdvanceRequest>,
) -> Response
where
    R: HiringRepository + 'static,
{
    let request = TransitionRequest::new(payload.comment, payload.actor).with_schedule(
        InterviewSchedule {
            examination_date: payload.examination_date,
            final_interview_date: payload.final_interview_date,
        },
    );

    match service.advance(
        &ApplicantId(applicant_id),
        payload.direction,
        request,
        payload.expected_stage,
    ) {
        Ok(change) => (StatusCode::OK, Json(change)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn rejection_handler<R>(
    State(service): State<Arc<HiringPipelineService<R>>>,
    Path(applicant_id): Path<String>,
    Json(payload): Json<RejectionRequest>,
) -> Response
where
    R: HiringRepository + 'static,
{
    match service.reject_or_restore(
        &ApplicantId(applicant_id),
        &payload.comment,
        &payload.actor,
    ) {
        Ok(change) => (StatusCode::OK, Json(change)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn tag_handler<R>(
    State(service): State<Arc<HiringPipelineService<R>>>,
    Path(applicant_id): Path<String>,
    Json(payload): Json<TagRequest>,
) -> Response
where
    R: HiringRepository + 'static,
{
    match service.apply_tag(
        &ApplicantId(applicant_id),
        &payload.tag,
        TagToggle::from(payload.enabled),
    ) {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn history_handler<R>(
    State(service): State<Arc<HiringPipelineService<R>>>,
    Path(applicant_id): Path<String>,
) -> Response
where
    R: HiringRepository + 'static,
{
    match service.history(&ApplicantId(applicant_id)) {
        Ok(entries) => (StatusCode::OK, Json(entries)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn annotate_handler<R>(
    State(service): State<Arc<HiringPipelineService<R>>>,
    Path(applicant_id): Path<String>,
    Json(payload): Json<AnnotateRequest>,
) -> Response
where
    R: HiringRepository + 'static,
{
    match service.annotate(
        &ApplicantId(applicant_id),
        payload.status_type,
        &payload.status_value,
        &payload.comment,
        &payload.actor,
    ) {
        Ok(entry) => (StatusCode::CREATED, Json(entry)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn current_value_handler<R>(
    State(service): State<Arc<HiringPipelineService<R>>>,
    Path(applicant_id): Path<String>,
    Query(query): Query<CurrentValueQuery>,
) -> Response
where
    R: HiringRepository + 'static,
{
    let id = ApplicantId(applicant_id);
    match service.current_value(&id, query.status_type) {
        Ok(value) => {
            let payload = json!({
                "applicant_id": id.0,
                "status_type": query.status_type,
                "status_value": value,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

/// HTTP status for a pipeline failure.
pub fn status_for(err: &ServiceError) -> StatusCode {
    match err {
        ServiceError::Transition(_)
        | ServiceError::UnknownStatusValue { .. }
        | ServiceError::InvalidIntake(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ServiceError::StaleStage { .. }
        | ServiceError::Repository(RepositoryError::StaleRevision { .. })
        | ServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        ServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        ServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

fn error_response(err: ServiceError) -> Response {
    let status = status_for(&err);
    let payload = json!({
        "error": err.to_string(),
        "conflict": err.is_conflict(),
    });
    (status, Json(payload)).into_response()
}
