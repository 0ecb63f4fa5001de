use super::common::*;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, Method, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::config::PipelineConfig;
use crate::workflows::hiring::domain::ApplicationStage;
use crate::workflows::hiring::router::{history_handler, status_for};
use crate::workflows::hiring::{
    HiringPipelineService, RepositoryError, ServiceError, TransitionError,
};

fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).expect("serialize body")))
        .expect("request builds")
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request builds")
}

#[tokio::test]
async fn intake_route_creates_applicants() {
    let (service, _) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(json_request(
            Method::POST,
            "/api/v1/applicants",
            json!({
                "full_name": "Ana Lim",
                "email": "ana.lim@example.com",
                "position": "Recruiter",
                "updated_by": "Dana Cruz",
                "updated_by_role": "HR Officer",
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["application_status"], json!("Applicant"));
    assert_eq!(payload["employment_status"], json!("Applicant"));
    assert!(payload["applicant_id"]
        .as_str()
        .unwrap_or_default()
        .starts_with("applicant-"));
}

#[tokio::test]
async fn advance_route_returns_committed_entry() {
    let (service, _) = build_service();
    let record = applicant_at(&service, ApplicationStage::InitialInterview);
    let router = router_with_service(service);

    let response = router
        .oneshot(json_request(
            Method::POST,
            &format!("/api/v1/applicants/{}/advance", record.applicant_id),
            json!({
                "direction": "next",
                "comment": "passed screen",
                "updated_by": "Dana Cruz",
                "updated_by_role": "HR Officer",
                "examination_date": "2025-10-06",
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["record"]["application_status"], json!("Examination"));
    assert_eq!(payload["record"]["examination_date"], json!("2025-10-06"));
    assert_eq!(payload["entries"][0]["status_type"], json!("application"));
    assert_eq!(payload["entries"][0]["status_value"], json!("Examination"));
    assert_eq!(payload["entries"][0]["comment"], json!("passed screen"));
}

#[tokio::test]
async fn advance_route_rejects_missing_date_with_422() {
    let (service, _) = build_service();
    let record = applicant_at(&service, ApplicationStage::Examination);
    let router = router_with_service(service);

    let response = router
        .oneshot(json_request(
            Method::POST,
            &format!("/api/v1/applicants/{}/advance", record.applicant_id),
            json!({
                "direction": "next",
                "updated_by": "Dana Cruz",
                "updated_by_role": "HR Officer",
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert!(payload["error"]
        .as_str()
        .unwrap_or_default()
        .contains("final_interview_date"));
    assert_eq!(payload["conflict"], json!(false));
}

#[tokio::test]
async fn update_route_reports_stale_stage_as_conflict() {
    let (service, _) = build_service();
    let record = applicant_at(&service, ApplicationStage::JobOffer);
    let router = router_with_service(service);

    let response = router
        .oneshot(json_request(
            Method::PUT,
            &format!("/api/v1/applicants/{}", record.applicant_id),
            json!({
                "application_status": "Contract Signing",
                "comment": "offer accepted",
                "updated_by": "Dana Cruz",
                "updated_by_role": "HR Officer",
                "expected_stage": "Final Interview",
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let payload = read_json_body(response).await;
    assert_eq!(payload["conflict"], json!(true));
}

#[tokio::test]
async fn update_route_accepts_legacy_reject_label() {
    let (service, _) = build_service();
    let record = applicant_at(&service, ApplicationStage::Examination);
    let router = router_with_service(service);

    let response = router
        .oneshot(json_request(
            Method::PUT,
            &format!("/api/v1/applicants/{}", record.applicant_id),
            json!({
                "application_status": "Reject",
                "comment": "failed exam",
                "updated_by": "Dana Cruz",
                "updated_by_role": "HR Officer",
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["record"]["employment_status"], json!("Rejected"));
    assert_eq!(payload["record"]["application_status"], json!("Examination"));
    assert_eq!(payload["entries"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn rejection_route_toggles_and_history_lists_newest_first() {
    let (service, _) = build_service();
    let record = applicant_at(&service, ApplicationStage::FinalInterview);
    let router = router_with_service(service);
    let rejection_uri = format!("/api/v1/applicants/{}/rejection", record.applicant_id);
    let body = json!({
        "comment": "withdrew",
        "updated_by": "Dana Cruz",
        "updated_by_role": "HR Officer",
    });

    for expected in ["Rejected", "Applicant"] {
        let response = router
            .clone()
            .oneshot(json_request(Method::POST, &rejection_uri, body.clone()))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
        let payload = read_json_body(response).await;
        assert_eq!(payload["record"]["employment_status"], json!(expected));
    }

    let response = router
        .oneshot(get_request(&format!(
            "/api/v1/status/applicant/{}",
            record.applicant_id
        )))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    let entries = payload.as_array().expect("history array");
    assert_eq!(entries[0]["status_value"], json!("Applicant"));
    assert_eq!(entries[0]["comment"], json!("Restored from rejection"));
    assert_eq!(entries[1]["status_value"], json!("Rejected"));
    assert_eq!(entries[1]["updated_by_role"], json!("HR Officer"));
}

#[tokio::test]
async fn tag_route_toggles_membership() {
    let (service, _) = build_service();
    let record = applicant_at(&service, ApplicationStage::Applicant);
    let router = router_with_service(service);
    let uri = format!("/api/v1/applicants/{}/tags", record.applicant_id);

    let response = router
        .clone()
        .oneshot(json_request(
            Method::POST,
            &uri,
            json!({ "tag": "follow up", "enabled": true }),
        ))
        .await
        .expect("route executes");
    let payload = read_json_body(response).await;
    assert!(payload["extra_tags"]
        .as_array()
        .expect("tags")
        .contains(&json!("FOLLOW UP")));

    let response = router
        .oneshot(json_request(
            Method::POST,
            &uri,
            json!({ "tag": "follow up", "enabled": false }),
        ))
        .await
        .expect("route executes");
    let payload = read_json_body(response).await;
    assert!(!payload["extra_tags"]
        .as_array()
        .expect("tags")
        .contains(&json!("FOLLOW UP")));
}

#[tokio::test]
async fn annotate_and_current_value_routes_share_the_ledger() {
    let (service, _) = build_service();
    let record = applicant_at(&service, ApplicationStage::InitialInterview);
    let router = router_with_service(service);

    let response = router
        .clone()
        .oneshot(json_request(
            Method::POST,
            &format!("/api/v1/status/applicant/{}", record.applicant_id),
            json!({
                "status_type": "employment",
                "status_value": "On Hold",
                "comment": "awaiting clearance",
                "updated_by": "Dana Cruz",
                "updated_by_role": "HR Officer",
            }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = router
        .oneshot(get_request(&format!(
            "/api/v1/status/applicant/{}/current?status_type=employment",
            record.applicant_id
        )))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["status_value"], json!("On Hold"));
}

#[tokio::test]
async fn stages_route_lists_the_canonical_sequence() {
    let (service, _) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(get_request("/api/v1/stages"))
        .await
        .expect("route executes");
    let payload = read_json_body(response).await;
    let labels: Vec<_> = payload
        .as_array()
        .expect("stage array")
        .iter()
        .filter_map(|stage| stage["label"].as_str())
        .collect();
    assert_eq!(
        labels,
        vec![
            "Applicant",
            "Initial Interview",
            "Examination",
            "Final Interview",
            "Job Offer",
            "Contract Signing",
            "Hired"
        ]
    );
    assert_eq!(payload[2]["requires"], json!("examination_date"));
}

#[tokio::test]
async fn unknown_applicants_return_404() {
    let (service, _) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(get_request("/api/v1/applicants/applicant-missing"))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn history_handler_reports_outages_as_503() {
    let service = Arc::new(HiringPipelineService::new(
        Arc::new(UnavailableRepository),
        PipelineConfig::default(),
    ));

    let response =
        history_handler::<UnavailableRepository>(State(service), Path("applicant-1".to_string()))
            .await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[test]
fn status_mapping_separates_conflicts_from_validation() {
    assert_eq!(
        status_for(&ServiceError::Transition(TransitionError::MissingComment)),
        StatusCode::UNPROCESSABLE_ENTITY
    );
    assert_eq!(
        status_for(&ServiceError::Repository(RepositoryError::StaleRevision {
            expected: 1,
            found: 2
        })),
        StatusCode::CONFLICT
    );
    assert_eq!(
        status_for(&ServiceError::Repository(RepositoryError::NotFound)),
        StatusCode::NOT_FOUND
    );
}
