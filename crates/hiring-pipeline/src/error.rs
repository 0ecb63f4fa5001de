use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::hiring::router::status_for;
use crate::workflows::hiring::ServiceError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Pipeline(ServiceError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Pipeline(err) => write!(f, "pipeline error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Pipeline(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Pipeline(err) => status_for(err),
            AppError::Config(_) | AppError::Telemetry(_) | AppError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<ServiceError> for AppError {
    fn from(value: ServiceError) -> Self {
        Self::Pipeline(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::hiring::{ApplicationStage, RepositoryError, TransitionError};

    #[test]
    fn pipeline_errors_share_the_router_status_mapping() {
        let err = AppError::from(ServiceError::StaleStage {
            expected: ApplicationStage::Examination,
            found: ApplicationStage::FinalInterview,
        });
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);

        let err = AppError::from(ServiceError::Repository(RepositoryError::NotFound));
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);

        let err = AppError::from(ServiceError::Transition(TransitionError::MissingComment));
        assert_eq!(err.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);

        let err = AppError::from(ServiceError::Repository(RepositoryError::Unavailable(
            "store offline".to_string(),
        )));
        assert_eq!(err.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn io_errors_are_internal() {
        let err = AppError::from(std::io::Error::new(std::io::ErrorKind::AddrInUse, "busy"));
        assert!(err.to_string().starts_with("io error"));
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
