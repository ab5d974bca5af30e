use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::service::ServiceError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// A read of an ID that does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Content type must be application/merge-patch+json")]
    UnsupportedMediaType,

    /// The request could not be decoded.
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        // Missing required fields are client errors like any malformed body
        let status = match rejection.status() {
            StatusCode::UNPROCESSABLE_ENTITY => StatusCode::BAD_REQUEST,
            status => status,
        };
        ApiError::Rejected {
            status,
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Rejected {
            status: StatusCode::BAD_REQUEST,
            message: rejection.body_text(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    status: u16,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    entity_name: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_key: Option<&'static str>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, entity_name, error_key) = match &self {
            ApiError::Service(ServiceError::Validation(e)) => {
                (StatusCode::BAD_REQUEST, Some(e.entity), Some(e.code))
            }
            ApiError::Service(ServiceError::NotFound { entity, .. }) => {
                (StatusCode::NOT_FOUND, Some(*entity), Some("notfound"))
            }
            ApiError::Service(e) => {
                tracing::error!("Request failed: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, None, None)
            }
            ApiError::NotFound(entity) => (StatusCode::NOT_FOUND, Some(*entity), Some("notfound")),
            ApiError::UnsupportedMediaType => (StatusCode::UNSUPPORTED_MEDIA_TYPE, None, None),
            ApiError::Rejected { status, .. } => (*status, None, None),
        };

        let body = ErrorBody {
            status: status.as_u16(),
            message: self.to_string(),
            entity_name,
            error_key,
        };
        (status, Json(body)).into_response()
    }
}
