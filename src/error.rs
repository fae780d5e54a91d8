use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value as JsonValue};
use thiserror::Error;
use uuid::Uuid;

use crate::store::StoreError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorObject,
}

#[derive(Debug, Serialize)]
pub struct ErrorObject {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<JsonValue>,
}

#[derive(Debug)]
pub enum ApiError {
    Unauthorized(&'static str, String),
    Forbidden(&'static str, String),
    BadRequest(&'static str, String),
    NotFound(&'static str, String),
    Conflict(&'static str, String, Option<JsonValue>),
    Internal(String),
}

impl ApiError {
    pub fn invalid_credentials() -> Self {
        ApiError::Unauthorized("INVALID_CREDENTIALS", "Username or password is incorrect".into())
    }

    pub fn session_expired() -> Self {
        ApiError::Unauthorized("SESSION_EXPIRED", "Session expired".into())
    }

    pub fn db(e: sqlx::Error) -> Self {
        ApiError::Internal(format!("db error: {e}"))
    }

    fn to_error_response(code: &str, message: &str, details: Option<JsonValue>) -> Json<ErrorResponse> {
        Json(ErrorResponse {
            error: ErrorObject {
                code: code.to_string(),
                message: message.to_string(),
                details,
            },
        })
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthorized(code, msg) => {
                (StatusCode::UNAUTHORIZED, ApiError::to_error_response(code, &msg, None)).into_response()
            }
            ApiError::Forbidden(code, msg) => {
                (StatusCode::FORBIDDEN, ApiError::to_error_response(code, &msg, None)).into_response()
            }
            ApiError::BadRequest(code, msg) => {
                (StatusCode::BAD_REQUEST, ApiError::to_error_response(code, &msg, None)).into_response()
            }
            ApiError::NotFound(code, msg) => {
                (StatusCode::NOT_FOUND, ApiError::to_error_response(code, &msg, None)).into_response()
            }
            ApiError::Conflict(code, msg, details) => {
                (StatusCode::CONFLICT, ApiError::to_error_response(code, &msg, details)).into_response()
            }
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::to_error_response("INTERNAL", &msg, None),
            )
                .into_response(),
        }
    }
}

/* -------------------------
   Service-level errors
--------------------------*/

/// Business rules whose violation rejects a write.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BusinessRule {
    #[error("patient already has a pending appointment; only one pending appointment is allowed at a time")]
    PendingAppointmentExists {
        patient_id: Uuid,
        existing_appointment_id: Uuid,
    },

    #[error("patient cannot be deleted because it has {count} appointment(s)")]
    PatientHasAppointments { patient_id: Uuid, count: i64 },
}

impl BusinessRule {
    fn details(&self) -> JsonValue {
        match self {
            BusinessRule::PendingAppointmentExists {
                patient_id,
                existing_appointment_id,
            } => json!({
                "patient_id": patient_id,
                "existing_appointment_id": existing_appointment_id,
            }),
            BusinessRule::PatientHasAppointments { patient_id, count } => json!({
                "patient_id": patient_id,
                "total_appointments": count,
            }),
        }
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    /// The entity addressed by the operation does not exist.
    #[error("{0}")]
    NotFound(String),

    /// A foreign reference supplied in a write does not resolve.
    #[error("{0}")]
    InvalidReference(String),

    #[error(transparent)]
    BusinessRuleViolation(#[from] BusinessRule),

    #[error("{0}")]
    Validation(String),

    #[error("store failure: {0}")]
    StoreFailure(#[from] StoreError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::NotFound(msg) => ApiError::NotFound("NOT_FOUND", msg),
            ServiceError::InvalidReference(msg) => ApiError::BadRequest("INVALID_REFERENCE", msg),
            ServiceError::BusinessRuleViolation(rule) => ApiError::Conflict(
                "BUSINESS_RULE_VIOLATION",
                rule.to_string(),
                Some(rule.details()),
            ),
            ServiceError::Validation(msg) => ApiError::BadRequest("VALIDATION_ERROR", msg),
            ServiceError::StoreFailure(err) => {
                tracing::error!(error = %err, "store failure");
                ApiError::Internal(err.to_string())
            }
        }
    }
}
