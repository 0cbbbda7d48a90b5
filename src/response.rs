//! Response envelope shared by every endpoint.
//!
//! Success: `{resultType: "SUCCESS", error: null, success: <payload>}`.
//! Failure: `{resultType: "FAIL", error: {code, message, data}, success: null}`.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError, web};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{error, warn};
use utoipa::ToSchema;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultType {
    Success,
    Fail,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    #[schema(example = "INVALID_STATE_TRANSITION")]
    pub code: String,
    #[schema(example = "cannot check-in a shift that is working")]
    pub message: String,
    #[schema(value_type = Option<Object>)]
    pub data: Option<Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub result_type: ResultType,
    pub error: Option<ErrorBody>,
    pub success: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(payload: T) -> Self {
        Self {
            result_type: ResultType::Success,
            error: None,
            success: Some(payload),
        }
    }
}

impl ApiResponse<()> {
    pub fn fail(code: &str, message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            result_type: ResultType::Fail,
            error: Some(ErrorBody {
                code: code.to_string(),
                message: message.into(),
                data,
            }),
            success: None,
        }
    }
}

pub fn ok<T: Serialize>(payload: T) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::success(payload))
}

pub fn created<T: Serialize>(payload: T) -> HttpResponse {
    HttpResponse::Created().json(ApiResponse::success(payload))
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::InvalidStateTransition { .. } | AppError::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AppError::Internal(cause) => {
                error!(error = ?cause, "request failed");
                "Internal Server Error".to_string()
            }
            other => {
                warn!(code = other.code(), error = %other, "request rejected");
                other.to_string()
            }
        };
        let data = match self {
            AppError::InvalidStateTransition { from, .. } => Some(json!({ "currentStatus": from })),
            _ => None,
        };

        HttpResponse::build(self.status_code()).json(ApiResponse::fail(self.code(), message, data))
    }
}

/// Malformed JSON bodies render as validation failures in the envelope.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| AppError::validation(err.to_string()).into())
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| AppError::validation(err.to_string()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::work_log::{ShiftAction, ShiftStatus};
    use actix_web::body::to_bytes;

    async fn body_of(error: AppError) -> (StatusCode, Value) {
        let response = error.error_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body()).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[actix_web::test]
    async fn test_status_mapping() {
        assert_eq!(AppError::not_found("schedule").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Forbidden("x".into()).status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::validation("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Unauthorized("x".into()).status_code(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_transition_error_envelope_carries_current_status() {
        let (status, body) = body_of(AppError::InvalidStateTransition {
            from: ShiftStatus::Done,
            action: ShiftAction::CheckOut,
        })
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["resultType"], "FAIL");
        assert_eq!(body["error"]["code"], "INVALID_STATE_TRANSITION");
        assert_eq!(body["error"]["data"]["currentStatus"], "done");
        assert!(body["success"].is_null());
    }

    #[actix_web::test]
    async fn test_internal_error_hides_cause() {
        let (status, body) = body_of(anyhow::anyhow!("password=hunter2 in dsn").into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["message"], "Internal Server Error");
        assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
    }

    #[test]
    fn test_success_envelope_shape() {
        let value = serde_json::to_value(ApiResponse::success(json!({"n": 1}))).unwrap();
        assert_eq!(value["resultType"], "SUCCESS");
        assert!(value["error"].is_null());
        assert_eq!(value["success"]["n"], 1);
    }
}
