use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::{DbErr, models::task::TaskError};
use thiserror::Error;
use utils::response::ApiResponse;
use utils_jwt::JwtError;

#[derive(Debug, Error, ts_rs::TS)]
#[ts(type = "string")]
pub enum ApiError {
    #[error(transparent)]
    Task(#[from] TaskError),
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error(transparent)]
    Jwt(#[from] JwtError),
    #[error(transparent)]
    Json(#[from] JsonRejection),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Internal server error: {0}")]
    Internal(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status_code, error_type) = match &self {
            ApiError::Task(err) => match err {
                TaskError::TaskNotFound => (StatusCode::NOT_FOUND, "TaskError"),
                TaskError::ValidationError(_) | TaskError::TeamMemberNotFound(_) => {
                    (StatusCode::BAD_REQUEST, "TaskError")
                }
                TaskError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "TaskError"),
            },
            ApiError::Database(db_err) => match db_err {
                DbErr::RecordNotFound(_) => (StatusCode::NOT_FOUND, "DatabaseError"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "DatabaseError"),
            },
            ApiError::Jwt(JwtError::Signing(_)) => (StatusCode::INTERNAL_SERVER_ERROR, "JwtError"),
            ApiError::Jwt(_) => (StatusCode::UNAUTHORIZED, "JwtError"),
            ApiError::Json(_) => (StatusCode::BAD_REQUEST, "JsonError"),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NotFound"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "InternalError"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "ForbiddenError"),
        };

        let error_message = match &self {
            ApiError::Task(TaskError::TaskNotFound) => "Task not found".to_string(),
            ApiError::Task(TaskError::ValidationError(msg)) => msg.clone(),
            ApiError::Task(TaskError::TeamMemberNotFound(id)) => {
                format!("User {id} is not a team member")
            }
            ApiError::Json(rejection) => rejection.body_text(),
            ApiError::Jwt(_) | ApiError::Unauthorized => "Unauthorized".to_string(),
            ApiError::NotFound(msg) => msg.clone(),
            ApiError::Forbidden(msg) => msg.clone(),
            _ if status_code == StatusCode::NOT_FOUND => "Not found".to_string(),
            _ => "Internal server error".to_string(),
        };

        if status_code.is_server_error() {
            tracing::error!(
                status = %status_code,
                error_type,
                error = %self,
                "API request failed"
            );
        }
        let response = ApiResponse::<()>::error(&error_message);
        (status_code, Json(response)).into_response()
    }
}
