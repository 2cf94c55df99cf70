use axum::{
    Router,
    extract::State,
    http::{HeaderMap, header},
    response::Json as ResponseJson,
    routing::post,
};
use db::models::user::User;
use serde::Deserialize;
use ts_rs::TS;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{
    DeploymentImpl,
    error::ApiError,
    http::{auth::cookie_settings, extract::ApiJson},
};

#[derive(Debug, Deserialize, TS)]
pub struct LoginRequest {
    pub id: Uuid,
}

pub async fn login(
    State(deployment): State<DeploymentImpl>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<(HeaderMap, ResponseJson<ApiResponse<User>>), ApiError> {
    let user = User::find_by_id(&deployment.db().pool, payload.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let token = deployment.tokens().issue(user.id, user.role)?;
    let cookie = cookie_settings(&deployment)
        .session_cookie(&token)
        .map_err(|err| ApiError::Internal(format!("Invalid session cookie: {err}")))?;

    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, cookie);

    tracing::info!(user_id = %user.id, role = %user.role, "User logged in");
    Ok((headers, ResponseJson(ApiResponse::success(user))))
}

pub async fn logout(
    State(deployment): State<DeploymentImpl>,
) -> (HeaderMap, ResponseJson<ApiResponse<()>>) {
    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, cookie_settings(&deployment).cleared_cookie());
    (headers, ResponseJson(ApiResponse::success(())))
}

pub fn router() -> Router<DeploymentImpl> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}
