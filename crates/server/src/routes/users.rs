use axum::{Extension, Router, extract::State, response::Json as ResponseJson, routing::get};
use db::models::user::User;
use utils::response::ApiResponse;

use crate::{DeploymentImpl, error::ApiError, http::auth::Session};

pub async fn get_me(
    Extension(session): Extension<Session>,
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<User>>, ApiError> {
    let user = User::find_by_id(&deployment.db().pool, session.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    Ok(ResponseJson(ApiResponse::success(user)))
}

pub async fn get_teams(
    Extension(session): Extension<Session>,
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<Vec<User>>>, ApiError> {
    session.require_lead("list teams")?;
    let teams = User::find_teams(&deployment.db().pool).await?;
    Ok(ResponseJson(ApiResponse::success(teams)))
}

pub fn router() -> Router<DeploymentImpl> {
    Router::new()
        .route("/users/me", get(get_me))
        .route("/teams", get(get_teams))
}
