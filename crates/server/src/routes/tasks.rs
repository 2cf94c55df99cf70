use axum::{
    Extension, Router,
    extract::State,
    http::StatusCode,
    middleware::from_fn_with_state,
    response::{IntoResponse, Json as ResponseJson, Response},
    routing::get,
};
use db::models::task::{
    CreateTask, Task, TaskDetail, TaskError, TaskScope, TaskWithTeam, UpdateTask,
};
use utils::response::ApiResponse;

use crate::{
    DeploymentImpl,
    error::ApiError,
    http::{auth::Session, extract::ApiJson},
    middleware::load_task_middleware,
};

pub async fn get_tasks(
    Extension(session): Extension<Session>,
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<Vec<TaskWithTeam>>>, ApiError> {
    let scope = TaskScope::for_user(session.user_id, session.role);
    let tasks = Task::find_in_scope(&deployment.db().pool, scope).await?;
    Ok(ResponseJson(ApiResponse::success(tasks)))
}

pub async fn get_task(
    Extension(task): Extension<Task>,
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<TaskDetail>>, ApiError> {
    let detail = task.detail(&deployment.db().pool).await?;
    Ok(ResponseJson(ApiResponse::success(detail)))
}

pub async fn create_task(
    Extension(session): Extension<Session>,
    State(deployment): State<DeploymentImpl>,
    ApiJson(payload): ApiJson<CreateTask>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<Task>>), ApiError> {
    session.require_lead("create tasks")?;

    let task = Task::create(&deployment.db().pool, session.user_id, &payload).await?;

    tracing::info!(task_id = %task.id, lead_id = %session.user_id, "Created task");
    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(task))))
}

pub async fn update_task(
    Extension(session): Extension<Session>,
    Extension(existing_task): Extension<Task>,
    State(deployment): State<DeploymentImpl>,
    ApiJson(payload): ApiJson<UpdateTask>,
) -> Result<Response, ApiError> {
    let changes = payload.diff(&existing_task)?;
    if changes.is_empty() {
        tracing::debug!(task_id = %existing_task.id, "Update carries no changes");
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    if !session.is_lead() {
        let restricted = changes.lead_only_fields();
        if !restricted.is_empty() {
            return Err(ApiError::Forbidden(format!(
                "Team members cannot change {}",
                restricted.join(", ")
            )));
        }
    }

    let task = match Task::update(
        &deployment.db().pool,
        existing_task.id,
        session.user_id,
        &changes,
    )
    .await
    {
        Ok(task) => task,
        Err(TaskError::TaskNotFound) => {
            return Err(ApiError::NotFound("Task not found".to_string()));
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!(task_id = %task.id, user_id = %session.user_id, "Updated task");
    Ok(ResponseJson(ApiResponse::success(task)).into_response())
}

pub async fn delete_task(
    Extension(session): Extension<Session>,
    Extension(task): Extension<Task>,
    State(deployment): State<DeploymentImpl>,
) -> Result<StatusCode, ApiError> {
    session.require_lead("delete tasks")?;

    let rows = Task::delete_owned(&deployment.db().pool, task.id, session.user_id).await?;
    if rows == 0 {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    tracing::info!(task_id = %task.id, lead_id = %session.user_id, "Deleted task");
    Ok(StatusCode::NO_CONTENT)
}

pub fn router(deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    let task_id_router = Router::new()
        .route("/", get(get_task).put(update_task).delete(delete_task))
        .layer(from_fn_with_state(deployment.clone(), load_task_middleware));

    let inner = Router::new()
        .route("/", get(get_tasks).post(create_task))
        .nest("/{task_id}", task_id_router);

    Router::new().nest("/tasks", inner)
}
