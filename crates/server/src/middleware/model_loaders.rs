use std::{fmt::Display, future::Future};

use axum::{
    Extension,
    extract::{Path, Request, State},
    http::{Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use db::models::task::{Task, TaskScope};
use uuid::Uuid;

use crate::{DeploymentImpl, error::ApiError, http::auth::Session};

async fn fetch_model_or_status<M, E, Fut>(
    model_name: &'static str,
    model_id: Uuid,
    load_future: Fut,
) -> Result<M, StatusCode>
where
    E: Display,
    Fut: Future<Output = Result<Option<M>, E>>,
{
    match load_future.await {
        Ok(Some(model)) => Ok(model),
        Ok(None) => {
            tracing::warn!("{model_name} {model_id} not found");
            Err(StatusCode::NOT_FOUND)
        }
        Err(error) => {
            tracing::error!("Failed to fetch {model_name} {model_id}: {error}");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

fn status_response(status: StatusCode, model_name: &'static str) -> Response {
    match status {
        StatusCode::NOT_FOUND => ApiError::NotFound(format!("{model_name} not found")),
        _ => ApiError::Internal(format!("Failed to load {model_name}")),
    }
    .into_response()
}

/// Loads the task named by the path into the request, restricted to what the
/// caller may see. Ids that are not UUIDs are treated like unknown tasks.
/// Deletes by team members are refused before any lookup.
pub async fn load_task_middleware(
    State(deployment): State<DeploymentImpl>,
    Extension(session): Extension<Session>,
    Path(task_id): Path<String>,
    mut request: Request,
    next: Next,
) -> Response {
    if request.method() == Method::DELETE
        && let Err(err) = session.require_lead("delete tasks")
    {
        return err.into_response();
    }

    let Ok(task_id) = Uuid::parse_str(&task_id) else {
        tracing::warn!(task_id = %task_id, "Task id is not a UUID");
        return status_response(StatusCode::NOT_FOUND, "Task");
    };

    let scope = TaskScope::for_user(session.user_id, session.role);
    let task = match fetch_model_or_status(
        "Task",
        task_id,
        Task::find_by_id_in_scope(&deployment.db().pool, task_id, scope),
    )
    .await
    {
        Ok(task) => task,
        Err(status) => return status_response(status, "Task"),
    };

    request.extensions_mut().insert(task);
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use db::DbErr;

    use super::*;

    #[tokio::test]
    async fn fetch_model_or_status_maps_missing_and_errors() {
        let id = Uuid::new_v4();

        let found = fetch_model_or_status("Task", id, async { Ok::<_, DbErr>(Some(7)) }).await;
        assert_eq!(found, Ok(7));

        let missing =
            fetch_model_or_status("Task", id, async { Ok::<Option<i32>, DbErr>(None) }).await;
        assert_eq!(missing, Err(StatusCode::NOT_FOUND));

        let failed = fetch_model_or_status("Task", id, async {
            Err::<Option<i32>, _>(DbErr::Custom("boom".to_string()))
        })
        .await;
        assert_eq!(failed, Err(StatusCode::INTERNAL_SERVER_ERROR));
    }

    #[test]
    fn status_response_renders_envelope_statuses() {
        assert_eq!(
            status_response(StatusCode::NOT_FOUND, "Task").status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_response(StatusCode::INTERNAL_SERVER_ERROR, "Task").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
