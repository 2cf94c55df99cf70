use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, Response, StatusCode, header},
};
use config::Config;
use db::{
    DBService,
    models::user::{CreateUser, User},
    types::UserRole,
};
use serde_json::Value;
use test_support::TempDatabase;
use tower::ServiceExt;
use uuid::Uuid;

use crate::DeploymentImpl;

pub const TEST_SECRET: &str = "test-secret";

/// A deployment on a throwaway SQLite file plus a lead and two team members.
pub struct TestApp {
    _database: TempDatabase,
    pub deployment: DeploymentImpl,
    pub lead: User,
    pub team: User,
    pub other_team: User,
}

impl TestApp {
    pub async fn new() -> Self {
        let database = TempDatabase::new();
        let url = database.url().to_string();
        let config = Config::from_sources(None, |key| match key {
            "DATABASE_URL" => Some(url.clone()),
            "JWT_SECRET" => Some(TEST_SECRET.to_string()),
            "COOKIE_SECURE" => Some("false".to_string()),
            _ => None,
        })
        .unwrap();
        let db = DBService::new(&config.database_url).await.unwrap();
        let deployment = DeploymentImpl::from_parts(config, db);

        let lead = Self::insert_user(&deployment, "John", UserRole::Lead).await;
        let team = Self::insert_user(&deployment, "Anne", UserRole::Team).await;
        let other_team = Self::insert_user(&deployment, "Bob", UserRole::Team).await;

        Self {
            _database: database,
            deployment,
            lead,
            team,
            other_team,
        }
    }

    pub async fn insert_user(deployment: &DeploymentImpl, name: &str, role: UserRole) -> User {
        User::create(
            &deployment.db().pool,
            &CreateUser {
                id: Uuid::new_v4(),
                name: name.to_string(),
                role,
            },
        )
        .await
        .unwrap()
    }

    pub fn router(&self) -> Router {
        crate::http::router(self.deployment.clone())
    }

    pub fn token_for(&self, user: &User) -> String {
        self.deployment.tokens().issue(user.id, user.role).unwrap()
    }

    /// Sends a request carrying `user`'s session cookie (if any).
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        user: Option<&User>,
        body: Option<Value>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header(
                header::COOKIE,
                format!("access_token={}", self.token_for(user)),
            );
        }
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        self.router()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap()
    }
}

pub async fn json_body(response: Response<Body>) -> Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

pub fn set_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

pub fn assert_status(response: &Response<Body>, expected: StatusCode) {
    assert_eq!(response.status(), expected, "unexpected status");
}
