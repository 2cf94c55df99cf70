use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use db::types::UserRole;
use utils_jwt::JwtError;
use uuid::Uuid;

use super::session::{CookieSettings, session_token};
use crate::{DeploymentImpl, error::ApiError};

/// Verified caller identity, attached to every authenticated request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub user_id: Uuid,
    pub role: UserRole,
}

impl Session {
    pub fn is_lead(&self) -> bool {
        self.role == UserRole::Lead
    }

    pub fn require_lead(&self, action: &str) -> Result<(), ApiError> {
        if self.is_lead() {
            Ok(())
        } else {
            Err(ApiError::Forbidden(format!("Only leads can {action}")))
        }
    }
}

pub fn cookie_settings(deployment: &DeploymentImpl) -> CookieSettings {
    CookieSettings {
        max_age_secs: deployment.config().session_ttl_secs,
        secure: deployment.config().cookie_secure,
    }
}

fn parse_authorization_bearer(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    let (prefix, rest) = trimmed.split_once(' ')?;
    if !prefix.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = rest.trim();
    if token.is_empty() {
        return None;
    }
    Some(token)
}

fn extract_request_token(req: &Request) -> Option<&str> {
    // 1) session cookie
    if let Some(token) = session_token(req.headers()) {
        return Some(token);
    }

    // 2) Authorization: Bearer <token>
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_authorization_bearer)
}

fn unauthorized(deployment: &DeploymentImpl) -> Response {
    let mut response = ApiError::Unauthorized.into_response();
    response.headers_mut().insert(
        header::SET_COOKIE,
        cookie_settings(deployment).cleared_cookie(),
    );
    response
}

pub async fn require_session(
    State(deployment): State<DeploymentImpl>,
    mut req: Request,
    next: Next,
) -> Response {
    let verified = match extract_request_token(&req) {
        Some(token) => deployment.tokens().verify::<UserRole>(token),
        None => Err(JwtError::Missing),
    };

    let claims = match verified {
        Ok(claims) => claims,
        Err(err) => {
            tracing::warn!(
                path = %req.uri().path(),
                method = %req.method(),
                reason = err.reason(),
                "Unauthorized API request"
            );
            return unauthorized(&deployment);
        }
    };

    req.extensions_mut().insert(Session {
        user_id: claims.sub,
        role: claims.role,
    });
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_prefix_is_case_insensitive() {
        assert_eq!(parse_authorization_bearer("Bearer abc"), Some("abc"));
        assert_eq!(parse_authorization_bearer("bearer  abc "), Some("abc"));
        assert_eq!(parse_authorization_bearer("Basic abc"), None);
        assert_eq!(parse_authorization_bearer("Bearer "), None);
    }

    #[test]
    fn only_leads_pass_the_lead_check() {
        let lead = Session {
            user_id: Uuid::new_v4(),
            role: UserRole::Lead,
        };
        let team = Session {
            user_id: Uuid::new_v4(),
            role: UserRole::Team,
        };

        assert!(lead.require_lead("create tasks").is_ok());
        assert!(matches!(
            team.require_lead("create tasks"),
            Err(ApiError::Forbidden(msg)) if msg == "Only leads can create tasks"
        ));
    }
}
