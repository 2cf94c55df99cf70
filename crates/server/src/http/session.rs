use axum::http::{
    HeaderMap, HeaderValue,
    header::{self, InvalidHeaderValue},
};

pub const SESSION_COOKIE: &str = "access_token";
const COOKIE_PATH: &str = "/api";

/// Attributes shared by the session cookie and its removal, so browsers
/// match the two up.
#[derive(Debug, Clone, Copy)]
pub struct CookieSettings {
    pub max_age_secs: i64,
    pub secure: bool,
}

impl CookieSettings {
    fn build(&self, value: &str, max_age_secs: i64) -> String {
        let mut parts = vec![
            format!("{SESSION_COOKIE}={value}"),
            format!("Path={COOKIE_PATH}"),
            format!("Max-Age={max_age_secs}"),
            "SameSite=Strict".to_string(),
            "HttpOnly".to_string(),
        ];
        if self.secure {
            parts.push("Secure".to_string());
        }
        parts.join("; ")
    }

    pub fn session_cookie(&self, token: &str) -> Result<HeaderValue, InvalidHeaderValue> {
        HeaderValue::from_str(&self.build(token, self.max_age_secs))
    }

    pub fn cleared_cookie(&self) -> HeaderValue {
        // Only ASCII attribute text, always a valid header value.
        HeaderValue::from_str(&self.build("", 0))
            .unwrap_or_else(|_| HeaderValue::from_static("access_token=; Path=/api; Max-Age=0"))
    }
}

/// Value of the session cookie from the request's `Cookie` headers.
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}
