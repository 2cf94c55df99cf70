use axum::extract::FromRequest;

use crate::error::ApiError;

/// `Json` whose rejections (bad syntax, wrong shape, missing content type)
/// render as a 400 envelope instead of axum's plain-text body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);
