use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;

use crate::errors::JsonApiError;

pub const AUTHOR_HEADER: &str = "x-user-email";

/// Caller identity recorded as `added_by`, read from `X-User-Email`.
#[derive(Debug, Clone)]
pub struct Author(pub String);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Author {
    type Rejection = JsonApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(AUTHOR_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| Author(v.to_string()))
            .ok_or_else(|| {
                JsonApiError::new(StatusCode::BAD_REQUEST, "MISSING_AUTHOR", Some("X-User-Email header is required".into()))
            })
    }
}
