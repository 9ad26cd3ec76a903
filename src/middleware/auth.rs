use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::error::ApiError;
use crate::state::AppState;

pub const MISSING_TOKEN: &str = "Unauthorized: Missing or invalid token";
pub const INVALID_API_KEY: &str = "Unauthorized: Invalid API Key";

/// API key middleware: every request must carry `Authorization: Bearer <API_KEY>`.
/// Runs before the body is read; rejected requests never reach a handler.
pub async fn api_key_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let presented = extract_bearer_from_headers(&headers).map_err(|reason| {
        tracing::warn!(path = %request.uri().path(), "rejecting request: {}", reason);
        ApiError::unauthorized(MISSING_TOKEN)
    })?;

    if presented != state.api_key().as_bytes() {
        tracing::warn!(path = %request.uri().path(), "rejecting request: API key mismatch");
        return Err(ApiError::unauthorized(INVALID_API_KEY));
    }

    Ok(next.run(request).await)
}

/// Extract the raw bearer credential from the Authorization header.
/// Header values may carry non-ASCII bytes, so nothing is decoded.
fn extract_bearer_from_headers(headers: &HeaderMap) -> Result<&[u8], &'static str> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .ok_or("missing Authorization header")?;

    auth_header
        .as_bytes()
        .strip_prefix(b"Bearer ")
        .ok_or("Authorization header must use Bearer token format")
}
