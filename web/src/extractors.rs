//! Custom Axum extractors.
//!
//! - [`CorrelationId`]: the request's correlation ID
//! - [`BearerToken`]: the raw token from an `Authorization: Bearer` header
//!
//! # Examples
//!
//! ```ignore
//! async fn handler(correlation_id: CorrelationId, token: BearerToken) -> Result<Json<Response>, AppError> {
//!     tracing::info!(correlation_id = %correlation_id.0, "Processing request");
//!     let session = identity.resolve_session(SessionId::parse(&token.0)?).await?;
//!     Ok(Json(response))
//! }
//! ```

use crate::error::AppError;
use crate::middleware::CORRELATION_ID_HEADER;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use uuid::Uuid;

/// Correlation ID for request tracing.
///
/// Prefers the ID stored by [`correlation_id`](crate::middleware::correlation_id)
/// middleware, then the `X-Correlation-ID` header, and otherwise
/// generates a new UUID v4.
#[derive(Debug, Clone, Copy)]
pub struct CorrelationId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(id) = parts.extensions.get::<CorrelationId>() {
            return Ok(*id);
        }
        let correlation_id = parts
            .headers
            .get(CORRELATION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .unwrap_or_else(Uuid::new_v4);

        Ok(Self(correlation_id))
    }
}

/// Bearer token from the `Authorization` header.
///
/// Rejects with 401 when the header is missing or uses another scheme.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Missing Authorization header"))?;

        parse_bearer(header)
            .map(|token| Self(token.to_string()))
            .ok_or_else(|| AppError::unauthorized("Authorization header must use the Bearer scheme"))
    }
}

/// Token part of a `Bearer <token>` header value.
fn parse_bearer(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bearer() {
        assert_eq!(parse_bearer("Bearer abc"), Some("abc"));
        assert_eq!(parse_bearer("bearer   abc "), Some("abc"));
        assert_eq!(parse_bearer("Basic abc"), None);
        assert_eq!(parse_bearer("Bearer "), None);
        assert_eq!(parse_bearer("abc"), None);
    }
}
