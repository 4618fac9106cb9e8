//! Axum middleware for request tracking.
//!
//! [`correlation_id`] gives every request a correlation ID, runs the rest of
//! the stack inside a tracing span carrying it, and echoes it back in the
//! `X-Correlation-ID` response header.
//!
//! # Example
//!
//! ```ignore
//! use axum::{Router, middleware::from_fn};
//! use eventreg_web::middleware::correlation_id;
//!
//! let app = Router::new()
//!     .route("/api/events", get(list_events))
//!     .layer(from_fn(correlation_id));
//! ```

use crate::extractors::CorrelationId;
use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Instrument;
use uuid::Uuid;

/// Header name for correlation ID.
pub const CORRELATION_ID_HEADER: &str = "X-Correlation-ID";

/// Correlation ID middleware, for use with `axum::middleware::from_fn`.
pub async fn correlation_id(mut request: Request, next: Next) -> Response {
    let id = request
        .headers()
        .get(CORRELATION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(Uuid::new_v4);
    request.extensions_mut().insert(CorrelationId(id));

    let span = tracing::info_span!(
        "http_request",
        correlation_id = %id,
        method = %request.method(),
        uri = %request.uri(),
    );

    let mut response = next.run(request).instrument(span).await;
    if let Ok(value) = HeaderValue::from_str(&id.to_string()) {
        response.headers_mut().insert(CORRELATION_ID_HEADER, value);
    }
    response
}
