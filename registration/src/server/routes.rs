//! Router configuration.

use super::health::{health_check, readiness_check};
use super::state::AppState;
use crate::api::{auth, events, registrations, tickets};
use axum::{
    Router,
    http::{Method, header},
    middleware,
    routing::{get, post},
};
use eventreg_web::correlation_id;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the complete router: health checks at the root, the JSON API under
/// `/api`, request tracing and correlation ids on every route.
///
/// Browser portals on any origin may call the API; credentials travel in the
/// `Authorization` header, never in cookies.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Accounts and sessions
        .route("/auth/sign-up", post(auth::sign_up))
        .route("/auth/confirm", post(auth::confirm))
        .route("/auth/resend-code", post(auth::resend_code))
        .route("/auth/sign-in", post(auth::sign_in))
        .route("/auth/sign-out", post(auth::sign_out))
        // Catalog
        .route("/events", get(events::list_events).post(events::create_event))
        .route("/events/:id", get(events::get_event))
        .route("/organizer/events", get(events::organizer_events))
        // Registrations
        .route(
            "/events/:id/registrations",
            post(registrations::register).get(registrations::event_registrations),
        )
        .route("/registrations/mine", get(registrations::my_registrations))
        // Door check
        .route("/tickets/:ticket_id", get(tickets::validate_ticket));

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .nest("/api", api_routes)
        .layer(middleware::from_fn(correlation_id))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
        )
        .with_state(state)
}
