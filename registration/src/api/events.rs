//! Event catalog endpoints.
//!
//! - GET /api/events - Search the catalog (attendee)
//! - GET /api/events/:id - Fetch one event (any session)
//! - POST /api/events - Create an event (organizer)
//! - GET /api/organizer/events - The organizer's events with counts

use super::{RequireAttendee, RequireOrganizer, SessionUser};
use crate::catalog::{EventQuery, OrganizerOverview};
use crate::server::state::AppState;
use crate::types::{Event, EventId, NewEvent};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use eventreg_web::AppError;

/// Search the catalog.
///
/// Query parameters: `search`, `location`, `window`
/// (`today`, `tomorrow`, `this_week`, `this_month`, `upcoming`, `past`) and
/// `sort` (`date`, `title`, `registrations`).
///
/// # Errors
///
/// 401/403 without an attendee session, 503 if the store is down.
pub async fn list_events(
    State(state): State<AppState>,
    RequireAttendee(_session): RequireAttendee,
    Query(query): Query<EventQuery>,
) -> Result<Json<Vec<Event>>, AppError> {
    let now = state.app.clock().now();
    let events = state.app.services().events.search(&query, now).await?;
    Ok(Json(events))
}

/// Fetch one event.
///
/// # Errors
///
/// 404 if no event has this id.
pub async fn get_event(
    State(state): State<AppState>,
    SessionUser(_session): SessionUser,
    Path(event_id): Path<String>,
) -> Result<Json<Event>, AppError> {
    let event = state.app.services().events.get_event(&EventId::new(event_id)).await?;
    Ok(Json(event))
}

/// Create an event owned by the caller.
///
/// # Errors
///
/// 422 for incomplete details.
pub async fn create_event(
    State(state): State<AppState>,
    RequireOrganizer(session): RequireOrganizer,
    Json(new_event): Json<NewEvent>,
) -> Result<(StatusCode, Json<Event>), AppError> {
    let event = state
        .app
        .services()
        .events
        .create_event(&session.subject, new_event)
        .await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// The caller's events with registration counts and stats.
///
/// # Errors
///
/// 401/403 without an organizer session.
pub async fn organizer_events(
    State(state): State<AppState>,
    RequireOrganizer(session): RequireOrganizer,
) -> Result<Json<OrganizerOverview>, AppError> {
    let now = state.app.clock().now();
    let overview = state
        .app
        .services()
        .events
        .organizer_overview(&session.subject, now)
        .await?;
    Ok(Json(overview))
}
