//! Registration endpoints.
//!
//! - POST /api/events/:id/registrations - Register the caller (attendee)
//! - GET /api/events/:id/registrations - List an owned event's registrations
//! - GET /api/registrations/mine - The caller's registrations

use super::{RequireAttendee, RequireOrganizer};
use crate::server::state::AppState;
use crate::types::{EventId, Registration, RegistrationReceipt};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use eventreg_web::AppError;

/// Register the calling attendee for an event.
///
/// Name and email come from the session, never from the request.
///
/// # Errors
///
/// 404 for an unknown event, 409 for a duplicate or a full event.
pub async fn register(
    State(state): State<AppState>,
    RequireAttendee(session): RequireAttendee,
    Path(event_id): Path<String>,
) -> Result<(StatusCode, Json<RegistrationReceipt>), AppError> {
    let receipt = state
        .app
        .services()
        .registrations
        .register(&EventId::new(event_id), &session.subject, &session.name, &session.email)
        .await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// Registrations for an event the caller organizes.
///
/// # Errors
///
/// 403 for another organizer's event, 404 for an unknown event.
pub async fn event_registrations(
    State(state): State<AppState>,
    RequireOrganizer(session): RequireOrganizer,
    Path(event_id): Path<String>,
) -> Result<Json<Vec<Registration>>, AppError> {
    let registrations = state
        .app
        .services()
        .registrations
        .list_for_organizer(&session.subject, &EventId::new(event_id))
        .await?;
    Ok(Json(registrations))
}

/// The calling attendee's registrations, newest first.
///
/// # Errors
///
/// 401/403 without an attendee session.
pub async fn my_registrations(
    State(state): State<AppState>,
    RequireAttendee(session): RequireAttendee,
) -> Result<Json<Vec<Registration>>, AppError> {
    let registrations = state
        .app
        .services()
        .registrations
        .list_by_attendee(&session.subject)
        .await?;
    Ok(Json(registrations))
}
