//! Ticket validation endpoint.

use super::SessionUser;
use crate::server::state::AppState;
use crate::types::ValidatedTicket;
use axum::{
    Json,
    extract::{Path, State},
};
use eventreg_web::AppError;

/// Validate a ticket id. Lookup ignores case and surrounding whitespace.
///
/// # Errors
///
/// 404 for an unknown ticket or a ticket whose event is gone, 500 if the
/// ticket id is held by more than one registration.
pub async fn validate_ticket(
    State(state): State<AppState>,
    SessionUser(session): SessionUser,
    Path(ticket_id): Path<String>,
) -> Result<Json<ValidatedTicket>, AppError> {
    tracing::debug!(username = %session.username, "Validating ticket");
    let ticket = state.app.services().tickets.validate(&ticket_id).await?;
    Ok(Json(ticket))
}
