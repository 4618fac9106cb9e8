//! HTTP API handlers.
//!
//! Handlers authenticate with one of the session extractors below, call a
//! service, and let [`AppError`] turn failures into JSON error envelopes.
//!
//! - [`SessionUser`]: any signed-in user
//! - [`RequireAttendee`]: a user in the `attendees` group
//! - [`RequireOrganizer`]: a user in the `organizers` group

pub mod auth;
pub mod events;
pub mod registrations;
pub mod tickets;

use crate::error::ServiceError;
use crate::server::state::AppState;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use eventreg_auth::{Role, Session, require_role};
use eventreg_web::{AppError, BearerToken};

/// Authenticated session resolved from the bearer token.
#[derive(Debug, Clone)]
pub struct SessionUser(pub Session);

#[async_trait]
impl FromRequestParts<AppState> for SessionUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;
        let session = state.app.resolve_session(&token).await?;
        Ok(Self(session))
    }
}

async fn session_with_role(parts: &mut Parts, state: &AppState, role: Role) -> Result<Session, AppError> {
    let SessionUser(session) = SessionUser::from_request_parts(parts, state).await?;
    require_role(&session, role).map_err(ServiceError::from)?;
    Ok(session)
}

/// Authenticated attendee.
///
/// Rejects with 401 without a live session and 403 without the `attendees` group.
#[derive(Debug, Clone)]
pub struct RequireAttendee(pub Session);

#[async_trait]
impl FromRequestParts<AppState> for RequireAttendee {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        session_with_role(parts, state, Role::Attendee).await.map(Self)
    }
}

/// Authenticated organizer.
///
/// Rejects with 401 without a live session and 403 without the `organizers` group.
#[derive(Debug, Clone)]
pub struct RequireOrganizer(pub Session);

#[async_trait]
impl FromRequestParts<AppState> for RequireOrganizer {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        session_with_role(parts, state, Role::Organizer).await.map(Self)
    }
}
