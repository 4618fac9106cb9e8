//! Account and session endpoints.
//!
//! - POST /api/auth/sign-up - Create an unconfirmed account
//! - POST /api/auth/confirm - Confirm an account with its code
//! - POST /api/auth/resend-code - Send a fresh confirmation code
//! - POST /api/auth/sign-in - Sign in to a portal
//! - POST /api/auth/sign-out - Revoke the caller's session

use super::SessionUser;
use crate::portal::SignInOutcome;
use crate::server::state::AppState;
use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use eventreg_auth::{Role, SignUpRequest};
use eventreg_web::AppError;
use serde::{Deserialize, Serialize};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Response after signing up.
#[derive(Debug, Serialize, Deserialize)]
pub struct SignUpResponse {
    /// Generated username; needed to confirm the account.
    pub username: String,
    /// Always true: the account must be confirmed before sign-in.
    pub confirmation_required: bool,
}

/// Request to confirm an account.
#[derive(Debug, Deserialize)]
pub struct ConfirmRequest {
    /// Generated username.
    pub username: String,
    /// Code from the confirmation message.
    pub code: String,
}

/// Request for a fresh confirmation code.
#[derive(Debug, Deserialize)]
pub struct ResendCodeRequest {
    /// Generated username.
    pub username: String,
}

/// Request to sign in to a portal.
#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    /// Portal to sign in to.
    pub role: Role,
    /// Username, email or preferred username.
    pub identifier: String,
    /// Password.
    pub password: String,
}

/// Sign-in result.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SignInResponse {
    /// Signed in; use `token` as the bearer token.
    SignedIn {
        /// Bearer token.
        token: String,
        /// Generated username.
        username: String,
        /// Display name.
        name: String,
        /// Email address.
        email: String,
        /// Portal signed in to.
        role: Role,
        /// When the token stops working.
        expires_at: DateTime<Utc>,
    },
    /// The account must be confirmed first.
    ConfirmationRequired {
        /// Generated username to confirm.
        username: String,
    },
}

// ============================================================================
// Handlers
// ============================================================================

/// Create an unconfirmed account and send its confirmation code.
///
/// # Errors
///
/// 422 for invalid fields, 409 if the email or preferred username is taken.
pub async fn sign_up(
    State(state): State<AppState>,
    Json(request): Json<SignUpRequest>,
) -> Result<(StatusCode, Json<SignUpResponse>), AppError> {
    let username = state.app.sign_up(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(SignUpResponse {
            username,
            confirmation_required: true,
        }),
    ))
}

/// Confirm an account.
///
/// # Errors
///
/// 422 for a wrong or expired code, 404 for an unknown username.
pub async fn confirm(
    State(state): State<AppState>,
    Json(request): Json<ConfirmRequest>,
) -> Result<StatusCode, AppError> {
    state.app.confirm_sign_up(&request.username, request.code.trim()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Send a fresh confirmation code.
///
/// # Errors
///
/// 404 for an unknown username, 409 if already confirmed.
pub async fn resend_code(
    State(state): State<AppState>,
    Json(request): Json<ResendCodeRequest>,
) -> Result<StatusCode, AppError> {
    state.app.resend_code(&request.username).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Sign in to a portal.
///
/// # Errors
///
/// 401 for bad credentials, 403 for the wrong portal.
pub async fn sign_in(
    State(state): State<AppState>,
    Json(request): Json<SignInRequest>,
) -> Result<Json<SignInResponse>, AppError> {
    let outcome = state
        .app
        .sign_in(request.role, request.identifier.trim(), &request.password)
        .await?;
    let response = match outcome {
        SignInOutcome::SignedIn(portal) => {
            let session = portal.session();
            SignInResponse::SignedIn {
                token: portal.token(),
                username: session.username.clone(),
                name: session.name.clone(),
                email: session.email.clone(),
                role: portal.role(),
                expires_at: session.expires_at,
            }
        }
        SignInOutcome::ConfirmationRequired { username } => SignInResponse::ConfirmationRequired { username },
    };
    Ok(Json(response))
}

/// Revoke the caller's session.
///
/// # Errors
///
/// 401 without a live session.
pub async fn sign_out(
    State(state): State<AppState>,
    SessionUser(session): SessionUser,
) -> Result<StatusCode, AppError> {
    state.app.sign_out(session.session_id).await?;
    tracing::info!(username = %session.username, "Signed out");
    Ok(StatusCode::NO_CONTENT)
}
