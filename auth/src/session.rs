//! Sessions, roles and role checks.

use crate::error::{AuthError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Opaque session identifier, handed to clients as a bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generate a new random session id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parse a session id from its token form.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::SessionNotFound`] if the token is not a UUID;
    /// a malformed token can never name a live session.
    pub fn parse(token: &str) -> Result<Self> {
        Uuid::parse_str(token.trim())
            .map(Self)
            .map_err(|_| AuthError::SessionNotFound)
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role groups recognized by the portals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Registers for events (`attendees` group).
    Attendee,
    /// Creates and manages events (`organizers` group).
    Organizer,
}

impl Role {
    /// Name of the group carrying this role.
    #[must_use]
    pub const fn group(self) -> &'static str {
        match self {
            Self::Attendee => "attendees",
            Self::Organizer => "organizers",
        }
    }

    /// Resolve a group name to a role.
    #[must_use]
    pub fn from_group(group: &str) -> Option<Self> {
        match group {
            "attendees" => Some(Self::Attendee),
            "organizers" => Some(Self::Organizer),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Attendee => write!(f, "attendee"),
            Self::Organizer => write!(f, "organizer"),
        }
    }
}

impl FromStr for Role {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "attendee" | "attendees" => Ok(Self::Attendee),
            "organizer" | "organizers" => Ok(Self::Organizer),
            other => Err(AuthError::InvalidSignUp {
                reason: format!("unknown role: {other}"),
            }),
        }
    }
}

/// An authenticated caller.
///
/// `subject` is the only identity stamped on records created on the
/// caller's behalf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Session identifier.
    pub session_id: SessionId,
    /// Stable subject identifier of the user.
    pub subject: String,
    /// Generated username.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Group memberships.
    pub groups: Vec<String>,
    /// When the session was issued.
    pub issued_at: DateTime<Utc>,
    /// When the session stops being valid.
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Whether the session carries the role's group.
    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        self.groups.iter().any(|group| group == role.group())
    }

    /// Whether the session has expired at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Fail with [`AuthError::AccessDenied`] unless the session carries `role`.
///
/// # Errors
///
/// Returns [`AuthError::AccessDenied`] naming the missing group.
pub fn require_role(session: &Session, role: Role) -> Result<()> {
    if session.has_role(role) {
        Ok(())
    } else {
        Err(AuthError::AccessDenied {
            required: role.group().to_string(),
        })
    }
}
