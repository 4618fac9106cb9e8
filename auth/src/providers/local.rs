//! Identity provider backed by the users table.
//!
//! Accounts live in the data store; sessions live in process memory and are
//! lost on restart.

use crate::config::IdentityConfig;
use crate::error::{AuthError, Result};
use crate::providers::{AuthFuture, CodeDelivery, IdentityProvider, SignUpRequest};
use crate::session::{Session, SessionId};
use crate::utils::{
    generate_confirmation_code, hash_password, is_valid_email, is_valid_phone_number, verify_password,
};
use chrono::{DateTime, Utc};
use constant_time_eq::constant_time_eq;
use eventreg_core::data_store::{DataStore, Filter, Item, PutCondition, StoreError, Table};
use eventreg_core::environment::{Clock, IdGenerator};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Account confirmation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum AccountStatus {
    Unconfirmed,
    Confirmed,
}

/// Stored account, one item per user in the users table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UserRecord {
    username: String,
    #[serde(rename = "UserID")]
    subject: String,
    email: String,
    name: String,
    phone_number: String,
    preferred_username: String,
    password_hash: String,
    status: AccountStatus,
    confirmation_code: Option<String>,
    code_expires_at: Option<DateTime<Utc>>,
    groups: Vec<String>,
    created_at: DateTime<Utc>,
}

impl UserRecord {
    fn into_item(self) -> Result<Item> {
        match serde_json::to_value(self).map_err(|e| StoreError::Serialization(e.to_string()))? {
            Value::Object(item) => Ok(item),
            _ => Err(StoreError::Serialization("user record is not an object".to_string()).into()),
        }
    }

    fn from_item(item: Item) -> Result<Self> {
        serde_json::from_value(Value::Object(item))
            .map_err(|e| StoreError::Serialization(e.to_string()).into())
    }
}

/// [`IdentityProvider`] over the users table with an in-process session registry.
///
/// # Example
///
/// ```ignore
/// let provider = LocalIdentityProvider::new(store, Arc::new(ConsoleCodeDelivery::new()), clock, ids, IdentityConfig::default());
/// let username = provider.sign_up(request).await?;
/// provider.confirm_sign_up(&username, "123456").await?;
/// let session = provider.authenticate("user@example.com", "password123").await?;
/// ```
pub struct LocalIdentityProvider {
    store: Arc<dyn DataStore>,
    delivery: Arc<dyn CodeDelivery>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    config: IdentityConfig,
    sessions: RwLock<HashMap<SessionId, Session>>,
}

impl LocalIdentityProvider {
    /// Create a provider.
    #[must_use]
    pub fn new(
        store: Arc<dyn DataStore>,
        delivery: Arc<dyn CodeDelivery>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
        config: IdentityConfig,
    ) -> Self {
        Self {
            store,
            delivery,
            clock,
            ids,
            config,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Number of sessions currently held, including expired ones not yet purged.
    pub async fn active_session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    fn validate(&self, request: &SignUpRequest) -> Result<()> {
        let invalid = |reason: &str| {
            Err(AuthError::InvalidSignUp {
                reason: reason.to_string(),
            })
        };

        if request.name.trim().is_empty() {
            return invalid("name is required");
        }
        if !is_valid_email(request.email.trim()) {
            return invalid("email address is invalid");
        }
        if !is_valid_phone_number(request.phone_number.trim()) {
            return invalid("phone number must start with + and contain 8 to 15 digits");
        }
        if request.preferred_username.trim().chars().count() < 3 {
            return invalid("preferred username must be at least 3 characters");
        }
        if request.password.chars().count() < self.config.min_password_length {
            return Err(AuthError::InvalidSignUp {
                reason: format!(
                    "password must be at least {} characters",
                    self.config.min_password_length
                ),
            });
        }
        Ok(())
    }

    async fn find_by(&self, attribute: &str, value: &str) -> Result<Option<UserRecord>> {
        let mut items = self
            .store
            .scan(Table::Users, Filter::new().equals(attribute, value))
            .await?;
        items.pop().map(UserRecord::from_item).transpose()
    }

    async fn load(&self, username: &str) -> Result<UserRecord> {
        let item = self
            .store
            .get(Table::Users, username)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        UserRecord::from_item(item)
    }

    async fn lookup(&self, identifier: &str) -> Result<Option<UserRecord>> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Ok(None);
        }
        if let Some(item) = self.store.get(Table::Users, identifier).await? {
            return UserRecord::from_item(item).map(Some);
        }
        if identifier.contains('@') {
            return self.find_by("Email", &identifier.to_lowercase()).await;
        }
        self.find_by("PreferredUsername", identifier).await
    }

    async fn issue_code(&self, mut user: UserRecord) -> Result<()> {
        let code = generate_confirmation_code();
        user.confirmation_code = Some(code.clone());
        user.code_expires_at = Some(self.clock.now() + self.config.confirmation_code_ttl);
        let (username, email) = (user.username.clone(), user.email.clone());

        self.store
            .put(Table::Users, user.into_item()?, PutCondition::Always)
            .await?;
        self.delivery
            .send_confirmation_code(&username, &email, &code)
            .await
    }

    async fn do_sign_up(&self, request: SignUpRequest) -> Result<String> {
        self.validate(&request)?;

        let email = request.email.trim().to_lowercase();
        let preferred_username = request.preferred_username.trim().to_string();

        if self.find_by("Email", &email).await?.is_some() {
            return Err(AuthError::UserAlreadyExists {
                field: "email".to_string(),
            });
        }
        if self.find_by("PreferredUsername", &preferred_username).await?.is_some() {
            return Err(AuthError::UserAlreadyExists {
                field: "preferred username".to_string(),
            });
        }

        let now = self.clock.now();
        let username = format!("user_{}_{}", now.timestamp_millis(), self.ids.random_token(9));
        let code = generate_confirmation_code();
        let record = UserRecord {
            username: username.clone(),
            subject: uuid::Uuid::new_v4().to_string(),
            email: email.clone(),
            name: request.name.trim().to_string(),
            phone_number: request.phone_number.trim().to_string(),
            preferred_username,
            password_hash: hash_password(&request.password)?,
            status: AccountStatus::Unconfirmed,
            confirmation_code: Some(code.clone()),
            code_expires_at: Some(now + self.config.confirmation_code_ttl),
            groups: vec![request.role.group().to_string()],
            created_at: now,
        };

        self.store
            .put(
                Table::Users,
                record.into_item()?,
                PutCondition::UniqueAttributes(vec!["Email".to_string()]),
            )
            .await
            .map_err(|e| match e {
                StoreError::ConditionFailed(_) => AuthError::UserAlreadyExists {
                    field: "email".to_string(),
                },
                other => other.into(),
            })?;

        info!(username = %username, role = %request.role, "User signed up");
        self.delivery.send_confirmation_code(&username, &email, &code).await?;
        Ok(username)
    }

    async fn do_confirm(&self, username: &str, code: &str) -> Result<()> {
        let mut user = self.load(username.trim()).await?;
        if user.status == AccountStatus::Confirmed {
            return Err(AuthError::AlreadyConfirmed);
        }

        let expected = user.confirmation_code.as_deref().ok_or(AuthError::CodeMismatch)?;
        if user.code_expires_at.is_some_and(|expires| self.clock.now() >= expires) {
            return Err(AuthError::CodeExpired);
        }
        if !constant_time_eq(expected.as_bytes(), code.trim().as_bytes()) {
            debug!(username = %user.username, "Confirmation code mismatch");
            return Err(AuthError::CodeMismatch);
        }

        user.status = AccountStatus::Confirmed;
        user.confirmation_code = None;
        user.code_expires_at = None;
        let username = user.username.clone();
        self.store
            .put(Table::Users, user.into_item()?, PutCondition::Always)
            .await?;

        info!(username = %username, "User confirmed");
        Ok(())
    }

    async fn do_resend(&self, username: &str) -> Result<()> {
        let user = self.load(username.trim()).await?;
        if user.status == AccountStatus::Confirmed {
            return Err(AuthError::AlreadyConfirmed);
        }
        self.issue_code(user).await
    }

    async fn do_authenticate(&self, identifier: &str, password: &str) -> Result<Session> {
        let Some(user) = self.lookup(identifier).await? else {
            debug!("Sign-in for unknown identifier");
            return Err(AuthError::InvalidCredentials);
        };
        if !verify_password(password, &user.password_hash) {
            warn!(username = %user.username, "Sign-in with wrong password");
            return Err(AuthError::InvalidCredentials);
        }
        if user.status == AccountStatus::Unconfirmed {
            return Err(AuthError::UserNotConfirmed {
                username: user.username,
            });
        }

        let now = self.clock.now();
        let session = Session {
            session_id: SessionId::new(),
            subject: user.subject,
            username: user.username,
            email: user.email,
            name: user.name,
            groups: user.groups,
            issued_at: now,
            expires_at: now + self.config.session_ttl,
        };
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, held| !held.is_expired(now));
        let purged = before - sessions.len();
        if purged > 0 {
            debug!(purged, "Purged expired sessions");
        }
        sessions.insert(session.session_id, session.clone());
        drop(sessions);

        info!(username = %session.username, session_id = %session.session_id, "Session issued");
        Ok(session)
    }

    async fn do_resolve(&self, session_id: SessionId) -> Result<Session> {
        let session = self
            .sessions
            .read()
            .await
            .get(&session_id)
            .cloned()
            .ok_or(AuthError::SessionNotFound)?;

        if session.is_expired(self.clock.now()) {
            self.sessions.write().await.remove(&session_id);
            return Err(AuthError::SessionExpired);
        }
        Ok(session)
    }

    async fn do_sign_out(&self, session_id: SessionId) -> Result<()> {
        if let Some(session) = self.sessions.write().await.remove(&session_id) {
            info!(username = %session.username, session_id = %session_id, "Session revoked");
        }
        Ok(())
    }
}

impl IdentityProvider for LocalIdentityProvider {
    fn sign_up(&self, request: SignUpRequest) -> AuthFuture<'_, String> {
        Box::pin(self.do_sign_up(request))
    }

    fn confirm_sign_up<'a>(&'a self, username: &'a str, code: &'a str) -> AuthFuture<'a, ()> {
        Box::pin(self.do_confirm(username, code))
    }

    fn resend_code<'a>(&'a self, username: &'a str) -> AuthFuture<'a, ()> {
        Box::pin(self.do_resend(username))
    }

    fn authenticate<'a>(&'a self, identifier: &'a str, password: &'a str) -> AuthFuture<'a, Session> {
        Box::pin(self.do_authenticate(identifier, password))
    }

    fn resolve_session(&self, session_id: SessionId) -> AuthFuture<'_, Session> {
        Box::pin(self.do_resolve(session_id))
    }

    fn sign_out(&self, session_id: SessionId) -> AuthFuture<'_, ()> {
        Box::pin(self.do_sign_out(session_id))
    }
}
