//! Application assembly.
//!
//! [`EventRegApp`] wires the data store, identity provider and services
//! together and is the entry point for signing in to a portal. It is cheap to
//! clone; every clone shares the same components.

use crate::config::{Config, StorageBackend};
use crate::error::Result;
use crate::metrics;
use crate::portal::{PortalSession, SignInOutcome};
use crate::services::Services;
use eventreg_auth::providers::{ConsoleCodeDelivery, LocalIdentityProvider};
use eventreg_auth::{AuthError, CodeDelivery, IdentityProvider, Role, Session, SessionId, SignUpRequest, require_role};
use eventreg_core::environment::{Clock, IdGenerator, RandomIdGenerator, SystemClock};
use eventreg_core::{DataStore, StoreError, Table};
use eventreg_postgres::PostgresDataStore;
use eventreg_testing::InMemoryDataStore;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;

/// The assembled registration application.
#[derive(Clone)]
pub struct EventRegApp {
    config: Config,
    store: Arc<dyn DataStore>,
    identity: Arc<dyn IdentityProvider>,
    clock: Arc<dyn Clock>,
    services: Services,
}

impl EventRegApp {
    /// Build the application for `config` with the system clock, random ids
    /// and console code delivery.
    ///
    /// The postgres backend connects and runs migrations before returning.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the database cannot be reached
    /// or migrated.
    pub async fn new(config: Config) -> std::result::Result<Self, StoreError> {
        let store = connect_store(&config).await?;
        Ok(Self::with_components(
            config,
            store,
            Arc::new(ConsoleCodeDelivery::new()),
            Arc::new(SystemClock),
            Arc::new(RandomIdGenerator),
        ))
    }

    /// Build the application over explicit components, with the local
    /// identity provider keeping its users in `store`.
    #[must_use]
    pub fn with_components(
        config: Config,
        store: Arc<dyn DataStore>,
        delivery: Arc<dyn CodeDelivery>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        let identity = Arc::new(LocalIdentityProvider::new(
            Arc::clone(&store),
            delivery,
            Arc::clone(&clock),
            Arc::clone(&ids),
            config.auth.identity_config(),
        ));
        Self::with_identity(config, store, identity, clock, ids)
    }

    /// Build the application over an existing identity provider.
    #[must_use]
    pub fn with_identity(
        config: Config,
        store: Arc<dyn DataStore>,
        identity: Arc<dyn IdentityProvider>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        let services = Services::new(Arc::clone(&store), Arc::clone(&clock), ids);
        Self {
            config,
            store,
            identity,
            clock,
            services,
        }
    }

    /// Configuration the application was built with.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Domain services.
    #[must_use]
    pub const fn services(&self) -> &Services {
        &self.services
    }

    /// Identity provider.
    #[must_use]
    pub fn identity(&self) -> &Arc<dyn IdentityProvider> {
        &self.identity
    }

    /// Clock shared by every component.
    #[must_use]
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Create an unconfirmed account; returns the generated username.
    ///
    /// # Errors
    ///
    /// Propagates the identity provider's validation and conflict errors.
    pub async fn sign_up(&self, request: SignUpRequest) -> Result<String> {
        Ok(self.identity.sign_up(request).await?)
    }

    /// Confirm an account.
    ///
    /// # Errors
    ///
    /// Propagates the identity provider's code errors.
    pub async fn confirm_sign_up(&self, username: &str, code: &str) -> Result<()> {
        Ok(self.identity.confirm_sign_up(username, code).await?)
    }

    /// Send a fresh confirmation code.
    ///
    /// # Errors
    ///
    /// Propagates the identity provider's errors.
    pub async fn resend_code(&self, username: &str) -> Result<()> {
        Ok(self.identity.resend_code(username).await?)
    }

    /// Sign in to the portal for `role`.
    ///
    /// An unconfirmed account yields [`SignInOutcome::ConfirmationRequired`]
    /// instead of an error. Signing in to the wrong portal revokes the new
    /// session and fails with [`ServiceError::AccessDenied`](crate::error::ServiceError::AccessDenied).
    ///
    /// # Errors
    ///
    /// - [`ServiceError::Auth`](crate::error::ServiceError::Auth) for bad credentials or an unreachable provider
    /// - [`ServiceError::AccessDenied`](crate::error::ServiceError::AccessDenied) if the account lacks the role
    pub async fn sign_in(&self, role: Role, identifier: &str, password: &str) -> Result<SignInOutcome> {
        let session = match self.identity.authenticate(identifier, password).await {
            Ok(session) => session,
            Err(AuthError::UserNotConfirmed { username }) => {
                metrics::record_sign_in("confirmation_required");
                tracing::info!(%username, %role, "Sign-in requires confirmation");
                return Ok(SignInOutcome::ConfirmationRequired { username });
            }
            Err(err) => {
                metrics::record_sign_in("failed");
                tracing::info!(%role, error = %err, "Sign-in failed");
                return Err(err.into());
            }
        };

        if let Err(denied) = require_role(&session, role) {
            metrics::record_sign_in("wrong_portal");
            tracing::warn!(username = %session.username, %role, "Signed in to the wrong portal");
            if let Err(err) = self.identity.sign_out(session.session_id).await {
                tracing::warn!(error = %err, "Failed to revoke wrong-portal session");
            }
            return Err(denied.into());
        }

        metrics::record_sign_in("signed_in");
        tracing::info!(username = %session.username, %role, "Signed in");
        Ok(SignInOutcome::SignedIn(PortalSession::new(self.clone(), session, role)))
    }

    /// Resolve a bearer token to its live session.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Auth`](crate::error::ServiceError::Auth) for unknown, malformed or expired tokens.
    pub async fn resolve_session(&self, token: &str) -> Result<Session> {
        let session_id = SessionId::parse(token)?;
        Ok(self.identity.resolve_session(session_id).await?)
    }

    /// Revoke a session.
    ///
    /// # Errors
    ///
    /// Propagates the identity provider's errors.
    pub async fn sign_out(&self, session_id: SessionId) -> Result<()> {
        Ok(self.identity.sign_out(session_id).await?)
    }

    /// Whether the data store answers.
    pub async fn is_ready(&self) -> bool {
        match self.store.get(Table::Events, "__readiness_probe__").await {
            Ok(_) => true,
            Err(err) => {
                tracing::warn!(error = %err, "Readiness probe failed");
                false
            }
        }
    }
}

async fn connect_store(config: &Config) -> std::result::Result<Arc<dyn DataStore>, StoreError> {
    let storage = &config.storage;
    match storage.backend {
        StorageBackend::Memory => {
            tracing::info!("Using in-memory data store");
            Ok(Arc::new(InMemoryDataStore::new()))
        }
        StorageBackend::Postgres => {
            tracing::info!(
                max_connections = storage.max_connections,
                min_connections = storage.min_connections,
                "Connecting to PostgreSQL data store"
            );
            let pool = PgPoolOptions::new()
                .max_connections(storage.max_connections)
                .min_connections(storage.min_connections)
                .acquire_timeout(Duration::from_secs(storage.connect_timeout))
                .connect(&storage.database_url)
                .await
                .map_err(|e| StoreError::Unavailable(format!("failed to connect: {e}")))?;
            let store = PostgresDataStore::from_pool(pool, storage.tables.clone());
            store.migrate().await?;
            Ok(Arc::new(store))
        }
    }
}
