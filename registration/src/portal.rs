//! Per-user portal sessions.
//!
//! A [`PortalSession`] is the signed-in context of one user in one portal.
//! Operations check the portal's role before touching a service, and every
//! record created through the session is stamped with the session's subject,
//! never with caller-supplied identity.
//!
//! # Example
//!
//! ```ignore
//! match app.sign_in(Role::Attendee, "ada@example.com", "password123").await? {
//!     SignInOutcome::SignedIn(mut portal) => {
//!         let receipt = portal.register(&event_id).await?;
//!         let mut updates = portal.start_auto_refresh();
//!         // ...
//!         portal.sign_out().await?;
//!     }
//!     SignInOutcome::ConfirmationRequired { username } => prompt_for_code(&username),
//! }
//! ```

use crate::app::EventRegApp;
use crate::catalog::{self, AttendeeDashboard, AttendeeStats, EventQuery, OrganizerOverview};
use crate::error::{Result, ServiceError};
use crate::refresh::{FetchFuture, Fetcher, PeriodicRefresher, Snapshot};
use crate::types::{Event, EventId, NewEvent, Registration, RegistrationReceipt, ValidatedTicket};
use eventreg_auth::{Role, Session};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;

/// Result of a portal sign-in.
pub enum SignInOutcome {
    /// Credentials accepted and the role matches the portal.
    SignedIn(PortalSession),
    /// Correct password on an unconfirmed account; confirm, then sign in again.
    ConfirmationRequired {
        /// Generated username to confirm.
        username: String,
    },
}

/// Role-specific dashboard data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "portal", rename_all = "snake_case")]
pub enum Dashboard {
    /// Attendee portal dashboard.
    Attendee(AttendeeDashboard),
    /// Organizer portal dashboard.
    Organizer(OrganizerOverview),
}

struct PortalContext {
    app: EventRegApp,
    session: Session,
    role: Role,
}

impl PortalContext {
    fn require(&self, role: Role) -> Result<()> {
        if self.role == role {
            Ok(())
        } else {
            Err(ServiceError::AccessDenied {
                reason: format!("{role} portal required"),
            })
        }
    }

    async fn dashboard(&self) -> Result<Dashboard> {
        let services = self.app.services();
        let now = self.app.clock().now();
        match self.role {
            Role::Attendee => {
                let events = services.events.list_events().await?;
                let registrations = services.registrations.list_by_attendee(&self.session.subject).await?;
                let stats = AttendeeStats::compute(&events, &registrations, now);
                Ok(Dashboard::Attendee(AttendeeDashboard {
                    locations: catalog::locations(&events),
                    events,
                    registrations,
                    stats,
                }))
            }
            Role::Organizer => Ok(Dashboard::Organizer(
                services.events.organizer_overview(&self.session.subject, now).await?,
            )),
        }
    }

    /// Dashboard for the periodic refresh; fails once the session is gone.
    async fn refreshed_dashboard(&self) -> Result<Dashboard> {
        self.app.identity().resolve_session(self.session.session_id).await?;
        self.dashboard().await
    }
}

/// A signed-in user in one portal.
pub struct PortalSession {
    context: Arc<PortalContext>,
    refresher: Option<PeriodicRefresher<Dashboard>>,
}

impl PortalSession {
    pub(crate) fn new(app: EventRegApp, session: Session, role: Role) -> Self {
        Self {
            context: Arc::new(PortalContext { app, session, role }),
            refresher: None,
        }
    }

    /// The underlying session.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.context.session
    }

    /// Portal this session signed in to.
    #[must_use]
    pub fn role(&self) -> Role {
        self.context.role
    }

    /// Bearer token for the session.
    #[must_use]
    pub fn token(&self) -> String {
        self.context.session.session_id.to_string()
    }

    // ------------------------------------------------------------------
    // Both portals
    // ------------------------------------------------------------------

    /// Fetch one event.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::EventNotFound`] if no event has this id.
    pub async fn event(&self, event_id: &EventId) -> Result<Event> {
        self.context.app.services().events.get_event(event_id).await
    }

    /// Validate a ticket presented at the door.
    ///
    /// # Errors
    ///
    /// See [`TicketService::validate`](crate::services::TicketService::validate).
    pub async fn validate_ticket(&self, ticket_input: &str) -> Result<ValidatedTicket> {
        self.context.app.services().tickets.validate(ticket_input).await
    }

    /// Build the dashboard for this portal.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::StoreUnavailable`] if the store cannot be reached.
    pub async fn dashboard(&self) -> Result<Dashboard> {
        self.context.dashboard().await
    }

    // ------------------------------------------------------------------
    // Attendee portal
    // ------------------------------------------------------------------

    /// Search the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::AccessDenied`] outside the attendee portal.
    pub async fn events(&self, query: &EventQuery) -> Result<Vec<Event>> {
        self.context.require(Role::Attendee)?;
        let now = self.context.app.clock().now();
        self.context.app.services().events.search(query, now).await
    }

    /// Register the signed-in attendee for an event.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::AccessDenied`] outside the attendee portal, and
    /// otherwise the errors of
    /// [`RegistrationService::register`](crate::services::RegistrationService::register).
    pub async fn register(&self, event_id: &EventId) -> Result<RegistrationReceipt> {
        self.context.require(Role::Attendee)?;
        let session = &self.context.session;
        self.context
            .app
            .services()
            .registrations
            .register(event_id, &session.subject, &session.name, &session.email)
            .await
    }

    /// The signed-in attendee's registrations.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::AccessDenied`] outside the attendee portal.
    pub async fn my_registrations(&self) -> Result<Vec<Registration>> {
        self.context.require(Role::Attendee)?;
        self.context
            .app
            .services()
            .registrations
            .list_by_attendee(&self.context.session.subject)
            .await
    }

    // ------------------------------------------------------------------
    // Organizer portal
    // ------------------------------------------------------------------

    /// Create an event owned by the signed-in organizer.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::AccessDenied`] outside the organizer portal and
    /// [`ServiceError::Validation`] for incomplete details.
    pub async fn create_event(&self, new_event: NewEvent) -> Result<Event> {
        self.context.require(Role::Organizer)?;
        self.context
            .app
            .services()
            .events
            .create_event(&self.context.session.subject, new_event)
            .await
    }

    /// The organizer's events with registration counts.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::AccessDenied`] outside the organizer portal.
    pub async fn overview(&self) -> Result<OrganizerOverview> {
        self.context.require(Role::Organizer)?;
        let now = self.context.app.clock().now();
        self.context
            .app
            .services()
            .events
            .organizer_overview(&self.context.session.subject, now)
            .await
    }

    /// Registrations for one of the organizer's events.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::AccessDenied`] outside the organizer portal or
    /// for another organizer's event.
    pub async fn event_registrations(&self, event_id: &EventId) -> Result<Vec<Registration>> {
        self.context.require(Role::Organizer)?;
        self.context
            .app
            .services()
            .registrations
            .list_for_organizer(&self.context.session.subject, event_id)
            .await
    }

    // ------------------------------------------------------------------
    // Refresh and sign-out
    // ------------------------------------------------------------------

    /// Start refreshing the dashboard every configured interval; returns a
    /// receiver of dashboard snapshots. Calling it again returns a receiver
    /// for the running refresher.
    pub fn start_auto_refresh(&mut self) -> watch::Receiver<Option<Snapshot<Dashboard>>> {
        if let Some(refresher) = &self.refresher {
            return refresher.subscribe();
        }
        let context = Arc::clone(&self.context);
        let fetch: Fetcher<Dashboard> = Arc::new(move || -> FetchFuture<Dashboard> {
            let context = Arc::clone(&context);
            Box::pin(async move { context.refreshed_dashboard().await })
        });
        let interval = self.context.app.config().portal.refresh_interval();
        tracing::debug!(username = %self.context.session.username, ?interval, "Starting dashboard refresh");
        let refresher = PeriodicRefresher::spawn(fetch, interval);
        let receiver = refresher.subscribe();
        self.refresher = Some(refresher);
        receiver
    }

    /// Refresh the dashboard now. Returns `false` when auto-refresh is not
    /// running or a newer snapshot was already published.
    ///
    /// # Errors
    ///
    /// Returns the dashboard fetch error.
    pub async fn refresh_now(&self) -> Result<bool> {
        match &self.refresher {
            Some(refresher) => refresher.refresh_now().await,
            None => Ok(false),
        }
    }

    /// The running refresher, if any.
    #[must_use]
    pub const fn refresher(&self) -> Option<&PeriodicRefresher<Dashboard>> {
        self.refresher.as_ref()
    }

    /// Stop refreshing and revoke the session.
    ///
    /// # Errors
    ///
    /// Propagates the identity provider's error; refreshing is stopped either way.
    pub async fn sign_out(mut self) -> Result<()> {
        if let Some(refresher) = self.refresher.take() {
            refresher.stop();
        }
        let session = &self.context.session;
        tracing::info!(username = %session.username, role = %self.context.role, "Signed out");
        self.context.app.sign_out(session.session_id).await
    }
}
