//! Application state for the HTTP server.

use crate::app::EventRegApp;
use std::sync::Arc;

/// State shared by every handler; cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    /// The assembled application.
    pub app: Arc<EventRegApp>,
}

impl AppState {
    /// Wrap an application for serving.
    #[must_use]
    pub fn new(app: EventRegApp) -> Self {
        Self { app: Arc::new(app) }
    }
}
