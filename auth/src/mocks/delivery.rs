//! Recording code delivery for testing.

use crate::error::AuthError;
use crate::providers::{AuthFuture, CodeDelivery};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Keeps the last code sent to each username so tests can read it back.
///
/// Clones share the recorded codes.
#[derive(Debug, Clone, Default)]
pub struct RecordingCodeDelivery {
    codes: Arc<Mutex<HashMap<String, String>>>,
    sent: Arc<Mutex<Vec<(String, String)>>>,
    fail: Arc<AtomicBool>,
}

impl RecordingCodeDelivery {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent code sent to `username`.
    #[must_use]
    pub fn last_code(&self, username: &str) -> Option<String> {
        self.codes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(username)
            .cloned()
    }

    /// Every `(username, email)` pair a code was sent to, in order.
    #[must_use]
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Make subsequent deliveries fail.
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

impl CodeDelivery for RecordingCodeDelivery {
    fn send_confirmation_code<'a>(
        &'a self,
        username: &'a str,
        email: &'a str,
        code: &'a str,
    ) -> AuthFuture<'a, ()> {
        Box::pin(async move {
            if self.fail.load(Ordering::SeqCst) {
                return Err(AuthError::DeliveryFailed("recording delivery set to fail".to_string()));
            }
            self.codes
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(username.to_string(), code.to_string());
            self.sent
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push((username.to_string(), email.to_string()));
            Ok(())
        })
    }
}
