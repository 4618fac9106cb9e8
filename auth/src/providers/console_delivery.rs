//! Console code delivery for development.

use crate::providers::{AuthFuture, CodeDelivery};
use tracing::info;

/// Logs confirmation codes instead of sending them.
///
/// # Examples
///
/// ```ignore
/// use eventreg_auth::providers::{CodeDelivery, ConsoleCodeDelivery};
///
/// ConsoleCodeDelivery::new()
///     .send_confirmation_code("user_1", "user@example.com", "123456")
///     .await?;
/// ```
#[derive(Clone, Debug, Default)]
pub struct ConsoleCodeDelivery;

impl ConsoleCodeDelivery {
    /// Create a new console delivery channel.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl CodeDelivery for ConsoleCodeDelivery {
    fn send_confirmation_code<'a>(
        &'a self,
        username: &'a str,
        email: &'a str,
        code: &'a str,
    ) -> AuthFuture<'a, ()> {
        Box::pin(async move {
            info!(
                username = %username,
                to = %email,
                code = %code,
                "Confirmation code (development mode)"
            );
            Ok(())
        })
    }
}
