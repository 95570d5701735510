//! AUTHINFO USER/PASS authentication

use super::NntpSession;
use crate::commands;
use crate::error::Result;
use crate::response::{Expect, codes};
use std::sync::Arc;
use tracing::debug;

impl NntpSession {
    /// Authenticate with AUTHINFO USER/PASS
    ///
    /// Requires `381 ` after the username and `281 ` after the password; any
    /// other reply fails with a protocol error. On success the session is ready.
    ///
    /// # Errors
    ///
    /// - [`NntpError::UnexpectedResponse`](crate::NntpError::UnexpectedResponse) - credentials rejected or unexpected reply
    /// - [`NntpError::Usage`](crate::NntpError::Usage) - the session is not connected
    pub async fn auth(&mut self, user: &str, pass: &str) -> Result<()> {
        debug!("Authenticating as {}", user);
        self.send(
            &commands::authinfo_user(user),
            &[Expect::ok(codes::AUTH_CONTINUE)],
        )
        .await?;
        self.send(
            &commands::authinfo_pass(pass),
            &[Expect::ok(codes::AUTH_ACCEPTED)],
        )
        .await?;

        self.ready = true;
        debug!("Authentication successful");
        Ok(())
    }

    /// Authenticate with the credentials from the session configuration
    pub async fn authenticate(&mut self) -> Result<()> {
        let config = Arc::clone(&self.config);
        self.auth(&config.username, &config.password).await
    }
}
