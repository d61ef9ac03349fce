// src/core/onboarding/auth.rs
use std::sync::Arc;
use tracing::{debug, info};

use super::types::{AuthMode, SessionContext};
use crate::network::contact::{ContactCredentials, RemoteContact};
use crate::utils::error::Result;

/// Runs the mode-specific handshake against the remote plugin. Both flows
/// start from the status probe; only the session flow trades credentials
/// for a token and verifies it with a manager fetch.
pub struct AuthNegotiator {
    contact: Arc<dyn RemoteContact>,
}

impl AuthNegotiator {
    pub fn new(contact: Arc<dyn RemoteContact>) -> Self {
        Self { contact }
    }

    pub async fn negotiate(
        &self,
        mode: AuthMode,
        address: &str,
        username: &str,
        password: &str,
    ) -> Result<SessionContext> {
        debug!("Negotiating {} with {}", mode, address);
        let status = self.contact.probe_status(address).await?;

        match mode {
            AuthMode::BasicAuth => {
                // Pre-shared credentials travel as-is on every later call;
                // the probe above is the whole exchange.
                Ok(SessionContext {
                    credentials: ContactCredentials::Basic {
                        username: username.to_string(),
                        password: password.to_string(),
                    },
                    status,
                    manager: None,
                })
            }
            AuthMode::XAuthToken => {
                let token = self
                    .contact
                    .create_session(address, username, password)
                    .await?;
                let credentials = ContactCredentials::Token(token);

                // One verification call confirms the target is reachable
                // and well-formed under the new token.
                let manager = self
                    .contact
                    .fetch_manager_info(address, &credentials)
                    .await?;

                info!("Session established with {} (manager {})", address, manager.uuid);
                Ok(SessionContext {
                    credentials,
                    status,
                    manager: Some(manager),
                })
            }
        }
    }
}
