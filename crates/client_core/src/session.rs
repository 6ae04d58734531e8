//! Bearer credential ownership and the bootstrap sign-in flow.

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use tracing::{debug, info, warn};

use crate::{config::DemoCredentials, error::ClientError, transport::PortalApi};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthState {
    #[default]
    SignedOut,
    SignedIn {
        token: String,
    },
    /// The last login attempt completed but did not yield a usable token.
    InvalidCredentials,
}

impl AuthState {
    pub fn is_signed_in(&self) -> bool {
        matches!(self, AuthState::SignedIn { .. })
    }
}

pub struct SessionManager {
    api: Arc<dyn PortalApi>,
    credentials: DemoCredentials,
    state: AuthState,
}

impl SessionManager {
    pub fn new(api: Arc<dyn PortalApi>, credentials: DemoCredentials) -> Self {
        Self {
            api,
            credentials,
            state: AuthState::SignedOut,
        }
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.is_signed_in()
    }

    /// The bearer token, or an empty string while unauthenticated.
    pub fn credential(&self) -> &str {
        match &self.state {
            AuthState::SignedIn { token } => token,
            AuthState::SignedOut | AuthState::InvalidCredentials => "",
        }
    }

    /// `Authorization: Bearer <token>` when signed in, otherwise empty.
    pub fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let AuthState::SignedIn { token } = &self.state {
            if let Ok(value) = HeaderValue::from_str(&format!("Bearer {token}")) {
                headers.insert(AUTHORIZATION, value);
            }
        }
        headers
    }

    /// Seeds the demo account (best effort) and logs in with it.
    ///
    /// Transport failures leave the auth state untouched. A login that yields
    /// no usable token moves a signed-out session to `InvalidCredentials`; a
    /// session that is already signed in keeps its token.
    pub async fn acquire_session(&mut self) -> Result<&AuthState, ClientError> {
        if let Err(err) = self.api.seed_admin(&self.credentials).await {
            warn!(error = %err, "seed-admin bootstrap failed; continuing with login");
        } else {
            debug!(email = %self.credentials.email, "demo account seeded");
        }

        let token = match self.api.login(&self.credentials).await {
            Ok(response) => response
                .token()
                .filter(|token| HeaderValue::from_str(&format!("Bearer {token}")).is_ok())
                .map(str::to_string),
            Err(ClientError::InvalidCredentials) => None,
            Err(err) => return Err(err),
        };

        match token {
            Some(token) => {
                info!(email = %self.credentials.email, "signed in");
                self.state = AuthState::SignedIn { token };
                Ok(&self.state)
            }
            None => {
                if !self.state.is_signed_in() {
                    self.state = AuthState::InvalidCredentials;
                }
                warn!(email = %self.credentials.email, "login returned no access token");
                Err(ClientError::InvalidCredentials)
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
