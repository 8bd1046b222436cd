//! services/client/src/session/credential.rs
//!
//! The credential store: holds the bearer credential for the session,
//! persists it to durable storage and guards the routes that need it.

use hermes_core::domain::Credential;
use hermes_core::ports::{AuthService, DurableStorage, PortError};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{info, warn};

/// Storage key for the persisted bearer credential.
pub const CREDENTIAL_KEY: &str = "token";

/// The views the client can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Register,
    Chat,
}

impl Route {
    pub fn requires_session(self) -> bool {
        matches!(self, Route::Chat)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// No credential is held; the operation was refused locally.
    #[error("Not signed in")]
    NotAuthenticated,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Registration failed: {0}")]
    RegistrationFailed(String),
}

struct CredentialSlot {
    credential: Option<Credential>,
    route: Route,
}

/// Process-wide holder of the current credential.
pub struct CredentialStore {
    storage: Arc<dyn DurableStorage>,
    slot: Mutex<CredentialSlot>,
}

impl CredentialStore {
    /// Loads any persisted credential so a restart does not force a new login.
    pub fn load(storage: Arc<dyn DurableStorage>) -> Self {
        let credential = match storage.get(CREDENTIAL_KEY) {
            Ok(token) => token.filter(|t| !t.trim().is_empty()).map(Credential::new),
            Err(e) => {
                warn!("Could not read the stored credential: {}", e);
                None
            }
        };
        let route = if credential.is_some() {
            Route::Chat
        } else {
            Route::Login
        };
        Self {
            storage,
            slot: Mutex::new(CredentialSlot { credential, route }),
        }
    }

    pub fn current_credential(&self) -> Option<Credential> {
        self.slot.lock().credential.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.slot.lock().credential.is_some()
    }

    /// The credential for a bearer-gated call, or a local refusal.
    pub fn require(&self) -> Result<Credential, AuthError> {
        self.current_credential().ok_or(AuthError::NotAuthenticated)
    }

    /// Stores the credential and opens the guarded routes.
    pub fn login(&self, credential: Credential) {
        if let Err(e) = self.storage.set(CREDENTIAL_KEY, credential.as_str()) {
            warn!("Could not persist the credential: {}", e);
        }
        let mut slot = self.slot.lock();
        slot.credential = Some(credential);
        slot.route = Route::Chat;
    }

    /// Clears the credential and returns to the login entry point.
    pub fn logout(&self) {
        if let Err(e) = self.storage.remove(CREDENTIAL_KEY) {
            warn!("Could not remove the stored credential: {}", e);
        }
        let mut slot = self.slot.lock();
        slot.credential = None;
        slot.route = Route::Login;
    }

    /// Reacts to a backend failure; an `Unauthorized` answer ends the session.
    ///
    /// Returns true when it signed out, so the caller can tear down session state.
    pub fn observe(&self, error: &PortError) -> bool {
        if matches!(error, PortError::Unauthorized) && self.is_authenticated() {
            warn!("Backend rejected the credential; signing out");
            self.logout();
            return true;
        }
        false
    }

    pub fn route(&self) -> Route {
        self.slot.lock().route
    }

    /// Moves to `requested`, falling back to the login view when it needs a session.
    pub fn navigate(&self, requested: Route) -> Route {
        let mut slot = self.slot.lock();
        slot.route = if requested.requires_session() && slot.credential.is_none() {
            Route::Login
        } else {
            requested
        };
        slot.route
    }

    /// Exchanges a username and password for a credential. On failure the store is unchanged.
    pub async fn authenticate(
        &self,
        auth: &dyn AuthService,
        username: &str,
        password: &str,
    ) -> Result<(), AuthError> {
        match auth.authenticate(username, password).await {
            Ok(credential) => {
                info!("Signed in as {}", username);
                self.login(credential);
                Ok(())
            }
            Err(e) => {
                warn!("Sign-in failed for {}: {}", username, e);
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    /// Creates an account and sends the user to the login view.
    pub async fn register(
        &self,
        auth: &dyn AuthService,
        username: &str,
        password: &str,
    ) -> Result<(), AuthError> {
        match auth.register(username, password).await {
            Ok(()) => {
                info!("Registered account {}", username);
                self.navigate(Route::Login);
                Ok(())
            }
            Err(e) => {
                warn!("Registration failed for {}: {}", username, e);
                Err(AuthError::RegistrationFailed(
                    e.user_message("Registration failed"),
                ))
            }
        }
    }
}
