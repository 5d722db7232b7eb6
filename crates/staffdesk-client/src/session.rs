//! Bearer token and authentication state

use parking_lot::RwLock;
use tokio::sync::watch;
use tracing::{info, warn};

/// Whether requests can be authenticated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    /// No token has been provided
    Anonymous,
    /// A token is held
    Authenticated,
    /// The server rejected the token; the user must sign in again
    ReauthRequired,
}

/// Token holder shared by every gateway of one signed-in user
///
/// State changes are published on a watch channel so a UI can route to the
/// sign-in screen when a request comes back `401`.
#[derive(Debug)]
pub struct Session {
    token: RwLock<Option<String>>,
    state: watch::Sender<AuthState>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Session {
    /// Create a session, authenticated if a token is given
    pub fn new(token: Option<String>) -> Self {
        let token = token.filter(|t| !t.trim().is_empty());
        let initial = if token.is_some() {
            AuthState::Authenticated
        } else {
            AuthState::Anonymous
        };
        let (state, _) = watch::channel(initial);
        Self {
            token: RwLock::new(token),
            state,
        }
    }

    /// Current bearer token
    pub fn token(&self) -> Option<String> {
        self.token.read().clone()
    }

    /// Current state
    pub fn state(&self) -> AuthState {
        *self.state.borrow()
    }

    /// Receiver for state changes
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// Store a fresh token
    pub fn sign_in(&self, token: impl Into<String>) {
        *self.token.write() = Some(token.into());
        self.state.send_replace(AuthState::Authenticated);
        info!("Session authenticated");
    }

    /// Drop the token voluntarily
    pub fn sign_out(&self) {
        self.token.write().take();
        self.state.send_replace(AuthState::Anonymous);
        info!("Signed out");
    }

    /// Drop the token after the server rejected it
    pub fn expire(&self) {
        self.token.write().take();
        self.state.send_replace(AuthState::ReauthRequired);
        warn!("Session token rejected; re-authentication required");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_blank_token_is_anonymous() {
        let session = Session::new(Some("  ".to_string()));
        assert_eq!(session.state(), AuthState::Anonymous);
        assert!(session.token().is_none());
    }

    #[test]
    fn test_expire_clears_token_and_notifies() {
        let session = Session::new(Some("abc".to_string()));
        let mut changes = session.subscribe();
        assert_eq!(session.state(), AuthState::Authenticated);

        session.expire();

        assert!(session.token().is_none());
        assert!(changes.has_changed().unwrap_or(false));
        assert_eq!(*changes.borrow_and_update(), AuthState::ReauthRequired);
    }

    #[test]
    fn test_sign_in_after_expiry() {
        let session = Session::default();
        session.expire();
        session.sign_in("fresh");

        assert_eq!(session.token().as_deref(), Some("fresh"));
        assert_eq!(session.state(), AuthState::Authenticated);
    }
}
