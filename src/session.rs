use serde_json::Value;
use std::sync::Arc;
use tokio::sync::watch;

use crate::api_client::{endpoints, ApiClient};
use crate::errors::{ActionResult, ErrorContext};
use crate::interaction::Navigator;
use crate::models::{Credentials, Identity, UserProfile};
use crate::state::Shared;
use crate::{log_system_event, log_validation};

#[derive(Debug, Clone, Default, PartialEq)]
pub enum SessionState {
    #[default]
    Unauthenticated,
    Authenticated(Identity),
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            SessionState::Authenticated(identity) => Some(identity),
            SessionState::Unauthenticated => None,
        }
    }
}

/// Who is logged in, as far as the backend says.
///
/// State is never persisted locally; [`Session::probe`] re-derives it from
/// the backend and can be called again at any time.
#[derive(Clone)]
pub struct Session {
    api: ApiClient,
    navigator: Arc<dyn Navigator>,
    state: Shared<SessionState>,
}

impl Session {
    pub fn new(api: ApiClient, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            api,
            navigator,
            state: Shared::new(SessionState::Unauthenticated),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state.get()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.read().is_authenticated()
    }

    pub fn username(&self) -> Option<String> {
        self.state
            .read()
            .identity()
            .and_then(|identity| identity.username().map(str::to_string))
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.state.subscribe()
    }

    /// Ask the backend who we are. Any failure, or an unauthenticated
    /// answer, lands in `Unauthenticated`; nothing escapes.
    pub async fn probe(&self) -> SessionState {
        let next = match self.api.get::<Identity>(endpoints::IDENTITY).await {
            Ok(identity) if identity.authenticated => {
                log_system_event!(session, "identity resolved");
                SessionState::Authenticated(identity)
            }
            Ok(_) => {
                log_system_event!(session, "no authenticated session");
                SessionState::Unauthenticated
            }
            Err(err) => {
                ErrorContext::new("probe_identity", "session").report(&err, "Identity probe failed.");
                SessionState::Unauthenticated
            }
        };

        self.state.replace(next.clone());
        next
    }

    pub async fn login(&self, username: &str, password: &str) -> ActionResult<Identity> {
        let credentials = Credentials {
            username: username.to_string(),
            password: password.to_string(),
        };

        match self.api.post::<_, UserProfile>(endpoints::LOGIN, &credentials).await {
            Ok(user) => {
                let identity = Identity::from(user);
                self.state.replace(SessionState::Authenticated(identity.clone()));
                log_system_event!(session, "login succeeded");
                ActionResult::ok_with(identity)
            }
            Err(err) => {
                let message = ErrorContext::new("login", "session").report(&err, "Login failed.");
                ActionResult::failed(message)
            }
        }
    }

    /// Create an account. Does not log in.
    pub async fn register(&self, username: &str, password: &str, confirm_password: &str) -> ActionResult {
        if password != confirm_password {
            log_validation!(failure, "registration", error = "Passwords do not match.");
            return ActionResult::failed("Passwords do not match.");
        }

        let credentials = Credentials {
            username: username.to_string(),
            password: password.to_string(),
        };

        match self.api.post::<_, Value>(endpoints::REGISTER, &credentials).await {
            Ok(_) => {
                log_system_event!(session, "registration succeeded");
                ActionResult::ok()
            }
            Err(err) => {
                let message =
                    ErrorContext::new("register", "session").report(&err, "Registration failed.");
                ActionResult::failed(message)
            }
        }
    }

    /// Best-effort server logout, then local state is cleared and the
    /// navigator sends the app back to its root no matter what.
    pub async fn logout(&self) {
        if let Err(err) = self.api.post_empty(endpoints::LOGOUT).await {
            ErrorContext::new("logout", "session").report(&err, "Logout failed.");
        }

        self.state.replace(SessionState::Unauthenticated);
        log_system_event!(session, "session cleared");
        self.navigator.to_root();
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
