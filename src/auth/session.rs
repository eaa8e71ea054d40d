//! Session lifecycle: hydration, login, registration, refresh, logout.
//!
//! The manager owns the single authoritative identity for the running
//! client. Durable storage and the in-memory profile are always written
//! together so a reload can never observe state the live process never
//! had.

use std::sync::Arc;

use parking_lot::Mutex;
use reqwest::Method;
use tracing::{debug, info, warn};

use crate::api::{extract_server_message, ApiClient, ApiError};
use crate::models::{LoginResponse, RegisterRequest, UserProfile};

use super::store::{SessionStore, TOKEN_KEY, USER_KEY};

/// Login endpoint path.
const LOGIN_PATH: &str = "/api/v1/auth/login";

/// Registration endpoint path.
const REGISTER_PATH: &str = "/api/v1/users/";

/// Profile endpoint path (bearer-authenticated).
const PROFILE_PATH: &str = "/api/v1/users/me";

/// Fallback messages when the server rejection carries no usable body.
const LOGIN_FALLBACK: &str = "Login failed";
const REGISTER_FALLBACK: &str = "Registration failed";

/// Outcome of an identity operation. Rejections carry the server's
/// message so form call sites can render it directly; these operations
/// never surface an `Err` the caller has to unwind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Authenticated,
    Rejected(String),
}

impl AuthOutcome {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthOutcome::Authenticated)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            AuthOutcome::Authenticated => None,
            AuthOutcome::Rejected(message) => Some(message),
        }
    }
}

struct SessionState {
    user: Option<UserProfile>,
    loading: bool,
}

/// Token-based session manager. Starts in the loading state until
/// [`SessionManager::hydrate`] resolves the persisted session one way
/// or the other.
#[derive(Clone)]
pub struct SessionManager {
    client: ApiClient,
    store: Arc<dyn SessionStore>,
    state: Arc<Mutex<SessionState>>,
}

impl SessionManager {
    pub fn new(client: ApiClient, store: Arc<dyn SessionStore>) -> Self {
        Self {
            client,
            store,
            state: Arc::new(Mutex::new(SessionState {
                user: None,
                loading: true,
            })),
        }
    }

    // ===== Read-only surface =====

    /// Currently loaded profile, if any.
    pub fn user(&self) -> Option<UserProfile> {
        self.state.lock().user.clone()
    }

    /// True while startup hydration is still resolving.
    pub fn loading(&self) -> bool {
        self.state.lock().loading
    }

    /// A profile must be loaded in memory; a stored token alone does not
    /// count as authenticated.
    pub fn is_authenticated(&self) -> bool {
        self.state.lock().user.is_some()
    }

    // ===== Lifecycle =====

    /// Resolve the persisted session at startup. The stored profile is
    /// installed optimistically for immediate reads, then verified
    /// against the server; a failed refresh purges token and profile
    /// together. The loading flag drops once resolution finishes,
    /// success or failure.
    pub async fn hydrate(&self) {
        let token = self.store.get(TOKEN_KEY);

        if token.is_some() {
            if let Some(raw) = self.store.get(USER_KEY) {
                match serde_json::from_str::<UserProfile>(&raw) {
                    Ok(profile) => self.state.lock().user = Some(profile),
                    Err(err) => debug!(error = %err, "Ignoring unparseable stored profile"),
                }
            }
        }

        let Some(token) = token else {
            debug!("No stored token; starting anonymous");
            self.state.lock().loading = false;
            return;
        };

        if let Err(err) = self.refresh_user(Some(&token)).await {
            warn!(error = %err, "Session refresh failed; purging stored session");
            self.purge();
        }
        self.state.lock().loading = false;
    }

    /// Re-fetch the profile for the effective token (override or
    /// stored). With no token at all the profile is purged and `None`
    /// returned - that is the anonymous state, not an error.
    pub async fn refresh_user(
        &self,
        token_override: Option<&str>,
    ) -> Result<Option<UserProfile>, ApiError> {
        let token = token_override
            .map(str::to_string)
            .or_else(|| self.store.get(TOKEN_KEY));

        let Some(token) = token else {
            if let Err(err) = self.store.remove(USER_KEY) {
                warn!(error = %err, "Failed to remove stored profile");
            }
            self.state.lock().user = None;
            return Ok(None);
        };

        let request = self
            .client
            .request(Method::GET, PROFILE_PATH)
            .with_bearer(token);
        let response = self.client.send_with_retry(&request).await?;
        if !response.is_success() {
            return Err(ApiError::ProfileUnavailable);
        }

        let profile: UserProfile = response.json()?;
        self.install_profile(&profile);
        Ok(Some(profile))
    }

    /// Exchange credentials for a session. The access token is persisted
    /// first, then the profile is fetched with it; either failure comes
    /// back as `Rejected` with the server's message.
    pub async fn login(&self, email: &str, password: &str) -> AuthOutcome {
        let request = self
            .client
            .request(Method::POST, LOGIN_PATH)
            .with_json(serde_json::json!({ "email": email, "password": password }));

        let response = match self.client.send_with_retry(&request).await {
            Ok(response) => response,
            Err(err) => return AuthOutcome::Rejected(err.to_string()),
        };

        if !response.is_success() {
            let message = extract_server_message(&response.text(), LOGIN_FALLBACK);
            debug!(status = %response.status, "Login rejected");
            return AuthOutcome::Rejected(message);
        }

        let login: LoginResponse = match response.json() {
            Ok(login) => login,
            Err(err) => return AuthOutcome::Rejected(err.to_string()),
        };

        if let Err(err) = self.store.set(TOKEN_KEY, &login.access_token) {
            warn!(error = %err, "Failed to persist token");
        }

        match self.refresh_user(Some(&login.access_token)).await {
            Ok(_) => {
                info!("Login succeeded");
                AuthOutcome::Authenticated
            }
            Err(err) => AuthOutcome::Rejected(err.to_string()),
        }
    }

    /// Create an account, then immediately log in with the same
    /// credentials to establish the session.
    pub async fn register(&self, data: &RegisterRequest) -> AuthOutcome {
        let body = match serde_json::to_value(data) {
            Ok(body) => body,
            Err(err) => return AuthOutcome::Rejected(err.to_string()),
        };
        let request = self.client.request(Method::POST, REGISTER_PATH).with_json(body);

        let response = match self.client.send_with_retry(&request).await {
            Ok(response) => response,
            Err(err) => return AuthOutcome::Rejected(err.to_string()),
        };

        if !response.is_success() {
            let message = extract_server_message(&response.text(), REGISTER_FALLBACK);
            debug!(status = %response.status, "Registration rejected");
            return AuthOutcome::Rejected(message);
        }

        self.login(&data.email, &data.password).await
    }

    /// Drop the session from storage and memory. Synchronous so call
    /// sites can run it from non-async teardown paths.
    pub fn logout(&self) {
        info!("Logging out");
        self.purge();
    }

    // ===== Internal =====

    /// Write the profile to storage and memory together.
    fn install_profile(&self, profile: &UserProfile) {
        match serde_json::to_string(profile) {
            Ok(raw) => {
                if let Err(err) = self.store.set(USER_KEY, &raw) {
                    warn!(error = %err, "Failed to persist profile");
                }
            }
            Err(err) => warn!(error = %err, "Failed to serialize profile"),
        }
        self.state.lock().user = Some(profile.clone());
    }

    /// Remove both stored keys and the in-memory profile together.
    fn purge(&self) {
        for key in [TOKEN_KEY, USER_KEY] {
            if let Err(err) = self.store.remove(key) {
                warn!(key, error = %err, "Failed to clear session key");
            }
        }
        self.state.lock().user = None;
    }
}

// ============================================================================
// Tests
// ============================================================================
