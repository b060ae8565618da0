//! Session manager: the single source of truth for who is signed in
//!
//! This module:
//! - Restores the session from the injected [`SessionStore`] on startup
//! - Handles login, registration and logout against the backend
//! - Exchanges the refresh token for a new access token (single-flighted)
//! - Mirrors every in-memory change to the store within the same operation
//! - Publishes an [`AuthState`] projection for views and the route guard

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::{Mutex, watch};

use super::models::{
    AuthEnvelope, AuthState, LoginRequest, RefreshRequest, RefreshResponse, RegisterRequest,
    Session, UserProfile,
};
use super::store::{ACCESS_TOKEN_KEY, SessionStore, read_session, write_session};
use crate::core::api::{
    ApiError, ApiRequest, HttpResponse, HttpTransport, extract_error_message,
};
use crate::core::validation::validate_registration;

pub const LOGIN_PATH: &str = "/auth/login/";
pub const REGISTER_PATH: &str = "/auth/register/";
pub const REFRESH_PATH: &str = "/auth/token/refresh/";

/// In-memory half of the session. `epoch` changes whenever the session is
/// replaced or dropped, so a refresh that started earlier can tell it is stale.
#[derive(Debug, Default)]
struct SessionSlot {
    session: Option<Session>,
    epoch: u64,
}

/// Owns the session, its persistence and the transport used for auth calls
pub struct SessionManager<S, T> {
    store: S,
    transport: T,
    base_url: String,
    slot: RwLock<SessionSlot>,
    refresh_lock: Mutex<()>,
    state: watch::Sender<AuthState>,
}

impl<S, T> SessionManager<S, T>
where
    S: SessionStore,
    T: HttpTransport,
{
    /// Create a manager in the `Loading` state. Call [`initialize`](Self::initialize)
    /// before rendering anything role-gated.
    pub fn new(store: S, transport: T, base_url: impl Into<String>) -> Self {
        let (state, _) = watch::channel(AuthState::Loading);
        Self {
            store,
            transport,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            slot: RwLock::new(SessionSlot::default()),
            refresh_lock: Mutex::new(()),
            state,
        }
    }

    /// Restore a persisted session. Leftovers that do not form a complete
    /// session are cleared.
    pub fn initialize(&self) -> AuthState {
        let mut slot = self.write_slot();

        let restored = match read_session(&self.store) {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!("Failed to read persisted session: {}", e);
                None
            }
        };

        if restored.is_none() {
            if let Err(e) = self.store.clear() {
                tracing::warn!("Failed to clear stale session entries: {}", e);
            }
        }

        slot.epoch += 1;
        let state = match restored {
            Some(session) => {
                tracing::info!("Restored session for user {}", session.user.id);
                let user = session.user.clone();
                slot.session = Some(session);
                AuthState::Authenticated(user)
            }
            None => {
                slot.session = None;
                AuthState::Unauthenticated
            }
        };

        self.state.send_replace(state.clone());
        state
    }

    /// Sign in with email and password
    pub async fn login(&self, email: &str, password: &str) -> Result<UserProfile, ApiError> {
        tracing::info!("Login attempt for email: {}", email);

        let request = ApiRequest::post(LOGIN_PATH).json(&LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        })?;

        let user = self.authenticate(&request).await?;
        tracing::info!("User logged in successfully: {}", user.id);
        Ok(user)
    }

    /// Create an account and sign in. The form is validated locally first; an
    /// invalid form never reaches the network.
    pub async fn register(&self, form: &RegisterRequest) -> Result<UserProfile, ApiError> {
        validate_registration(form).to_result()?;

        tracing::info!("Registration attempt for email: {}", form.email);
        let request = ApiRequest::post(REGISTER_PATH).json(form)?;

        let user = self.authenticate(&request).await?;
        tracing::info!("User registered successfully: {}", user.id);
        Ok(user)
    }

    /// Drop the session everywhere. Never fails; store errors are only logged.
    pub fn logout(&self) {
        let mut slot = self.write_slot();

        if let Err(e) = self.store.clear() {
            tracing::warn!("Failed to clear persisted session on logout: {}", e);
        }
        slot.session = None;
        slot.epoch += 1;

        self.state.send_replace(AuthState::Unauthenticated);
        tracing::info!("User logged out");
    }

    /// Current authentication state
    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Receive every state change (login, logout, expiry)
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading()
    }

    pub fn is_authenticated(&self) -> bool {
        self.read_slot().session.is_some()
    }

    pub fn current_user(&self) -> Option<UserProfile> {
        self.read_slot().session.as_ref().map(|s| s.user.clone())
    }

    pub fn access_token(&self) -> Option<String> {
        self.read_slot()
            .session
            .as_ref()
            .map(|s| s.access_token.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn transport(&self) -> &T {
        &self.transport
    }

    /// Send without credentials and without the refresh-on-401 behavior
    pub(crate) async fn send_public(&self, request: &ApiRequest) -> Result<HttpResponse, ApiError> {
        let response = self
            .transport
            .send(request.to_http(&self.base_url, None))
            .await?;
        Ok(response)
    }

    /// Obtain a fresh access token after `stale` was rejected.
    ///
    /// Refreshes are serialized: a caller that waited on another refresh reuses
    /// its token instead of issuing a second exchange. On failure the session is
    /// cleared, the state becomes [`AuthState::Expired`] and
    /// [`ApiError::AuthorizationExpired`] is returned. If a new login replaced
    /// the session while the exchange was in flight, its token is returned
    /// instead.
    pub(crate) async fn refresh_access_token(
        &self,
        stale: Option<&str>,
    ) -> Result<String, ApiError> {
        let _guard = self.refresh_lock.lock().await;

        let (epoch, current) = {
            let slot = self.read_slot();
            (slot.epoch, slot.session.clone())
        };

        let Some(current) = current else {
            tracing::info!("Request unauthorized and no session to refresh");
            self.expire(epoch);
            return Err(ApiError::AuthorizationExpired);
        };

        if stale != Some(current.access_token.as_str()) {
            tracing::debug!("Access token already replaced, reusing it");
            return Ok(current.access_token);
        }

        tracing::info!("Access token rejected, refreshing");
        let access = match self.exchange_refresh_token(&current.refresh_token).await {
            Ok(access) => access,
            Err(e) => {
                tracing::warn!("Token refresh failed: {}", e);
                self.expire(epoch);
                // A login that landed meanwhile survives `expire`
                return self.access_token().ok_or(ApiError::AuthorizationExpired);
            }
        };

        let mut slot = self.write_slot();
        if slot.epoch != epoch {
            tracing::info!("Session changed while refreshing, discarding new token");
            return match slot.session.as_ref() {
                Some(session) => Ok(session.access_token.clone()),
                None => Err(ApiError::AuthorizationExpired),
            };
        }

        if let Err(e) = self.store.set(ACCESS_TOKEN_KEY, &access) {
            tracing::warn!("Failed to persist refreshed token: {}", e);
            if let Err(e) = self.store.clear() {
                tracing::warn!("Failed to clear persisted session: {}", e);
            }
            slot.session = None;
            slot.epoch += 1;
            self.state.send_replace(AuthState::Expired);
            return Err(ApiError::AuthorizationExpired);
        }

        if let Some(session) = slot.session.as_mut() {
            session.access_token = access.clone();
        }
        tracing::info!("Access token refreshed");
        Ok(access)
    }

    async fn exchange_refresh_token(&self, refresh: &str) -> Result<String, ApiError> {
        let request = ApiRequest::post(REFRESH_PATH).json(&RefreshRequest { refresh })?;
        let response = self.send_public(&request).await?;

        if !response.is_success() {
            return Err(ApiError::Auth(extract_error_message(&response.body)));
        }

        let refreshed: RefreshResponse = response.json()?;
        if refreshed.access.is_empty() {
            return Err(ApiError::Decode("empty access token".to_string()));
        }
        Ok(refreshed.access)
    }

    async fn authenticate(&self, request: &ApiRequest) -> Result<UserProfile, ApiError> {
        let response = self.send_public(request).await?;

        if !response.is_success() {
            let message = extract_error_message(&response.body);
            tracing::info!("Authentication rejected ({}): {}", response.status, message);
            return Err(match response.status {
                400 | 401 | 403 => ApiError::Auth(message),
                status => ApiError::Http { status, message },
            });
        }

        let envelope: AuthEnvelope = response.json()?;
        let tokens = &envelope.data.tokens;
        if tokens.access.is_empty() || tokens.refresh.is_empty() {
            return Err(ApiError::Decode("empty token in auth response".to_string()));
        }
        let session = Session::new(envelope.data.user, envelope.data.tokens);
        let user = session.user.clone();
        self.establish(session)?;
        Ok(user)
    }

    /// Make `session` the active one, persisted first. If persisting fails the
    /// store has been rolled back, so memory is emptied to match it.
    fn establish(&self, session: Session) -> Result<(), ApiError> {
        let mut slot = self.write_slot();
        slot.epoch += 1;

        if let Err(e) = write_session(&self.store, &session) {
            tracing::warn!("Failed to persist session: {}", e);
            slot.session = None;
            self.state.send_replace(AuthState::Unauthenticated);
            return Err(e.into());
        }

        let user = session.user.clone();
        slot.session = Some(session);
        self.state.send_replace(AuthState::Authenticated(user));
        Ok(())
    }

    /// Drop the session after an irrecoverable refresh failure, unless it was
    /// already replaced since `epoch` was observed.
    fn expire(&self, epoch: u64) {
        let mut slot = self.write_slot();
        if slot.epoch != epoch {
            return;
        }

        if let Err(e) = self.store.clear() {
            tracing::warn!("Failed to clear persisted session: {}", e);
        }
        slot.session = None;
        slot.epoch += 1;
        self.state.send_replace(AuthState::Expired);
        tracing::info!("Session expired, re-authentication required");
    }

    fn read_slot(&self) -> RwLockReadGuard<'_, SessionSlot> {
        self.slot.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_slot(&self) -> RwLockWriteGuard<'_, SessionSlot> {
        self.slot.write().unwrap_or_else(|e| e.into_inner())
    }
}
