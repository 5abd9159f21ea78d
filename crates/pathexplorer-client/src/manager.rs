//! The Auth Context: one session owner per application root.
//!
//! # Purpose and responsibility
//! [`SessionManager`] is the single writer of the session. It restores the
//! session at startup, logs users in and out, updates the profile, and keeps
//! re-validating the token while mounted.
//!
//! # Concurrency model
//! - State is published on a `watch` channel and always replaced as a whole
//!   snapshot, so readers never see `user` and `is_authenticated` disagree.
//! - The re-validation timer and the 401 listener run as tasks owned by
//!   [`MountedSession`]; dropping the guard aborts both.
//! - Concurrent logouts collapse into one: the `is_logging_out` flag admits a
//!   single redirect until the settle delay has passed.
//! - Every logout bumps a session generation. A login or profile update
//!   whose backend call straddles a logout neither persists nor publishes
//!   its result.
use crate::{
    ApiClient, AuthBackend, ClientConfig, ClientError, ClientResult, CookieJar, FileStorage,
    HttpAuthBackend, KeyValueStorage, MemoryStorage, Navigator, ProfileUpdate, Restored,
    SessionEvent, SessionStore, UserRecord,
};
use pathexplorer_authz::{LOGIN_ROUTE, Role, is_token_expired};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Snapshot of the session as views see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthState {
    pub user: Option<UserRecord>,
    pub is_authenticated: bool,
    pub is_loading: bool,
}

impl AuthState {
    pub fn loading() -> Self {
        Self {
            user: None,
            is_authenticated: false,
            is_loading: true,
        }
    }

    pub fn signed_out() -> Self {
        Self {
            user: None,
            is_authenticated: false,
            is_loading: false,
        }
    }

    pub fn signed_in(user: UserRecord) -> Self {
        Self {
            user: Some(user),
            is_authenticated: true,
            is_loading: false,
        }
    }

    /// Role of the authenticated user, if any.
    pub fn role(&self) -> Option<Role> {
        if !self.is_authenticated {
            return None;
        }
        self.user.as_ref().map(|user| user.role)
    }
}

pub struct SessionManager {
    store: SessionStore,
    backend: Arc<dyn AuthBackend>,
    navigator: Arc<dyn Navigator>,
    unauthorized: Option<broadcast::Sender<SessionEvent>>,
    state: Arc<watch::Sender<AuthState>>,
    logging_out: Arc<AtomicBool>,
    generation: AtomicU64,
    revalidate_interval: Duration,
    logout_settle: Duration,
}

impl SessionManager {
    pub fn new(
        config: &ClientConfig,
        store: SessionStore,
        backend: Arc<dyn AuthBackend>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let (state, _) = watch::channel(AuthState::loading());
        Self {
            store,
            backend,
            navigator,
            unauthorized: None,
            state: Arc::new(state),
            logging_out: Arc::new(AtomicBool::new(false)),
            generation: AtomicU64::new(0),
            revalidate_interval: config.revalidate_interval,
            logout_settle: config.logout_settle,
        }
    }

    /// Wire the session to the remote backend described by `config`.
    ///
    /// Storage is the JSON file at `config.storage_path` when set, otherwise
    /// in-memory. `401` answers from the shared API client end the session.
    pub fn remote(config: &ClientConfig, navigator: Arc<dyn Navigator>) -> ClientResult<Self> {
        let storage: Arc<dyn KeyValueStorage> = match &config.storage_path {
            Some(path) => Arc::new(FileStorage::new(path)),
            None => Arc::new(MemoryStorage::new()),
        };
        let store = SessionStore::new(storage, Arc::new(CookieJar::new(config.cookie_days)));
        let api = Arc::new(ApiClient::new(config)?);
        let events = api.events();
        let backend = Arc::new(HttpAuthBackend::new(api));
        Ok(Self::new(config, store, backend, navigator).with_unauthorized_events(events))
    }

    /// Force a logout whenever an event arrives on `events` while signed in.
    pub fn with_unauthorized_events(mut self, events: broadcast::Sender<SessionEvent>) -> Self {
        self.unauthorized = Some(events);
        self
    }

    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub fn is_logging_out(&self) -> bool {
        self.logging_out.load(Ordering::SeqCst)
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    fn publish(&self, next: AuthState) {
        self.state.send_replace(next);
    }

    fn publish_loading(&self) {
        self.state.send_if_modified(|current| !std::mem::replace(&mut current.is_loading, true));
    }

    fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation() == generation
    }

    /// Publish `next` unless a logout has happened since `generation`.
    fn publish_if_current(&self, generation: u64, next: AuthState) -> bool {
        self.state.send_if_modified(|current| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            *current = next;
            true
        })
    }

    /// Drop the loading flag on whatever state is current. A logout that
    /// happened since `generation` owns the flag and is left alone.
    fn finish_loading(&self, generation: u64) {
        self.state.send_if_modified(|current| {
            if self.generation.load(Ordering::SeqCst) != generation || !current.is_loading {
                return false;
            }
            current.is_loading = false;
            true
        });
    }

    /// Undo a write that landed after a logout cleared the store.
    async fn discard_superseded(&self) {
        tracing::info!("session ended while a request was in flight; discarding result");
        if let Err(err) = self.store.clear().await {
            tracing::warn!(error = %err, "failed to clear session storage");
        }
    }

    /// Restore a persisted session. Always ends with `is_loading == false`.
    pub async fn init(&self) -> AuthState {
        self.publish_loading();
        let next = match self.store.restore().await {
            Ok(Restored::Session(session)) => {
                tracing::info!(user = %session.user.id, role = %session.user.role, "session restored");
                AuthState::signed_in(session.user)
            }
            Ok(Restored::Expired) => {
                self.navigator.hard_redirect(LOGIN_ROUTE);
                AuthState::signed_out()
            }
            Ok(Restored::Absent) => AuthState::signed_out(),
            Err(err) => {
                tracing::warn!(error = %err, "session storage unreadable; starting signed out");
                AuthState::signed_out()
            }
        };
        self.publish(next.clone());
        next
    }

    /// # Errors
    /// - `AuthenticationFailure` for bad credentials.
    /// - `SessionExpired` when the backend issues an already-expired token.
    /// - `Network` / `Storage` when the round-trip or persistence fails.
    ///
    /// On error the current state is kept. A logout that runs while the
    /// backend call is in flight wins: nothing is persisted and the call
    /// fails with `SessionExpired`.
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<UserRecord> {
        let generation = self.generation();
        self.publish_loading();
        let result = self.try_login(generation, email, password).await;
        let result = match result {
            Ok(user) if self.publish_if_current(generation, AuthState::signed_in(user.clone())) => {
                Ok(user)
            }
            Ok(_) => {
                self.discard_superseded().await;
                Err(ClientError::SessionExpired)
            }
            Err(err) => Err(err),
        };
        match &result {
            Ok(user) => tracing::info!(user = %user.id, role = %user.role, "user logged in"),
            Err(err) => {
                tracing::info!(error = %err, "login failed");
                self.finish_loading(generation);
            }
        }
        result
    }

    async fn try_login(
        &self,
        generation: u64,
        email: &str,
        password: &str,
    ) -> ClientResult<UserRecord> {
        let session = self.backend.login(email, password).await?;
        if is_token_expired(&session.token) {
            return Err(ClientError::SessionExpired);
        }
        if !self.is_current(generation) {
            return Err(ClientError::SessionExpired);
        }
        self.store.persist(&session.token, &session.user).await?;
        Ok(session.user)
    }

    /// Clear every copy of the session and hard-redirect to `/login`.
    pub async fn logout(&self) {
        if self.logging_out.swap(true, Ordering::SeqCst) {
            return;
        }
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Err(err) = self.store.clear().await {
            tracing::warn!(error = %err, "failed to clear session storage");
        }
        self.publish(AuthState {
            is_loading: true,
            ..AuthState::signed_out()
        });
        tracing::info!("session ended");
        self.navigator.hard_redirect(LOGIN_ROUTE);

        let state = Arc::clone(&self.state);
        let flag = Arc::clone(&self.logging_out);
        let settle = self.logout_settle;
        tokio::spawn(async move {
            tokio::time::sleep(settle).await;
            state.send_if_modified(|current| {
                if !current.is_authenticated && current.is_loading {
                    current.is_loading = false;
                    true
                } else {
                    false
                }
            });
            flag.store(false, Ordering::SeqCst);
        });
    }

    /// # Errors
    /// - `SessionExpired` when the stored token is missing or expired; the
    ///   session is cleared and `/login` is signalled.
    /// - Backend errors are passed through; `Network` is retryable and leaves
    ///   the session as it was.
    /// - `SessionExpired` as well when a logout ran while the backend call was
    ///   in flight; the answer is dropped instead of reviving the session.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> ClientResult<UserRecord> {
        let generation = self.generation();
        let token = match self.store.token().await? {
            Some(token) if !is_token_expired(&token) => token,
            _ => {
                self.logout().await;
                return Err(ClientError::SessionExpired);
            }
        };
        self.publish_loading();
        let result = match self.backend.update_profile(&token, update).await {
            Ok(_) if !self.is_current(generation) => Err(ClientError::SessionExpired),
            Ok(user) => self.store.persist_user(&user).await.map(|_| user),
            Err(err) => Err(err),
        };
        match result {
            Ok(user) if self.publish_if_current(generation, AuthState::signed_in(user.clone())) => {
                Ok(user)
            }
            Ok(_) => {
                self.discard_superseded().await;
                Err(ClientError::SessionExpired)
            }
            Err(err) => {
                self.finish_loading(generation);
                if matches!(err, ClientError::SessionExpired) && self.is_current(generation) {
                    self.logout().await;
                }
                Err(err)
            }
        }
    }

    /// Check the stored token; logs out when it has expired.
    ///
    /// Returns whether the session is still valid.
    pub async fn revalidate(&self) -> bool {
        let authenticated = self.state.borrow().is_authenticated;
        if !authenticated {
            return false;
        }
        let valid = match self.store.token().await {
            Ok(Some(token)) => !is_token_expired(&token),
            Ok(None) => false,
            Err(err) => {
                tracing::warn!(error = %err, "session storage unreadable during revalidation");
                false
            }
        };
        if !valid {
            tracing::info!("session token expired; logging out");
            self.logout().await;
        }
        valid
    }

    async fn handle_unauthorized(&self, path: &str) {
        let authenticated = self.state.borrow().is_authenticated;
        if authenticated {
            tracing::warn!(path, "backend rejected session; logging out");
            self.logout().await;
        }
    }

    /// Start the background tasks that live as long as the returned guard.
    pub fn mount(self: &Arc<Self>) -> MountedSession {
        let period = self.revalidate_interval;
        let manager = Arc::clone(self);
        let timer = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                manager.revalidate().await;
            }
        });
        let listener = self.unauthorized.as_ref().map(|events| {
            let mut rx = events.subscribe();
            let manager = Arc::clone(self);
            tokio::spawn(async move {
                loop {
                    match rx.recv().await {
                        Ok(SessionEvent::Unauthorized { path }) => {
                            manager.handle_unauthorized(&path).await;
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::debug!(skipped, "unauthorized events lagged");
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            })
        });
        MountedSession { timer, listener }
    }
}

/// Owns the session's background tasks; dropping it unmounts them.
pub struct MountedSession {
    timer: JoinHandle<()>,
    listener: Option<JoinHandle<()>>,
}

impl Drop for MountedSession {
    fn drop(&mut self) {
        self.timer.abort();
        if let Some(listener) = &self.listener {
            listener.abort();
        }
    }
}
