//! Session store: authentication state, persistence and change broadcast.
//!
//! [`SessionStore`] is constructed explicitly at application start and
//! shared via `Arc<SessionStore>`. Observers registered with
//! [`subscribe`](SessionStore::subscribe) are called synchronously, in
//! registration order, once immediately and then once per state change.
//! A change made while observers are being notified is queued and
//! delivered after the current round.
//! Async consumers can await changes through [`watch`](SessionStore::watch).

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use hamro_core::models::{Project, UserPublic, UserPublicPayload};
use tokio::sync::watch;

use crate::storage::{KeyValueStore, StorageError};

/// Storage key holding the opaque bearer token.
pub const AUTH_TOKEN_KEY: &str = "auth_token";

/// Storage key holding the JSON profile snapshot.
pub const CURRENT_USER_KEY: &str = "current_user";

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Snapshot of the session as observers see it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub token: Option<String>,
    pub current_user: Option<UserPublic>,
    pub is_loading: bool,
    /// Last human-readable auth error, cleared on login/logout.
    pub error: Option<String>,
}

impl SessionState {
    /// A credential is held. The profile may still be missing if the
    /// post-login verify step failed.
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Token and profile are both present.
    pub fn is_fully_authenticated(&self) -> bool {
        self.token.is_some() && self.current_user.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.token.is_some() && self.current_user.as_ref().is_some_and(|u| u.admin)
    }

    /// The cached profile carries a verified citizenship number.
    pub fn is_verified(&self) -> bool {
        self.current_user.as_ref().is_some_and(UserPublic::is_verified)
    }

    /// The current user is the contractor assigned to `project`.
    pub fn is_contractor_for(&self, project: &Project) -> bool {
        self.current_user
            .as_ref()
            .is_some_and(|u| project.is_contractor(&u.phone))
    }
}

// ---------------------------------------------------------------------------
// SessionPatch
// ---------------------------------------------------------------------------

/// Partial update merged into [`SessionState`] by
/// [`SessionStore::set_state`]. Only fields that were set change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionPatch {
    token: Option<Option<String>>,
    current_user: Option<Option<UserPublic>>,
    is_loading: Option<bool>,
    error: Option<Option<String>>,
}

impl SessionPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token(mut self, token: Option<String>) -> Self {
        self.token = Some(token);
        self
    }

    pub fn current_user(mut self, user: Option<UserPublic>) -> Self {
        self.current_user = Some(user);
        self
    }

    pub fn loading(mut self, is_loading: bool) -> Self {
        self.is_loading = Some(is_loading);
        self
    }

    pub fn error(mut self, error: Option<String>) -> Self {
        self.error = Some(error);
        self
    }

    fn apply(self, state: &mut SessionState) {
        if let Some(token) = self.token {
            state.token = token;
        }
        if let Some(user) = self.current_user {
            state.current_user = user;
        }
        if let Some(is_loading) = self.is_loading {
            state.is_loading = is_loading;
        }
        if let Some(error) = self.error {
            state.error = error;
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from persisting or restoring the session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Session serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// SessionStore
// ---------------------------------------------------------------------------

type Observer = Arc<dyn Fn(&SessionState) + Send + Sync>;

struct Entry {
    id: u64,
    observer: Observer,
    /// State version current when the observer registered. Only later
    /// merges are broadcast to it.
    since: u64,
}

/// One queued notification.
struct Delivery {
    version: u64,
    snapshot: SessionState,
    /// `Some(id)` for the first call of a fresh subscription.
    target: Option<u64>,
}

struct Registry {
    state: SessionState,
    /// Bumped on every merge.
    version: u64,
    observers: Vec<Entry>,
    next_id: u64,
    /// Notifications in merge order, not yet delivered.
    pending: VecDeque<Delivery>,
    /// A caller is currently draining `pending`.
    dispatching: bool,
}

impl Registry {
    fn lock(registry: &Mutex<Registry>) -> std::sync::MutexGuard<'_, Registry> {
        registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claim the dispatcher role. Returns `false` if another call already
    /// holds it; that call drains everything queued before it finishes.
    fn claim_dispatch(&mut self) -> bool {
        !std::mem::replace(&mut self.dispatching, true)
    }

    /// Observers that should receive `delivery`, in registration order.
    fn recipients(&self, delivery: &Delivery) -> Vec<Observer> {
        self.observers
            .iter()
            .filter(|entry| match delivery.target {
                Some(id) => entry.id == id,
                None => entry.since < delivery.version,
            })
            .map(|entry| Arc::clone(&entry.observer))
            .collect()
    }
}

/// Releases the dispatcher role if an observer panics mid-delivery.
struct DispatchGuard<'a>(&'a Mutex<Registry>);

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            Registry::lock(self.0).dispatching = false;
        }
    }
}

/// Single source of truth for the authentication token and profile.
pub struct SessionStore {
    storage: Arc<dyn KeyValueStore>,
    registry: Arc<Mutex<Registry>>,
    signal: watch::Sender<SessionState>,
}

impl SessionStore {
    /// Restore the session persisted in `storage`.
    ///
    /// Missing keys yield an anonymous session. A profile snapshot that no
    /// longer parses is discarded with a warning rather than failing startup.
    pub fn initialize(storage: Arc<dyn KeyValueStore>) -> Result<Self, SessionError> {
        let token = storage
            .get(AUTH_TOKEN_KEY)?
            .filter(|token| !token.is_empty());
        let current_user = match storage.get(CURRENT_USER_KEY)? {
            Some(raw) => decode_profile(&raw),
            None => None,
        };

        let state = SessionState {
            token,
            current_user,
            is_loading: false,
            error: None,
        };

        tracing::info!(
            authenticated = state.is_authenticated(),
            has_profile = state.current_user.is_some(),
            "Session restored from storage"
        );

        let (signal, _) = watch::channel(state.clone());
        Ok(Self {
            storage,
            registry: Arc::new(Mutex::new(Registry {
                state,
                version: 0,
                observers: Vec::new(),
                next_id: 0,
                pending: VecDeque::new(),
                dispatching: false,
            })),
            signal,
        })
    }

    /// Register `observer`, call it with the current state, and again after
    /// every subsequent change.
    ///
    /// The first call happens before `subscribe` returns unless a
    /// notification round is already running on another call, in which
    /// case that round delivers it. The returned handle removes the
    /// observer via [`Subscription::unsubscribe`]; dropping it keeps the
    /// observer alive.
    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&SessionState) + Send + Sync + 'static,
    {
        let (id, dispatch) = {
            let mut registry = Registry::lock(&self.registry);
            let id = registry.next_id;
            registry.next_id += 1;
            let version = registry.version;
            registry.observers.push(Entry {
                id,
                observer: Arc::new(observer),
                since: version,
            });
            let snapshot = registry.state.clone();
            registry.pending.push_back(Delivery {
                version,
                snapshot,
                target: Some(id),
            });
            (id, registry.claim_dispatch())
        };

        if dispatch {
            self.dispatch();
        }

        Subscription {
            registry: Arc::downgrade(&self.registry),
            id,
        }
    }

    /// Async view of the same state. The receiver starts at the current
    /// value and observes every change.
    pub fn watch(&self) -> watch::Receiver<SessionState> {
        self.signal.subscribe()
    }

    /// Merge `patch` into the state and notify every observer once, in
    /// registration order, with the merged snapshot.
    ///
    /// The async signal is updated under the same lock as the merge, so it
    /// never lags behind [`state`](Self::state). Observers run without the
    /// lock and may read or update the store from inside the callback.
    /// Notifications are delivered in merge order; one raised while
    /// another is being delivered is queued behind it.
    pub fn set_state(&self, patch: SessionPatch) {
        let dispatch = {
            let mut registry = Registry::lock(&self.registry);
            patch.apply(&mut registry.state);
            registry.version += 1;
            let snapshot = registry.state.clone();
            self.signal.send_replace(snapshot.clone());
            let version = registry.version;
            registry.pending.push_back(Delivery {
                version,
                snapshot,
                target: None,
            });
            registry.claim_dispatch()
        };

        if dispatch {
            self.dispatch();
        }
    }

    /// Drain the notification queue. Only the caller that claimed the
    /// dispatcher role runs this.
    fn dispatch(&self) {
        let _guard = DispatchGuard(&self.registry);
        loop {
            let (delivery, observers) = {
                let mut registry = Registry::lock(&self.registry);
                let Some(delivery) = registry.pending.pop_front() else {
                    registry.dispatching = false;
                    return;
                };
                let observers = registry.recipients(&delivery);
                (delivery, observers)
            };
            for observer in observers {
                observer(&delivery.snapshot);
            }
        }
    }

    /// Persist a freshly issued token before the profile is known.
    ///
    /// Any previously cached profile is dropped so it can never be paired
    /// with a credential it does not belong to.
    pub fn store_token(&self, token: &str) -> Result<(), SessionError> {
        self.storage.set(AUTH_TOKEN_KEY, token)?;
        self.storage.remove(CURRENT_USER_KEY)?;
        self.set_state(
            SessionPatch::new()
                .token(Some(token.to_string()))
                .current_user(None)
                .error(None),
        );
        tracing::info!("Session token stored");
        Ok(())
    }

    /// Persist token and profile and mark the session authenticated.
    pub fn login_success(&self, user: UserPublic, token: &str) -> Result<(), SessionError> {
        let snapshot = serde_json::to_string(&user)?;
        self.storage.set(AUTH_TOKEN_KEY, token)?;
        self.storage.set(CURRENT_USER_KEY, &snapshot)?;

        tracing::info!(phone = %user.phone, admin = user.admin, "Login succeeded");
        self.set_state(
            SessionPatch::new()
                .token(Some(token.to_string()))
                .current_user(Some(user))
                .loading(false)
                .error(None),
        );
        Ok(())
    }

    /// Replace the cached profile wholesale, keeping the token.
    pub fn refresh_profile(&self, user: UserPublic) -> Result<(), SessionError> {
        let snapshot = serde_json::to_string(&user)?;
        self.storage.set(CURRENT_USER_KEY, &snapshot)?;
        self.set_state(SessionPatch::new().current_user(Some(user)));
        Ok(())
    }

    /// Purge persisted credentials and return to the anonymous state.
    ///
    /// The in-memory state is cleared even if storage fails; the first
    /// storage error is still reported.
    pub fn logout(&self) -> Result<(), SessionError> {
        let token_removed = self.storage.remove(AUTH_TOKEN_KEY);
        let user_removed = self.storage.remove(CURRENT_USER_KEY);

        self.set_state(
            SessionPatch::new()
                .token(None)
                .current_user(None)
                .loading(false)
                .error(None),
        );
        tracing::info!("Logged out");

        token_removed?;
        user_removed?;
        Ok(())
    }

    /// Record a displayable error. Token and profile are left as they were.
    pub fn auth_error(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(error = %message, "Authentication error");
        self.set_state(SessionPatch::new().loading(false).error(Some(message)));
    }

    pub fn set_loading(&self, is_loading: bool) {
        self.set_state(SessionPatch::new().loading(is_loading));
    }

    pub fn state(&self) -> SessionState {
        Registry::lock(&self.registry).state.clone()
    }

    pub fn token(&self) -> Option<String> {
        Registry::lock(&self.registry).state.token.clone()
    }

    pub fn current_user(&self) -> Option<UserPublic> {
        Registry::lock(&self.registry).state.current_user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        Registry::lock(&self.registry).state.is_authenticated()
    }

    pub fn is_admin(&self) -> bool {
        Registry::lock(&self.registry).state.is_admin()
    }

    /// Number of registered observers.
    pub fn observer_count(&self) -> usize {
        Registry::lock(&self.registry).observers.len()
    }
}

fn decode_profile(raw: &str) -> Option<UserPublic> {
    let payload: UserPublicPayload = match serde_json::from_str(raw) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(error = %e, "Discarding unreadable profile snapshot");
            return None;
        }
    };
    match UserPublic::try_from(payload) {
        Ok(user) => Some(user),
        Err(e) => {
            tracing::warn!(error = %e, "Discarding invalid profile snapshot");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Subscription
// ---------------------------------------------------------------------------

/// Handle returned by [`SessionStore::subscribe`].
#[derive(Debug)]
pub struct Subscription {
    registry: Weak<Mutex<Registry>>,
    id: u64,
}

impl Subscription {
    /// Stop notifying this observer. Calling it twice is harmless.
    pub fn unsubscribe(&self) {
        if let Some(registry) = self.registry.upgrade() {
            Registry::lock(&registry)
                .observers
                .retain(|entry| entry.id != self.id);
        }
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("state", &self.state)
            .field("version", &self.version)
            .field("observers", &self.observers.len())
            .field("pending", &self.pending.len())
            .field("dispatching", &self.dispatching)
            .finish()
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use assert_matches::assert_matches;

    use super::*;
    use crate::storage::MemoryStore;

    fn user(admin: bool) -> UserPublic {
        UserPublic {
            id: "u-1".into(),
            name: Some("Ram Thapa".into()),
            phone: "9812345678".into(),
            admin,
            citizenship_num: None,
            district: None,
            city: None,
            ward_num: Some(4),
        }
    }

    fn store(mem: &MemoryStore) -> SessionStore {
        SessionStore::initialize(Arc::new(mem.clone())).unwrap()
    }

    /// Records `(observer label, snapshot)` pairs in call order.
    fn recorder() -> Arc<Mutex<Vec<(&'static str, SessionState)>>> {
        Arc::new(Mutex::new(Vec::new()))
    }

    #[test]
    fn empty_storage_is_anonymous() {
        let session = store(&MemoryStore::new());
        assert_eq!(session.state(), SessionState::default());
        assert!(!session.is_authenticated());
    }

    #[test]
    fn subscribe_calls_back_immediately() {
        let session = store(&MemoryStore::new());
        let calls = recorder();
        let sink = Arc::clone(&calls);
        let _sub = session.subscribe(move |s| sink.lock().unwrap().push(("a", s.clone())));

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, SessionState::default());
    }

    #[test]
    fn observers_notified_in_registration_order_once_per_change() {
        let session = store(&MemoryStore::new());
        let calls = recorder();
        for label in ["first", "second", "third"] {
            let sink = Arc::clone(&calls);
            let _ = session.subscribe(move |s| sink.lock().unwrap().push((label, s.clone())));
        }
        calls.lock().unwrap().clear();

        session.set_state(SessionPatch::new().loading(true));
        session.set_state(SessionPatch::new().error(Some("boom".into())));

        let calls = calls.lock().unwrap();
        let labels: Vec<_> = calls.iter().map(|(l, _)| *l).collect();
        assert_eq!(
            labels,
            ["first", "second", "third", "first", "second", "third"]
        );

        let merged = SessionState {
            is_loading: true,
            error: Some("boom".into()),
            ..Default::default()
        };
        for (_, snapshot) in &calls[3..] {
            assert_eq!(snapshot, &merged);
        }
    }

    #[test]
    fn unsubscribed_observer_is_not_called() {
        let session = store(&MemoryStore::new());
        let calls = recorder();
        let sink = Arc::clone(&calls);
        let sub = session.subscribe(move |s| sink.lock().unwrap().push(("a", s.clone())));

        sub.unsubscribe();
        sub.unsubscribe();
        session.set_loading(true);

        assert_eq!(calls.lock().unwrap().len(), 1);
        assert_eq!(session.observer_count(), 0);
    }

    #[test]
    fn dropping_subscription_keeps_observer() {
        let session = store(&MemoryStore::new());
        drop(session.subscribe(|_| {}));
        assert_eq!(session.observer_count(), 1);
    }

    #[test]
    fn observer_may_read_store_during_notification() {
        let session = Arc::new(store(&MemoryStore::new()));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (reader, sink) = (Arc::clone(&session), Arc::clone(&seen));
        let _sub = session.subscribe(move |_| sink.lock().unwrap().push(reader.state().is_loading));

        session.set_loading(true);
        assert_eq!(*seen.lock().unwrap(), vec![false, true]);
    }

    #[test]
    fn login_survives_reload() {
        let mem = MemoryStore::new();
        store(&mem).login_success(user(false), "tok-1").unwrap();

        let reloaded = store(&mem);
        let state = reloaded.state();
        assert_eq!(state.token.as_deref(), Some("tok-1"));
        assert_eq!(state.current_user, Some(user(false)));
        assert!(state.is_fully_authenticated());
        assert!(state.error.is_none());
    }

    #[test]
    fn logout_clears_both_keys() {
        let mem = MemoryStore::new();
        let session = store(&mem);
        session.login_success(user(true), "tok-1").unwrap();
        session.logout().unwrap();

        assert!(!mem.contains(AUTH_TOKEN_KEY));
        assert!(!mem.contains(CURRENT_USER_KEY));
        assert_eq!(store(&mem).state(), SessionState::default());
        assert_eq!(session.state(), SessionState::default());
    }

    #[test]
    fn auth_error_keeps_credentials() {
        let session = store(&MemoryStore::new());
        session.login_success(user(false), "tok-1").unwrap();
        session.set_loading(true);
        session.auth_error("Incorrect credentials");

        let state = session.state();
        assert_eq!(state.token.as_deref(), Some("tok-1"));
        assert!(state.current_user.is_some());
        assert!(!state.is_loading);
        assert_eq!(state.error.as_deref(), Some("Incorrect credentials"));
    }

    #[test]
    fn store_token_drops_stale_profile() {
        let mem = MemoryStore::new();
        let session = store(&mem);
        session.login_success(user(true), "old").unwrap();
        session.store_token("new").unwrap();

        assert_eq!(session.token().as_deref(), Some("new"));
        assert!(session.current_user().is_none());
        assert!(!session.is_admin());

        let reloaded = store(&mem).state();
        assert_eq!(reloaded.token.as_deref(), Some("new"));
        assert!(reloaded.current_user.is_none());
    }

    #[test]
    fn corrupt_profile_snapshot_is_discarded() {
        let mem = MemoryStore::new();
        mem.set(AUTH_TOKEN_KEY, "tok").unwrap();
        mem.set(CURRENT_USER_KEY, "{not json").unwrap();
        let state = store(&mem).state();
        assert_eq!(state.token.as_deref(), Some("tok"));
        assert!(state.current_user.is_none());

        mem.set(CURRENT_USER_KEY, r#"{"name":"no id"}"#).unwrap();
        assert!(store(&mem).current_user().is_none());
    }

    #[test]
    fn last_write_wins_on_overlapping_fields() {
        let session = store(&MemoryStore::new());
        session.set_state(SessionPatch::new().error(Some("first".into())).loading(true));
        session.set_state(SessionPatch::new().error(Some("second".into())));
        let state = session.state();
        assert_eq!(state.error.as_deref(), Some("second"));
        assert!(state.is_loading);
    }

    #[test]
    fn storage_failure_surfaces_from_initialize() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(crate::storage::SESSION_FILE_NAME), "garbage").unwrap();
        let result = SessionStore::initialize(Arc::new(crate::FileStore::new(dir.path())));
        assert_matches!(result, Err(SessionError::Storage(StorageError::Corrupt { .. })));
    }

    #[test]
    fn observer_may_update_store_during_notification() {
        let session = Arc::new(store(&MemoryStore::new()));
        let calls = recorder();
        let writer = Arc::clone(&session);
        let _clear = session.subscribe(move |s| {
            if s.error.is_some() {
                writer.set_state(SessionPatch::new().error(None).loading(false));
            }
        });
        let sink = Arc::clone(&calls);
        let _log = session.subscribe(move |s| sink.lock().unwrap().push(("log", s.clone())));

        session.set_state(SessionPatch::new().error(Some("boom".into())).loading(true));

        assert_eq!(session.state(), SessionState::default());
        let calls = calls.lock().unwrap();
        let errors: Vec<_> = calls.iter().map(|(_, s)| s.error.as_deref()).collect();
        assert_eq!(errors, [None, Some("boom"), None]);
    }

    #[test]
    fn concurrent_updates_notify_once_each_and_end_on_merged_state() {
        for _ in 0..50 {
            let session = Arc::new(store(&MemoryStore::new()));
            let rx = session.watch();
            let seen = Arc::new(Mutex::new(Vec::new()));
            let sink = Arc::clone(&seen);
            let _sub = session.subscribe(move |s| sink.lock().unwrap().push(s.clone()));

            let writers: Vec<_> = (0..8)
                .map(|t| {
                    let session = Arc::clone(&session);
                    std::thread::spawn(move || {
                        for i in 0..20 {
                            session.set_state(SessionPatch::new().error(Some(format!("{t}-{i}"))));
                        }
                    })
                })
                .collect();
            for writer in writers {
                writer.join().unwrap();
            }

            let state = session.state();
            assert_eq!(*rx.borrow(), state);
            let seen = seen.lock().unwrap();
            assert_eq!(seen.len(), 1 + 8 * 20);
            assert_eq!(seen.last(), Some(&state));
        }
    }

    #[tokio::test]
    async fn watch_receivers_see_changes() {
        let session = store(&MemoryStore::new());
        let mut rx = session.watch();
        assert!(!rx.borrow().is_authenticated());

        session.login_success(user(false), "tok").unwrap();
        rx.changed().await.expect("sender alive");
        assert_eq!(rx.borrow().token.as_deref(), Some("tok"));
    }
}
