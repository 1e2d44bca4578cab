//! Navigation gating.
//!
//! Pages are classified by path into [`RouteKind`]s and sessions into
//! [`AccessLevel`]s; [`RouteGuard::evaluate`] maps the pair to a
//! [`GuardDecision`]. Admin pages check the cached profile, which is only as
//! fresh as the last verify call. The backend remains the real authority.

use std::sync::Arc;

use crate::store::{SessionState, SessionStore, Subscription};

/// Where unauthenticated visitors are sent.
pub const LOGIN_PATH: &str = "/auth/login.html";

/// Where authenticated non-admins are sent from admin pages.
pub const DASHBOARD_PATH: &str = "/dashboard.html";

/// Notice shown to a non-admin bounced from an admin page.
pub const ADMIN_REQUIRED_NOTICE: &str = "Admin access required";

/// What the current session is allowed to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessLevel {
    Unauthenticated,
    /// Token held but the profile is missing or not an admin.
    AuthenticatedNonAdmin,
    AuthenticatedAdmin,
}

impl AccessLevel {
    pub fn of(state: &SessionState) -> Self {
        if !state.is_authenticated() {
            AccessLevel::Unauthenticated
        } else if state.is_admin() {
            AccessLevel::AuthenticatedAdmin
        } else {
            AccessLevel::AuthenticatedNonAdmin
        }
    }
}

/// Access requirement of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    Public,
    Authenticated,
    Admin,
}

/// Outcome of evaluating a page against the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect {
        to: &'static str,
        notice: Option<&'static str>,
    },
}

impl GuardDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GuardDecision::Allow)
    }
}

/// Path classifier plus decision table.
///
/// Admin pages are recognised by path alone. Pages that merely need a
/// login are listed by prefix with [`with_authenticated_prefix`]
/// (none by default).
///
/// [`with_authenticated_prefix`]: RouteGuard::with_authenticated_prefix
#[derive(Debug, Clone, Default)]
pub struct RouteGuard {
    authenticated_prefixes: Vec<String>,
}

impl RouteGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require a login for every path starting with `prefix`.
    pub fn with_authenticated_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.authenticated_prefixes.push(prefix.into());
        self
    }

    pub fn classify(&self, path: &str) -> RouteKind {
        let path = path.split(['?', '#']).next().unwrap_or(path);
        if path.ends_with("/admin") || path.contains("/admin/") {
            RouteKind::Admin
        } else if self
            .authenticated_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
        {
            RouteKind::Authenticated
        } else {
            RouteKind::Public
        }
    }

    /// Decide whether the session in `state` may enter `path`.
    pub fn evaluate(&self, state: &SessionState, path: &str) -> GuardDecision {
        let kind = self.classify(path);
        let access = AccessLevel::of(state);
        let decision = decide(kind, access);

        if let GuardDecision::Redirect { to, .. } = &decision {
            tracing::warn!(path, redirect = to, access = ?access, "Route access denied");
        }
        decision
    }

    /// Evaluate `path` now and again after every session change, handing
    /// each decision to `on_decision`.
    pub fn watch<F>(&self, store: &SessionStore, path: &str, on_decision: F) -> Subscription
    where
        F: Fn(GuardDecision) + Send + Sync + 'static,
    {
        let guard = self.clone();
        let path: Arc<str> = Arc::from(path);
        store.subscribe(move |state| on_decision(guard.evaluate(state, &path)))
    }
}

fn decide(kind: RouteKind, access: AccessLevel) -> GuardDecision {
    match (kind, access) {
        (RouteKind::Admin | RouteKind::Authenticated, AccessLevel::Unauthenticated) => {
            GuardDecision::Redirect {
                to: LOGIN_PATH,
                notice: None,
            }
        }
        (RouteKind::Admin, AccessLevel::AuthenticatedNonAdmin) => GuardDecision::Redirect {
            to: DASHBOARD_PATH,
            notice: Some(ADMIN_REQUIRED_NOTICE),
        },
        _ => GuardDecision::Allow,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use hamro_core::models::UserPublic;

    use super::*;
    use crate::storage::MemoryStore;

    fn profile(admin: bool) -> UserPublic {
        UserPublic {
            id: "u-7".into(),
            name: None,
            phone: "9801234567".into(),
            admin,
            citizenship_num: None,
            district: None,
            city: None,
            ward_num: None,
        }
    }

    fn state(token: bool, user: Option<UserPublic>) -> SessionState {
        SessionState {
            token: token.then(|| "tok".to_string()),
            current_user: user,
            ..Default::default()
        }
    }

    fn to_login() -> GuardDecision {
        GuardDecision::Redirect {
            to: LOGIN_PATH,
            notice: None,
        }
    }

    fn to_dashboard() -> GuardDecision {
        GuardDecision::Redirect {
            to: DASHBOARD_PATH,
            notice: Some(ADMIN_REQUIRED_NOTICE),
        }
    }

    #[test]
    fn classifies_admin_paths() {
        let guard = RouteGuard::new();
        assert_eq!(guard.classify("/admin"), RouteKind::Admin);
        assert_eq!(guard.classify("/ward/admin"), RouteKind::Admin);
        assert_eq!(guard.classify("/admin/users.html"), RouteKind::Admin);
        assert_eq!(guard.classify("/admin?tab=pending"), RouteKind::Admin);
        assert_eq!(guard.classify("/administrator"), RouteKind::Public);
        assert_eq!(guard.classify("/projects/12"), RouteKind::Public);
    }

    #[test]
    fn admin_route_decisions() {
        let guard = RouteGuard::new();
        let path = "/admin/verifications.html";

        assert_eq!(guard.evaluate(&state(false, None), path), to_login());
        assert_eq!(
            guard.evaluate(&state(true, Some(profile(false))), path),
            to_dashboard()
        );
        assert_eq!(
            guard.evaluate(&state(true, Some(profile(true))), path),
            GuardDecision::Allow
        );
    }

    #[test]
    fn token_without_profile_is_not_admin() {
        let guard = RouteGuard::new();
        let state = state(true, None);
        assert_eq!(AccessLevel::of(&state), AccessLevel::AuthenticatedNonAdmin);
        assert_eq!(guard.evaluate(&state, "/admin"), to_dashboard());
    }

    #[test]
    fn profile_without_token_is_unauthenticated() {
        let state = state(false, Some(profile(true)));
        assert_eq!(AccessLevel::of(&state), AccessLevel::Unauthenticated);
        assert_eq!(RouteGuard::new().evaluate(&state, "/admin"), to_login());
    }

    #[test]
    fn public_routes_always_allowed() {
        let guard = RouteGuard::new();
        for state in [state(false, None), state(true, None), state(true, Some(profile(false)))] {
            assert!(guard.evaluate(&state, "/projects.html").is_allowed());
        }
    }

    #[test]
    fn authenticated_prefix_requires_login_only() {
        let guard = RouteGuard::new().with_authenticated_prefix("/dashboard");
        assert_eq!(guard.classify("/dashboard.html"), RouteKind::Authenticated);
        assert_eq!(guard.evaluate(&state(false, None), "/dashboard.html"), to_login());
        assert!(guard
            .evaluate(&state(true, None), "/dashboard.html")
            .is_allowed());
    }

    #[test]
    fn watch_reevaluates_on_session_change() {
        let store = SessionStore::initialize(Arc::new(MemoryStore::new())).unwrap();
        let decisions = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&decisions);
        let sub = RouteGuard::new().watch(&store, "/admin", move |d| sink.lock().unwrap().push(d));

        store.login_success(profile(true), "tok").unwrap();
        store.logout().unwrap();
        sub.unsubscribe();
        store.store_token("later").unwrap();

        assert_eq!(
            *decisions.lock().unwrap(),
            vec![to_login(), GuardDecision::Allow, to_login()]
        );
    }
}
