use std::future::Future;
use std::sync::Arc;

use hamro_core::models::UserPublic;
use hamro_session::{FileStore, GuardDecision, RouteGuard, SessionStore};

use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult};
use crate::gateway::Gateway;
use crate::services::{
    AuthService, ExpenseService, IssueService, ProjectService, VerificationService,
};

/// Result of a guarded page load.
#[derive(Debug, Clone, PartialEq)]
pub enum GuardedLoad<T> {
    /// The guard allowed the page and the loader ran.
    Loaded(T),
    /// The guard denied the page; the loader was never called.
    Redirected {
        to: &'static str,
        notice: Option<&'static str>,
    },
}

/// Entry point bundling the gateway, the session and the route guard.
#[derive(Debug, Clone)]
pub struct HamroClient {
    gateway: Gateway,
    guard: RouteGuard,
}

impl HamroClient {
    pub fn new(gateway: Gateway) -> Self {
        Self {
            gateway,
            guard: RouteGuard::new(),
        }
    }

    pub fn with_guard(mut self, guard: RouteGuard) -> Self {
        self.guard = guard;
        self
    }

    /// Build the transport and restore the file-backed session described
    /// by `config`.
    pub fn from_config(config: &ClientConfig) -> ApiResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| ApiError::ClientSetup(e.to_string()))?;

        let storage = FileStore::new(&config.session_dir);
        tracing::info!(
            api_url = %config.api_url,
            session_file = %storage.path().display(),
            "Initializing client"
        );
        let session = SessionStore::initialize(Arc::new(storage))?;
        let gateway = Gateway::new(http, &config.api_url, Arc::new(session))?;
        Ok(Self::new(gateway))
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        self.gateway.session()
    }

    pub fn guard(&self) -> &RouteGuard {
        &self.guard
    }

    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(&self.gateway)
    }

    pub fn verification(&self) -> VerificationService<'_> {
        VerificationService::new(&self.gateway)
    }

    pub fn projects(&self) -> ProjectService<'_> {
        ProjectService::new(&self.gateway)
    }

    pub fn expenses(&self) -> ExpenseService<'_> {
        ExpenseService::new(&self.gateway)
    }

    pub fn issues(&self) -> IssueService<'_> {
        IssueService::new(&self.gateway)
    }

    pub async fn health_check(&self) -> bool {
        self.gateway.health_check().await
    }

    pub fn logout(&self) -> ApiResult<()> {
        Ok(self.session().logout()?)
    }

    pub fn current_user(&self) -> Option<UserPublic> {
        self.session().current_user()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session().is_authenticated()
    }

    pub fn is_admin(&self) -> bool {
        self.session().is_admin()
    }

    /// Evaluate the guard for `path` against the current session and run
    /// `loader` only if access is allowed.
    ///
    /// ```ignore
    /// let users = client
    ///     .guarded("/admin/users.html", |c| async move { c.auth().list_users().await })
    ///     .await?;
    /// ```
    pub async fn guarded<'a, T, F, Fut>(&'a self, path: &str, loader: F) -> ApiResult<GuardedLoad<T>>
    where
        F: FnOnce(&'a HamroClient) -> Fut,
        Fut: Future<Output = ApiResult<T>>,
    {
        match self.guard.evaluate(&self.session().state(), path) {
            GuardDecision::Allow => Ok(GuardedLoad::Loaded(loader(self).await?)),
            GuardDecision::Redirect { to, notice } => Ok(GuardedLoad::Redirected { to, notice }),
        }
    }
}
