//! Registration, login and user administration (`/user/...`).

use hamro_core::models::{Credentials, TokenResponse, UserPublic, UserPublicPayload};
use hamro_core::validation::{validate_credentials, validate_phone, SignupForm};
use reqwest::Method;

use crate::error::ApiResult;
use crate::gateway::Gateway;

/// User account operations.
#[derive(Debug, Clone, Copy)]
pub struct AuthService<'a> {
    gateway: &'a Gateway,
}

impl<'a> AuthService<'a> {
    pub fn new(gateway: &'a Gateway) -> Self {
        Self { gateway }
    }

    /// Validate `form` and create the account. Does not log in.
    pub async fn register(&self, form: SignupForm) -> ApiResult<UserPublic> {
        let body = form.into_request()?;
        let request = self
            .gateway
            .public(Method::POST, &["user", "register", ""])?
            .json(&body);
        let user: UserPublic = self
            .gateway
            .fetch_model::<UserPublicPayload, _>(request, "Registration failed")
            .await?;
        tracing::info!(phone = %user.phone, "Account registered");
        Ok(user)
    }

    /// Exchange credentials for a token, then load the profile.
    ///
    /// The profile step is best-effort: if it fails the token is kept, the
    /// session has no profile, and the login still succeeds. A failed
    /// exchange or a failure to persist the session is recorded on the
    /// session and returned.
    pub async fn login(&self, credentials: &Credentials) -> ApiResult<()> {
        validate_credentials(credentials)?;
        let session = self.gateway.session();
        session.set_loading(true);

        let token = match self.exchange(credentials).await {
            Ok(token) => token,
            Err(e) => {
                session.auth_error(e.to_string());
                return Err(e);
            }
        };
        if let Err(e) = session.store_token(&token.access_token) {
            session.auth_error(e.to_string());
            return Err(e.into());
        }

        match self.verify().await {
            Ok(user) => {
                if let Err(e) = session.login_success(user, &token.access_token) {
                    session.auth_error(e.to_string());
                    return Err(e.into());
                }
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    phone = %credentials.phone,
                    "Profile fetch after login failed, continuing without profile"
                );
                session.set_loading(false);
            }
        }
        Ok(())
    }

    async fn exchange(&self, credentials: &Credentials) -> ApiResult<TokenResponse> {
        let request = self
            .gateway
            .public(Method::POST, &["user", "login", ""])?
            .json(credentials);
        self.gateway.fetch(request, "Login failed").await
    }

    /// Fetch the profile belonging to the stored token.
    pub async fn verify(&self) -> ApiResult<UserPublic> {
        let request = self.gateway.authenticated(Method::GET, &["user", "verify"])?;
        self.gateway
            .fetch_model::<UserPublicPayload, _>(request, "Verification failed")
            .await
    }

    /// Re-fetch the profile and replace the cached snapshot.
    pub async fn refresh_profile(&self) -> ApiResult<UserPublic> {
        let user = self.verify().await?;
        self.gateway.session().refresh_profile(user.clone())?;
        Ok(user)
    }

    /// Grant admin rights to the user with `phone`. Admin only.
    pub async fn set_admin(&self, phone: &str) -> ApiResult<UserPublic> {
        validate_phone(phone)?;
        let request = self
            .gateway
            .authenticated(Method::PUT, &["user", "admin"])?
            .query(&[("phone", phone.trim())]);
        let user: UserPublic = self
            .gateway
            .fetch_model::<UserPublicPayload, _>(request, "Failed to set admin")
            .await?;
        tracing::info!(phone = %user.phone, "Admin granted");
        Ok(user)
    }

    /// Every registered user. Admin only.
    pub async fn list_users(&self) -> ApiResult<Vec<UserPublic>> {
        let request = self.gateway.authenticated(Method::GET, &["user", "all"])?;
        self.gateway
            .fetch_models::<UserPublicPayload, _>(request, "Failed to fetch users")
            .await
    }
}
