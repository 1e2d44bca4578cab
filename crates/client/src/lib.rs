//! Hamro Ward API client.
//!
//! [`HamroClient`] ties together the HTTP [`Gateway`], the shared
//! [`SessionStore`](hamro_session::SessionStore) and the
//! [`RouteGuard`](hamro_session::RouteGuard). Resource operations live on
//! per-router services reached through the facade:
//!
//! ```ignore
//! let client = HamroClient::from_config(&ClientConfig::from_env()?)?;
//! client.auth().login(&Credentials::new("9812345678", "hamro!ward")).await?;
//! let projects = client.projects().list().await?;
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod gateway;
pub mod services;

pub use client::{GuardedLoad, HamroClient};
pub use config::{ClientConfig, ConfigError};
pub use error::{ApiError, ApiResult, ErrorKind};
pub use gateway::Gateway;
