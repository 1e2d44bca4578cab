//! Manual smoke test against a running backend.
//!
//! ```text
//! HAMRO_PHONE=9812345678 HAMRO_PASSWORD=... cargo run -p hamro-client --example ward_session
//! ```
//!
//! Without credentials the program only lists public projects.

use anyhow::Context;
use hamro_client::{ClientConfig, GuardedLoad, HamroClient};
use hamro_core::models::Credentials;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hamro_client=debug,hamro_session=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ClientConfig::from_env().context("invalid client configuration")?;
    tracing::info!(api_url = %config.api_url, session_dir = %config.session_dir.display(), "Loaded client configuration");

    let client = HamroClient::from_config(&config)?;
    if !client.health_check().await {
        anyhow::bail!("backend at {} is unreachable", config.api_url);
    }

    // --- Session observer ---
    let _observer = client.session().subscribe(|state| {
        tracing::info!(
            authenticated = state.is_authenticated(),
            admin = state.is_admin(),
            loading = state.is_loading,
            error = ?state.error,
            "Session changed"
        );
    });

    // --- Login ---
    if let (Ok(phone), Ok(password)) = (std::env::var("HAMRO_PHONE"), std::env::var("HAMRO_PASSWORD")) {
        client.auth().login(&Credentials::new(phone, password)).await?;
        match client.current_user() {
            Some(user) => tracing::info!(phone = %user.phone, verified = user.is_verified(), "Logged in"),
            None => tracing::warn!("Logged in without a profile"),
        }
    }

    // --- Public data ---
    let projects = client.projects().list().await?;
    for project in &projects {
        tracing::info!(
            id = %project.id,
            title = %project.title,
            status = %project.status,
            funding_pct = project.funding_progress(),
            "Project"
        );
    }

    // --- Admin data ---
    match client
        .guarded("/admin/users.html", |c| async move { c.auth().list_users().await })
        .await?
    {
        GuardedLoad::Loaded(users) => tracing::info!(count = users.len(), "Registered users"),
        GuardedLoad::Redirected { to, notice } => {
            tracing::info!(to, notice = ?notice, "Admin page not available")
        }
    }

    Ok(())
}
