use std::sync::Arc;

use anyhow::Context;

use billjobs_api::app::{self, services::AppServices};
use billjobs_api::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("invalid configuration")?;
    billjobs_observability::init(config.log_format);

    let services = Arc::new(AppServices::in_memory(&config));
    if let Some(admin) = &config.admin {
        let user = services
            .seed_admin(admin)
            .context("failed to create the configured admin user")?;
        tracing::info!(user_id = %user.id, "admin account created from environment");
    } else {
        tracing::warn!("no admin configured; the user store starts empty");
    }

    let app = app::build_app(services);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
