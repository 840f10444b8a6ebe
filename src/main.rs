//! Calendar Sync — Binary Entrypoint
//! Boots the scrape orchestrator: one immediate run, then the recurring
//! timer until ctrl-c.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use econ_calendar_sync::config::AppConfig;
use econ_calendar_sync::fetch::CalendarFetcher;
use econ_calendar_sync::orchestrator::Orchestrator;
use econ_calendar_sync::upload::SupabaseClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();

    let cfg = AppConfig::load_default().context("loading configuration")?;

    let fetcher = Arc::new(
        CalendarFetcher::with_url(&cfg.calendar_url).context("building calendar fetcher")?,
    );
    let supabase = Arc::new(
        SupabaseClient::new(&cfg.supabase_url, cfg.supabase_anon_key.clone())
            .context("building supabase client")?,
    );

    if cfg.remote_refresh_enabled {
        let client = Arc::clone(&supabase);
        tokio::spawn(async move {
            if let Err(e) = client.trigger_refresh().await {
                tracing::warn!(error = %e, "remote refresh trigger failed");
            }
        });
    }

    let orchestrator = Orchestrator::new(fetcher, supabase, cfg.settings.clone());
    orchestrator.start();

    tracing::info!(
        interval_secs = cfg.settings.update_interval_secs,
        auto_update = cfg.settings.auto_update_enabled,
        upload = cfg.settings.upload_enabled,
        "calendar sync running, ctrl-c to stop"
    );
    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;
    orchestrator.stop();
    tracing::info!("shutting down");
    Ok(())
}
