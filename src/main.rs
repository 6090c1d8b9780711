use anyhow::{Context, Result};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

extern crate pretty_env_logger;
#[macro_use] extern crate log;

use crate::charts::PlottersRenderer;
use crate::config::EnvConfig;
use crate::models::AppConfig;
use crate::options::ChartOptions;

mod alerts;
mod azure;
mod charts;
mod config;
mod error;
mod models;
mod options;
mod web;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    pretty_env_logger::init();

    let cancel_token = CancellationToken::new();
    let main_cancel_token = cancel_token.clone();

    info!("🚀 Starting Azure alerts dashboard.");

    let env = EnvConfig::load()
        .and_then(EnvConfig::validate)
        .context("Error checking env variables.")?;

    let chart_options = ChartOptions::load(&env.options)
        .context("Error load options.json.")?;

    let az_client = Arc::new(azure::init(
        env.az_cli.clone(),
        env.login_mode.clone(),
        env.login_timeout_s,
        env.query_timeout_s,
    ));

    let app_config = Arc::new(AppConfig {
        auth: az_client.clone(),
        query: az_client,
        renderer: Arc::new(PlottersRenderer::new(chart_options)),
        templates: web::templates::init().context("Error registering templates.")?,
        page_size: alerts::PAGE_SIZE,
    });

    tokio::spawn(async move {
        // Wait Ctrl+C or SIGTERM Docker/OS
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for ctrl+c: {}", e);
        }
        info!("Received shutdown signal");
        main_cancel_token.cancel();
    });

    let listener = tokio::net::TcpListener::bind(env.bind_addr)
        .await
        .with_context(|| format!("Error binding {}", env.bind_addr))?;

    info!("✅ Listening on http://{}", env.bind_addr);

    axum::serve(listener, web::router(app_config))
        .with_graceful_shutdown(async move { cancel_token.cancelled().await })
        .await
        .context("Server error.")?;

    info!("Graceful Shutdown...");
    Ok(())
}
