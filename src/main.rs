// =============================================================================
// Prism Charts — Main Entry Point
// =============================================================================
//
// A small HTTP service that fetches daily candles, computes EMA / StochRSI /
// MACD over the closes, and serves a Chart.js-ready payload with a file cache
// and per-client throttling in front.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod api;
mod app_state;
mod cache;
mod config;
mod formatter;
mod indicators;
mod market_data;
mod rate_limit;
mod types;

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::config::AppConfig;

/// Interval between background sweeps of the cache and limiter.
const SWEEP_INTERVAL_SECS: u64 = 600;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║          Prism Charts — Starting Up                      ║");
    info!("╚══════════════════════════════════════════════════════════╝");

    let config_path = "config.json";
    let mut config = AppConfig::load(config_path).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        let config = AppConfig::default();
        // Write a template so there is something to edit next time.
        if let Err(e) = config.save(config_path) {
            warn!(error = %e, "Failed to write default config template");
        }
        config
    });

    // Override the symbol from env if available.
    if let Ok(symbol) = std::env::var("PRISM_SYMBOL") {
        let symbol = symbol.trim().to_uppercase();
        if !symbol.is_empty() {
            config.api.default_symbol = symbol;
        }
    }

    info!(
        symbol = %config.api.default_symbol,
        interval = %config.api.default_interval,
        limit = config.api.default_limit,
        cache_enabled = config.cache.enabled,
        rate_limit_enabled = config.rate_limit.enabled,
        "Configured"
    );

    // ── 2. Build shared state ────────────────────────────────────────────
    let state = Arc::new(AppState::new(config)?);

    // ── 3. Background sweeper (cache expiry + idle limiter clients) ──────
    let sweep_state = state.clone();
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(tokio::time::Duration::from_secs(SWEEP_INTERVAL_SECS));
        interval.tick().await; // first tick fires immediately; skip it
        loop {
            interval.tick().await;
            let cleaned = sweep_state.cache.clean_expired();
            let dropped = sweep_state
                .rate_limiter
                .cleanup(chrono::Utc::now().timestamp());
            info!(cleaned, dropped, "background sweep complete");
        }
    });

    // ── 4. Start the API server ──────────────────────────────────────────
    let bind_addr = std::env::var("PRISM_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3001".into());

    let app = api::rest::router(state.clone());
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(addr = %bind_addr, "API server listening");

    let server = tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("API server failed");
    });

    info!("All subsystems running. Press Ctrl+C to stop.");

    // ── 5. Graceful shutdown ─────────────────────────────────────────────
    tokio::signal::ctrl_c().await?;
    warn!("Shutdown signal received — stopping gracefully");
    server.abort();

    info!("Prism Charts shut down complete.");
    Ok(())
}
