// =============================================================================
// Central Application State — Chart Service
// =============================================================================
//
// Everything the HTTP handlers need, shared across tasks via `Arc<AppState>`.
//
// Thread safety:
//   - Atomic counters for lock-free request/cache statistics.
//   - parking_lot::RwLock around the configuration; guards are never held
//     across await points.
//   - The market-data client, cache, and limiter manage their own interior
//     state.
// =============================================================================

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use anyhow::Result;
use parking_lot::RwLock;

use crate::cache::FileCache;
use crate::config::AppConfig;
use crate::market_data::MarketDataClient;
use crate::rate_limit::ClientRateLimiter;

/// Central application state shared across all async tasks.
pub struct AppState {
    pub config: RwLock<AppConfig>,
    pub market_client: MarketDataClient,
    pub cache: FileCache,
    pub rate_limiter: ClientRateLimiter,

    /// Process start, for the health endpoint's uptime.
    pub started_at: Instant,

    // ── Counters ────────────────────────────────────────────────────────
    pub requests_served: AtomicU64,
    pub cache_hits: AtomicU64,
    pub cache_misses: AtomicU64,
}

impl AppState {
    /// Build the shared state from a loaded configuration.
    ///
    /// Fails when the cache directory cannot be created.
    pub fn new(config: AppConfig) -> Result<Self> {
        let market_client = MarketDataClient::new(&config.api);
        let cache = FileCache::new(
            &config.cache.directory,
            config.cache.enabled,
            config.cache.ttl_secs,
        )?;
        let rate_limiter = ClientRateLimiter::new(
            config.rate_limit.enabled,
            config.rate_limit.requests_per_minute,
            config.rate_limit.requests_per_hour,
        );

        Ok(Self {
            config: RwLock::new(config),
            market_client,
            cache,
            rate_limiter,
            started_at: Instant::now(),
            requests_served: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
        })
    }

    pub fn record_request(&self) {
        self.requests_served.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }
}
