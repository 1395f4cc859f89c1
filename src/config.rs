// =============================================================================
// Application Configuration — JSON-backed settings with atomic save
// =============================================================================
//
// Central configuration hub for the chart service.  Every tunable parameter
// lives here and is passed explicitly into the components that need it; there
// is no process-wide mutable configuration state.
//
// Persistence uses an atomic tmp + rename pattern to prevent corruption on
// crash.  All fields carry `#[serde(default)]` so that adding new fields
// never breaks loading an older config file.
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_true() -> bool {
    true
}

fn default_binance_base_url() -> String {
    "https://api.binance.com/api/v3".to_string()
}

fn default_symbol() -> String {
    "ETHUSDT".to_string()
}

fn default_interval() -> String {
    "1d".to_string()
}

fn default_limit() -> u32 {
    500
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    "prism-charts/1.0".to_string()
}

fn default_ema_fast_period() -> usize {
    25
}

fn default_ema_slow_period() -> usize {
    100
}

fn default_rsi_period() -> usize {
    14
}

fn default_k_period() -> usize {
    3
}

fn default_d_period() -> usize {
    3
}

fn default_macd_fast_period() -> usize {
    12
}

fn default_macd_slow_period() -> usize {
    26
}

fn default_macd_signal_period() -> usize {
    9
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_cache_directory() -> String {
    "cache".to_string()
}

fn default_requests_per_minute() -> u32 {
    60
}

fn default_requests_per_hour() -> u32 {
    1000
}

fn default_allowed_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_client_salt() -> String {
    // Non-secret default; override in production via the config file.
    "prism_default_salt".to_string()
}

// =============================================================================
// ApiConfig
// =============================================================================

/// Upstream market-data API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_binance_base_url")]
    pub binance_base_url: String,

    #[serde(default = "default_symbol")]
    pub default_symbol: String,

    #[serde(default = "default_interval")]
    pub default_interval: String,

    /// Number of candles to request (one chart page worth).
    #[serde(default = "default_limit")]
    pub default_limit: u32,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            binance_base_url: default_binance_base_url(),
            default_symbol: default_symbol(),
            default_interval: default_interval(),
            default_limit: default_limit(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

// =============================================================================
// IndicatorsConfig
// =============================================================================

/// Periods for the two display EMAs (fast/slow overlay lines).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmaConfig {
    #[serde(default = "default_ema_fast_period")]
    pub fast_period: usize,

    #[serde(default = "default_ema_slow_period")]
    pub slow_period: usize,
}

impl Default for EmaConfig {
    fn default() -> Self {
        Self {
            fast_period: default_ema_fast_period(),
            slow_period: default_ema_slow_period(),
        }
    }
}

/// Periods for the Stochastic RSI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StochRsiConfig {
    #[serde(default = "default_rsi_period")]
    pub rsi_period: usize,

    #[serde(default = "default_k_period")]
    pub k_period: usize,

    /// Accepted for interface completeness; no %D smoothing is applied.
    #[serde(default = "default_d_period")]
    pub d_period: usize,
}

impl Default for StochRsiConfig {
    fn default() -> Self {
        Self {
            rsi_period: default_rsi_period(),
            k_period: default_k_period(),
            d_period: default_d_period(),
        }
    }
}

/// Periods for the MACD family.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MacdConfig {
    #[serde(default = "default_macd_fast_period")]
    pub fast_period: usize,

    #[serde(default = "default_macd_slow_period")]
    pub slow_period: usize,

    #[serde(default = "default_macd_signal_period")]
    pub signal_period: usize,
}

impl Default for MacdConfig {
    fn default() -> Self {
        Self {
            fast_period: default_macd_fast_period(),
            slow_period: default_macd_slow_period(),
            signal_period: default_macd_signal_period(),
        }
    }
}

/// All indicator periods, passed as one unit into the pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndicatorsConfig {
    #[serde(default)]
    pub ema: EmaConfig,

    #[serde(default)]
    pub stoch_rsi: StochRsiConfig,

    #[serde(default)]
    pub macd: MacdConfig,
}

// =============================================================================
// CacheConfig / RateLimitConfig / SecurityConfig
// =============================================================================

/// File-cache settings for computed chart payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Payload time-to-live in seconds.
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,

    #[serde(default = "default_cache_directory")]
    pub directory: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: default_cache_ttl_secs(),
            directory: default_cache_directory(),
        }
    }
}

/// Per-client request throttling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: u32,

    #[serde(default = "default_requests_per_hour")]
    pub requests_per_hour: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_minute: default_requests_per_minute(),
            requests_per_hour: default_requests_per_hour(),
        }
    }
}

/// CORS and client-identity settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// `["*"]` allows any origin; list specific domains in production.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,

    /// Salt mixed into the client-IP hash used for rate limiting.
    #[serde(default = "default_client_salt")]
    pub client_salt: String,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            cors_enabled: true,
            allowed_origins: default_allowed_origins(),
            client_salt: default_client_salt(),
        }
    }
}

// =============================================================================
// ChartConfig
// =============================================================================

/// Border colors for each dataset, keyed by series name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartColors {
    #[serde(default = "ChartColors::default_close")]
    pub close: String,
    #[serde(default = "ChartColors::default_ema_fast")]
    pub ema_fast: String,
    #[serde(default = "ChartColors::default_ema_slow")]
    pub ema_slow: String,
    #[serde(default = "ChartColors::default_stoch_rsi")]
    pub stoch_rsi: String,
    #[serde(default = "ChartColors::default_macd")]
    pub macd: String,
    #[serde(default = "ChartColors::default_signal")]
    pub signal: String,
    #[serde(default = "ChartColors::default_histogram")]
    pub histogram: String,
}

impl ChartColors {
    fn default_close() -> String {
        "#000000".to_string()
    }
    fn default_ema_fast() -> String {
        "#0066CC".to_string()
    }
    fn default_ema_slow() -> String {
        "#CC0000".to_string()
    }
    fn default_stoch_rsi() -> String {
        "#00CC00".to_string()
    }
    fn default_macd() -> String {
        "#9900CC".to_string()
    }
    fn default_signal() -> String {
        "#FF6600".to_string()
    }
    fn default_histogram() -> String {
        "#FFCC00".to_string()
    }
}

impl Default for ChartColors {
    fn default() -> Self {
        Self {
            close: Self::default_close(),
            ema_fast: Self::default_ema_fast(),
            ema_slow: Self::default_ema_slow(),
            stoch_rsi: Self::default_stoch_rsi(),
            macd: Self::default_macd(),
            signal: Self::default_signal(),
            histogram: Self::default_histogram(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChartConfig {
    #[serde(default)]
    pub colors: ChartColors,
}

// =============================================================================
// AppConfig
// =============================================================================

/// Top-level configuration for the chart service.
///
/// Every field has a serde default so that older JSON files missing new fields
/// will still deserialise correctly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub indicators: IndicatorsConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    #[serde(default)]
    pub security: SecurityConfig,

    #[serde(default)]
    pub chart: ChartConfig,

    /// When set, error responses carry the full error chain.
    #[serde(default)]
    pub debug: bool,
}

impl AppConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config from {}", path.display()))?;

        info!(
            path = %path.display(),
            symbol = %config.api.default_symbol,
            interval = %config.api.default_interval,
            "config loaded"
        );

        Ok(config)
    }

    /// Persist the current configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    ///
    /// This prevents corruption if the process crashes mid-write.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content =
            serde_json::to_string_pretty(self).context("failed to serialise config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "config saved (atomic)");
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.api.default_symbol, "ETHUSDT");
        assert_eq!(cfg.api.default_interval, "1d");
        assert_eq!(cfg.api.default_limit, 500);
        assert_eq!(cfg.indicators.ema.fast_period, 25);
        assert_eq!(cfg.indicators.ema.slow_period, 100);
        assert_eq!(cfg.indicators.stoch_rsi.rsi_period, 14);
        assert_eq!(cfg.indicators.stoch_rsi.k_period, 3);
        assert_eq!(cfg.indicators.stoch_rsi.d_period, 3);
        assert_eq!(cfg.indicators.macd.fast_period, 12);
        assert_eq!(cfg.indicators.macd.slow_period, 26);
        assert_eq!(cfg.indicators.macd.signal_period, 9);
        assert!(cfg.cache.enabled);
        assert_eq!(cfg.cache.ttl_secs, 300);
        assert_eq!(cfg.rate_limit.requests_per_minute, 60);
        assert_eq!(cfg.rate_limit.requests_per_hour, 1000);
        assert_eq!(cfg.security.allowed_origins, vec!["*"]);
        assert_eq!(cfg.chart.colors.close, "#000000");
        assert_eq!(cfg.chart.colors.histogram, "#FFCC00");
        assert!(!cfg.debug);
    }

    #[test]
    fn deserialise_empty_json_uses_defaults() {
        let cfg: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.api.default_symbol, "ETHUSDT");
        assert_eq!(cfg.indicators.ema.fast_period, 25);
        assert!(cfg.cache.enabled);
        assert!(cfg.rate_limit.enabled);
    }

    #[test]
    fn deserialise_partial_json_fills_defaults() {
        let json = r#"{
            "api": { "default_symbol": "BTCUSDT" },
            "indicators": { "ema": { "fast_period": 10 } }
        }"#;
        let cfg: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.api.default_symbol, "BTCUSDT");
        assert_eq!(cfg.api.default_interval, "1d");
        assert_eq!(cfg.indicators.ema.fast_period, 10);
        assert_eq!(cfg.indicators.ema.slow_period, 100);
        assert_eq!(cfg.indicators.macd.signal_period, 9);
    }

    #[test]
    fn roundtrip_serialisation() {
        let cfg = AppConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let cfg2: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg.api.default_symbol, cfg2.api.default_symbol);
        assert_eq!(cfg.indicators.ema.slow_period, cfg2.indicators.ema.slow_period);
        assert_eq!(cfg.cache.ttl_secs, cfg2.cache.ttl_secs);
    }

    #[test]
    fn save_and_load_file_roundtrip() {
        let dir = std::env::temp_dir().join(format!("prism-config-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");

        let mut cfg = AppConfig::default();
        cfg.api.default_symbol = "SOLUSDT".to_string();
        cfg.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded.api.default_symbol, "SOLUSDT");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn load_missing_file_is_an_error() {
        assert!(AppConfig::load("/nonexistent/prism/config.json").is_err());
    }
}
