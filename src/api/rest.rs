// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// Two endpoints under `/api/v1/`:
//   - GET /chart-data  — the chart payload (throttled, cached)
//   - GET /health      — liveness and counters
//
// Request flow for chart-data: throttle check → cache lookup → upstream fetch
// → indicator pipeline → formatter → best-effort cache store → response.
//
// CORS comes from the security config (`*` means any origin); responses are
// gzip-compressed when the client accepts it.
// =============================================================================

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, State},
    http::{HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{info, warn};

use crate::app_state::AppState;
use crate::cache::FileCache;
use crate::formatter::build_chart_payload;
use crate::indicators::pipeline::calculate_bundle;
use crate::market_data::{close_prices, day_labels};
use crate::rate_limit::client_id;

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS and compression middleware.
pub fn router(state: Arc<AppState>) -> Router {
    let (cors_enabled, allowed_origins) = {
        let cfg = state.config.read();
        (
            cfg.security.cors_enabled,
            cfg.security.allowed_origins.clone(),
        )
    };

    let mut app = Router::new()
        .route("/api/v1/chart-data", get(chart_data))
        .route("/api/v1/health", get(health))
        .with_state(state);

    app = app.layer(CompressionLayer::new());

    if cors_enabled {
        app = app.layer(build_cors(&allowed_origins));
    }

    app
}

fn build_cors(allowed_origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods([Method::GET, Method::OPTIONS]);

    if allowed_origins.iter().any(|o| o == "*") {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(AllowOrigin::list(origins))
    }
}

// =============================================================================
// Chart data
// =============================================================================

async fn chart_data(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Response {
    state.record_request();

    // Snapshot everything needed from the config before any await: the lock
    // guard must not live across suspension points.
    let (api, indicators, salt, debug) = {
        let cfg = state.config.read();
        (
            cfg.api.clone(),
            cfg.indicators.clone(),
            cfg.security.client_salt.clone(),
            cfg.debug,
        )
    };

    // ── Throttle ─────────────────────────────────────────────────────────
    let client = client_id(&resolve_client_ip(&headers, addr), &salt);
    let now = chrono::Utc::now().timestamp();

    if !state.rate_limiter.is_allowed(&client, now) {
        let remaining = state.rate_limiter.remaining(&client, now);
        warn!(client = %&client[..8], "request throttled");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({
                "error": "Rate limit exceeded",
                "remaining": remaining,
            })),
        )
            .into_response();
    }
    state.rate_limiter.record_request(&client, now);

    // ── Cache lookup ─────────────────────────────────────────────────────
    let key = FileCache::market_data_key(
        &api.default_symbol,
        &api.default_interval,
        api.default_limit,
    );

    if let Some(cached) = state.cache.get(&key) {
        state.record_cache_hit();
        return Json(cached).into_response();
    }
    state.record_cache_miss();

    // ── Fetch ────────────────────────────────────────────────────────────
    let candles = match state
        .market_client
        .get_klines(&api.default_symbol, &api.default_interval, api.default_limit)
        .await
    {
        Ok(candles) => candles,
        Err(e) => {
            warn!(error = %e, "upstream fetch failed");
            return error_response(StatusCode::BAD_GATEWAY, "Upstream fetch failed", &e, debug);
        }
    };

    // ── Compute ──────────────────────────────────────────────────────────
    let closes = close_prices(&candles);
    let labels = day_labels(&candles);

    let bundle = match calculate_bundle(&closes, &indicators) {
        Ok(bundle) => bundle,
        Err(e) => {
            warn!(error = %e, candles = candles.len(), "indicator pipeline failed");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Indicator computation failed",
                &anyhow::Error::new(e),
                debug,
            );
        }
    };

    let payload = {
        let cfg = state.config.read();
        build_chart_payload(labels, &bundle, &cfg)
    };

    let value = match serde_json::to_value(&payload) {
        Ok(value) => value,
        Err(e) => {
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Serialization failed",
                &anyhow::Error::new(e),
                debug,
            );
        }
    };

    // Cache write failures never fail the request.
    if let Err(e) = state.cache.set(&key, &value, None) {
        warn!(error = %e, "cache store failed");
    }

    info!(
        symbol = %api.default_symbol,
        interval = %api.default_interval,
        points = payload.labels.len(),
        "chart data served"
    );

    Json(value).into_response()
}

/// Resolve the client IP: X-Forwarded-For (first entry), then X-Real-IP,
/// then the socket peer address.
fn resolve_client_ip(headers: &HeaderMap, addr: SocketAddr) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip").and_then(|v| v.to_str().ok()) {
        if !real_ip.is_empty() {
            return real_ip.to_string();
        }
    }

    addr.ip().to_string()
}

fn error_response(
    status: StatusCode,
    error: &str,
    source: &anyhow::Error,
    debug: bool,
) -> Response {
    let body = if debug {
        json!({ "error": error, "message": format!("{source:#}") })
    } else {
        json!({ "error": error })
    };
    (status, Json(body)).into_response()
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    server_time: i64,
    uptime_secs: u64,
    symbol: String,
    interval: String,
    requests_served: u64,
    cache_hits: u64,
    cache_misses: u64,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    use std::sync::atomic::Ordering;

    let (symbol, interval) = {
        let cfg = state.config.read();
        (
            cfg.api.default_symbol.clone(),
            cfg.api.default_interval.clone(),
        )
    };

    Json(HealthResponse {
        status: "ok",
        server_time: chrono::Utc::now().timestamp_millis(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        symbol,
        interval,
        requests_served: state.requests_served.load(Ordering::Relaxed),
        cache_hits: state.cache_hits.load(Ordering::Relaxed),
        cache_misses: state.cache_misses.load(Ordering::Relaxed),
    })
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_state() -> Arc<AppState> {
        // Cache and limiter disabled so no filesystem or window state is
        // touched by router tests.
        let mut cfg = AppConfig::default();
        cfg.cache.enabled = false;
        cfg.rate_limit.enabled = false;
        Arc::new(AppState::new(cfg).unwrap())
    }

    #[tokio::test]
    async fn health_endpoint_responds_ok() {
        let app = router(test_state());
        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let app = router(test_state());
        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/nope")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn client_ip_prefers_forwarded_for() {
        let addr: SocketAddr = "127.0.0.1:9999".parse().unwrap();

        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());
        headers.insert("x-real-ip", "198.51.100.2".parse().unwrap());
        assert_eq!(resolve_client_ip(&headers, addr), "203.0.113.7");

        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", "198.51.100.2".parse().unwrap());
        assert_eq!(resolve_client_ip(&headers, addr), "198.51.100.2");

        let headers = HeaderMap::new();
        assert_eq!(resolve_client_ip(&headers, addr), "127.0.0.1");
    }
}
