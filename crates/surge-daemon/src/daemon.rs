//! Main Surge daemon implementation

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{DefaultBodyLimit, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::{
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;
use validator::Validate;

use surge_core::{RideContext, SurgeError, SurgeTier, Weather};
use surge_rl::PolicySource;

use crate::config::Config;
use crate::error::ApiError;
use crate::metrics;
use crate::pricing::{PricingService, Quote};
use crate::validation::{ValidatedJson, DEFAULT_BODY_LIMIT};

/// Shared daemon state for API handlers
#[derive(Clone)]
pub struct DaemonState {
    pub config: Config,
    pub pricing: Arc<PricingService>,
    pub started_at: DateTime<Utc>,
}

impl DaemonState {
    pub fn new(config: Config, pricing: PricingService) -> Self {
        Self {
            config,
            pricing: Arc::new(pricing),
            started_at: Utc::now(),
        }
    }
}

/// Main Surge daemon
pub struct SurgeDaemon {
    config: Config,
    state: DaemonState,
    shutdown: tokio::sync::broadcast::Sender<()>,
}

impl SurgeDaemon {
    /// Create a new daemon, loading both models.
    ///
    /// Fails when a model artifact cannot be used; the caller is expected to
    /// stop before serving.
    pub fn new(config: Config) -> Result<Self, SurgeError> {
        let (shutdown_tx, _) = tokio::sync::broadcast::channel(1);

        let pricing = PricingService::from_config(&config)?;
        let state = DaemonState::new(config.clone(), pricing);

        Ok(Self {
            config,
            state,
            shutdown: shutdown_tx,
        })
    }

    /// Run the daemon main loop
    pub async fn run(&self) -> Result<()> {
        // Subscribe before the first await so an early shutdown is not missed
        let mut shutdown_rx = self.shutdown.subscribe();

        let addr: std::net::SocketAddr = self
            .config
            .daemon
            .bind_address
            .parse()
            .with_context(|| format!("Invalid bind address '{}'", self.config.daemon.bind_address))?;
        let app = create_router(self.state.clone());
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {addr}"))?;

        info!("Surge daemon running on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await?;

        Ok(())
    }

    /// Serve until `signal` completes, then shut down gracefully.
    ///
    /// Returns early with the error when the server cannot start or stops on
    /// its own.
    pub async fn run_until(&self, signal: impl Future<Output = ()>) -> Result<()> {
        let server = self.run();
        tokio::pin!(server);

        tokio::select! {
            biased;
            result = &mut server => {
                result?;
                anyhow::bail!("HTTP server stopped unexpectedly")
            }
            () = signal => {
                self.shutdown();
                server.await
            }
        }
    }

    /// Graceful shutdown
    pub fn shutdown(&self) {
        info!("Shutting down daemon...");
        let _ = self.shutdown.send(());
    }
}

/// Create the API router with state
pub fn create_router(state: DaemonState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(get_metrics))
        .route("/api/v1/status", get(get_status))
        .route("/api/v1/quote", post(create_quote))
        .route("/api/v1/policy", get(get_policy))
        .route("/api/v1/policy/lookup", post(policy_lookup))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::max(DEFAULT_BODY_LIMIT)),
        )
        .with_state(state)
}

// API Request/Response types

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct QuoteRequest {
    #[validate(range(max = 23))]
    pub hour: u8,
    #[validate(range(min = 1, max = 10))]
    pub traffic_level: u8,
    pub weather: Weather,
    #[serde(default)]
    pub event_nearby: bool,
    #[validate(range(min = 0.5, max = 100.0))]
    #[serde(default)]
    pub distance_km: Option<f64>,
}

impl QuoteRequest {
    pub fn into_context(self) -> Result<RideContext, SurgeError> {
        RideContext::new(
            self.hour,
            self.traffic_level,
            self.weather,
            self.event_nearby,
            self.distance_km,
        )
    }
}

/// Raw model inputs.
///
/// Only the body shape is checked at extraction; ranges are enforced by
/// `SurgeState::from_inputs` and reported as 422 naming the field.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct LookupRequest {
    pub hour: u8,
    pub traffic_level: u8,
    pub weather_code: u8,
    pub event_flag: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct LookupResponse {
    pub multiplier: f64,
    pub action: usize,
    pub tier: SurgeTier,
}

// API handlers

async fn health_check() -> &'static str {
    "OK"
}

async fn get_metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics::gather(),
    )
}

fn policy_source_label(source: &PolicySource) -> &'static str {
    match source {
        PolicySource::Persisted(_) => "persisted",
        PolicySource::Fallback { .. } => "fallback",
    }
}

async fn get_status(State(state): State<DaemonState>) -> Json<serde_json::Value> {
    let pricing = &state.pricing;
    let uptime = (Utc::now() - state.started_at).num_seconds();

    Json(serde_json::json!({
        "status": "running",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_seconds": uptime,
        "policy": pricing.engine().policy_name(),
        "policy_source": policy_source_label(pricing.policy_source()),
        "fare_model": pricing.fare_model(),
        "feature_layout": pricing.feature_layout(),
        "quotes_served": pricing.quotes_served(),
        "policy_lookups": pricing.engine().stats().total_lookups
    }))
}

async fn create_quote(
    State(state): State<DaemonState>,
    ValidatedJson(request): ValidatedJson<QuoteRequest>,
) -> Result<Json<Quote>, ApiError> {
    let ctx = request.into_context()?;
    let quote = state.pricing.quote_with_delay(&ctx).await?;
    Ok(Json(quote))
}

async fn get_policy(State(state): State<DaemonState>) -> Json<serde_json::Value> {
    let pricing = &state.pricing;
    let source = pricing.policy_source();

    let fallback_reason = match source {
        PolicySource::Fallback { reason } => Some(reason.clone()),
        PolicySource::Persisted(_) => None,
    };

    Json(serde_json::json!({
        "params": pricing.engine().params(),
        "stats": pricing.engine().stats(),
        "source": policy_source_label(source),
        "fallback_reason": fallback_reason
    }))
}

async fn policy_lookup(
    State(state): State<DaemonState>,
    ValidatedJson(request): ValidatedJson<LookupRequest>,
) -> Result<Json<LookupResponse>, ApiError> {
    let decision = state.pricing.engine().multiplier_for(
        request.hour,
        request.traffic_level,
        request.weather_code,
        request.event_flag,
    )?;

    Ok(Json(LookupResponse {
        multiplier: decision.multiplier,
        action: decision.action.index(),
        tier: SurgeTier::from_multiplier(decision.multiplier),
    }))
}
