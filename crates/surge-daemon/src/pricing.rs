//! Pricing service - Combines the demand estimator, surge policy and fare model
//!
//! Both models are loaded once at startup and are read-only afterwards, so
//! the service is shared between request handlers behind an `Arc`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use surge_core::fare::round_cents;
use surge_core::{
    DemandEstimator, FareModel, FeatureLayout, LinearDemandModel, RideContext, SurgeError,
    SurgeTier,
};
use surge_rl::{load_policy, PolicySource, SurgeEngine};

use crate::config::{Config, PricingConfig};
use crate::metrics;

/// Result of pricing one ride request
#[derive(Debug, Clone, Serialize)]
pub struct Quote {
    pub quote_id: Uuid,
    pub predicted_demand: u64,
    pub surge_multiplier: f64,
    pub final_fare: f64,
    pub tier: SurgeTier,
    pub alert: String,
    pub action: usize,
    pub quoted_at: DateTime<Utc>,
}

/// Pricing service owning both models
pub struct PricingService {
    engine: SurgeEngine,
    demand: Arc<dyn DemandEstimator>,
    fare_model: FareModel,
    layout: FeatureLayout,
    compute_delay: Duration,
    policy_source: PolicySource,
    quotes_served: AtomicU64,
}

impl PricingService {
    /// Assemble a service from already constructed models
    pub fn new(
        engine: SurgeEngine,
        demand: Arc<dyn DemandEstimator>,
        pricing: &PricingConfig,
        policy_source: PolicySource,
    ) -> Result<Self, SurgeError> {
        let layout = pricing.feature_layout();
        if demand.feature_count() != layout.len() {
            return Err(SurgeError::Config(format!(
                "demand model '{}' expects {} features but the configured layout {:?} provides {}",
                demand.name(),
                demand.feature_count(),
                layout,
                layout.len()
            )));
        }

        metrics::POLICY_FALLBACK_ACTIVE.set(i64::from(policy_source.is_fallback()));

        Ok(Self {
            engine,
            demand,
            fare_model: pricing.fare_model(),
            layout,
            compute_delay: pricing.compute_delay(),
            policy_source,
            quotes_served: AtomicU64::new(0),
        })
    }

    /// Load both models from the paths in `config`.
    ///
    /// A missing or corrupt demand model is always an error; the policy table
    /// follows `models.on_policy_load_failure`.
    pub fn from_config(config: &Config) -> Result<Self, SurgeError> {
        let demand = LinearDemandModel::load(&config.models.demand_path)?;

        let loaded = load_policy(
            &config.models.policy_path,
            config.models.on_policy_load_failure,
            config.learning.learning_rate,
            config.learning.discount_factor,
        )?;

        if let PolicySource::Fallback { reason } = &loaded.source {
            warn!("Serving with an untrained policy table: {}", reason);
        }

        let service = Self::new(
            SurgeEngine::new(loaded.policy),
            Arc::new(demand),
            &config.pricing,
            loaded.source,
        )?;

        info!(
            "Pricing service ready: fare={:?}, features={:?}, policy={}",
            service.fare_model,
            service.layout,
            service.engine.policy_name()
        );

        Ok(service)
    }

    pub fn engine(&self) -> &SurgeEngine {
        &self.engine
    }

    pub fn fare_model(&self) -> FareModel {
        self.fare_model
    }

    pub fn feature_layout(&self) -> FeatureLayout {
        self.layout
    }

    pub fn policy_source(&self) -> &PolicySource {
        &self.policy_source
    }

    /// Number of successful quotes; policy lookups and failures are excluded
    pub fn quotes_served(&self) -> u64 {
        self.quotes_served.load(Ordering::Relaxed)
    }

    /// Price one ride request
    pub fn quote(&self, ctx: &RideContext) -> Result<Quote, SurgeError> {
        let started = Instant::now();
        let result = self.compute(ctx);

        match &result {
            Ok(quote) => {
                self.quotes_served.fetch_add(1, Ordering::Relaxed);
                metrics::record_quote(quote.tier, quote.predicted_demand, started.elapsed());
                debug!(
                    "Quote {}: demand={}, multiplier={}, fare={}",
                    quote.quote_id, quote.predicted_demand, quote.surge_multiplier, quote.final_fare
                );
            }
            Err(e) => {
                metrics::record_quote_failure(e.kind());
                warn!("Quote failed for {:?}: {}", ctx, e);
            }
        }

        result
    }

    /// Price one ride request after the configured cosmetic delay
    pub async fn quote_with_delay(&self, ctx: &RideContext) -> Result<Quote, SurgeError> {
        if !self.compute_delay.is_zero() {
            tokio::time::sleep(self.compute_delay).await;
        }
        self.quote(ctx)
    }

    fn compute(&self, ctx: &RideContext) -> Result<Quote, SurgeError> {
        let features = ctx.features(self.layout)?;
        let raw_demand = self.demand.predict(&features)?;

        let decision = self.engine.decide(ctx);
        let final_fare = self.fare_model.fare(ctx, decision.multiplier)?;
        let tier = SurgeTier::from_multiplier(decision.multiplier);

        Ok(Quote {
            quote_id: Uuid::new_v4(),
            predicted_demand: raw_demand.trunc().max(0.0) as u64,
            surge_multiplier: round_cents(decision.multiplier),
            final_fare,
            tier,
            alert: tier.message().to_string(),
            action: decision.action.index(),
            quoted_at: Utc::now(),
        })
    }
}
