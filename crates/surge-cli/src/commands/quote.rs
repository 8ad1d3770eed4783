//! Fare quote command

use anyhow::{Context, Result};
use clap::Args;
use serde::Deserialize;
use tracing::debug;

use surge_core::{RideContext, Weather};

use super::http::{self, ApiErrorBody};

#[derive(Args)]
pub struct QuoteArgs {
    /// Hour of day (0-23)
    #[arg(long, default_value_t = 12)]
    pub hour: u8,

    /// Traffic level (1-10)
    #[arg(long, default_value_t = 5)]
    pub traffic: u8,

    /// Weather condition: clear, rain or storm
    #[arg(long, default_value = "clear")]
    pub weather: Weather,

    /// A big event is nearby
    #[arg(long)]
    pub event: bool,

    /// Trip distance in km (0.5-100); needed by the distance fare model
    #[arg(long)]
    pub distance: Option<f64>,
}

/// The part of a daemon quote shown to the user
#[derive(Debug, Clone, Deserialize)]
pub struct QuoteView {
    pub predicted_demand: u64,
    pub surge_multiplier: f64,
    pub final_fare: f64,
    pub tier: String,
    pub alert: String,
}

pub async fn run(args: QuoteArgs) -> Result<()> {
    // Catch range errors before the round trip
    let ctx = RideContext::new(
        args.hour,
        args.traffic,
        args.weather,
        args.event,
        args.distance,
    )?;

    let url = http::api_url("/api/v1/quote");
    debug!("POST {} {:?}", url, ctx);

    let resp = http::post_json(&url, &ctx)
        .await
        .with_context(|| format!("Failed to reach the daemon at {}", http::daemon_url()))?;

    let status = resp.status();
    let text = resp.text().await?;

    if !status.is_success() {
        anyhow::bail!("{}", ApiErrorBody::parse(&text).render());
    }

    let quote: QuoteView = serde_json::from_str(&text).context("Unexpected quote response")?;
    println!("{}", render_quote(&quote));
    Ok(())
}

/// Format the three quote metrics and the surge alert
pub fn render_quote(quote: &QuoteView) -> String {
    let marker = match quote.tier.as_str() {
        "high" => "[!]",
        "moderate" => "[~]",
        _ => "[ok]",
    };

    format!(
        "Predicted demand:  {}\nSurge multiplier:  {:.2}x\nFinal fare:        ${:.2}\n\n{} {}",
        quote.predicted_demand, quote.surge_multiplier, quote.final_fare, marker, quote.alert
    )
}
