//! Policy table snapshot commands
//!
//! These work on snapshot files directly and do not need a running daemon.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Subcommand;

use surge_core::context::{MAX_HOUR, MAX_TRAFFIC_LEVEL, MIN_TRAFFIC_LEVEL};
use surge_core::{SurgeTier, Weather};
use surge_rl::algorithm::{DEFAULT_DISCOUNT_FACTOR, DEFAULT_LEARNING_RATE};
use surge_rl::{load_policy, LoadFailurePolicy, PricingPolicy, PriceAction, QTablePolicy, SurgeState};

const DEFAULT_POLICY_PATH: &str = "models/surge_policy.json";

#[derive(Subcommand)]
pub enum PolicyCommands {
    /// Write a zero-initialized policy snapshot
    Init {
        /// Output path
        #[arg(short, long, default_value = DEFAULT_POLICY_PATH)]
        output: PathBuf,

        /// Overwrite an existing snapshot
        #[arg(short, long)]
        force: bool,

        /// Learning rate stored in the snapshot
        #[arg(long, default_value_t = DEFAULT_LEARNING_RATE)]
        learning_rate: f64,

        /// Discount factor stored in the snapshot
        #[arg(long, default_value_t = DEFAULT_DISCOUNT_FACTOR)]
        discount_factor: f64,
    },
    /// Summarize a policy snapshot
    Inspect {
        /// Snapshot path
        #[arg(short, long, default_value = DEFAULT_POLICY_PATH)]
        path: PathBuf,
    },
    /// Compute a surge multiplier from a snapshot
    Lookup {
        /// Snapshot path
        #[arg(short, long, default_value = DEFAULT_POLICY_PATH)]
        path: PathBuf,

        /// Hour of day (0-23)
        #[arg(long)]
        hour: u8,

        /// Traffic level (1-10)
        #[arg(long)]
        traffic: u8,

        /// Weather condition: clear, rain or storm
        #[arg(long, default_value = "clear")]
        weather: Weather,

        /// A big event is nearby
        #[arg(long)]
        event: bool,

        /// Use a zero table when the snapshot is missing or corrupt
        #[arg(long)]
        fallback: bool,
    },
}

pub async fn run(cmd: PolicyCommands) -> Result<()> {
    match cmd {
        PolicyCommands::Init {
            output,
            force,
            learning_rate,
            discount_factor,
        } => init(&output, force, learning_rate, discount_factor),
        PolicyCommands::Inspect { path } => inspect(&path),
        PolicyCommands::Lookup {
            path,
            hour,
            traffic,
            weather,
            event,
            fallback,
        } => lookup(&path, hour, traffic, weather, event, fallback),
    }
}

fn init(output: &Path, force: bool, learning_rate: f64, discount_factor: f64) -> Result<()> {
    if output.exists() && !force {
        println!("Policy snapshot already exists: {}", output.display());
        println!("Use --force to overwrite");
        return Ok(());
    }

    QTablePolicy::untrained(learning_rate, discount_factor)
        .save(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!("Policy snapshot created: {}", output.display());
    Ok(())
}

/// Aggregate view of a policy table
#[derive(Debug, Clone, PartialEq)]
pub struct PolicySummary {
    pub shape: Vec<usize>,
    pub learning_rate: f64,
    pub discount_factor: f64,
    pub nonzero_entries: usize,
    /// Number of states choosing each action, keyed by action index
    pub selected_actions: BTreeMap<usize, usize>,
}

impl PolicySummary {
    pub fn from_policy(policy: &QTablePolicy) -> Result<Self> {
        let mut selected_actions = BTreeMap::new();

        for hour in 0..=MAX_HOUR {
            for traffic in MIN_TRAFFIC_LEVEL..=MAX_TRAFFIC_LEVEL {
                for weather in Weather::ALL {
                    for event in 0..=1 {
                        let state = SurgeState::from_inputs(hour, traffic, weather.code(), event)?;
                        let action = policy.select_action(&state);
                        *selected_actions.entry(action.index()).or_insert(0) += 1;
                    }
                }
            }
        }

        Ok(Self {
            shape: policy.table().values().shape().to_vec(),
            learning_rate: policy.learning_rate(),
            discount_factor: policy.discount_factor(),
            nonzero_entries: policy.table().nonzero_count(),
            selected_actions,
        })
    }

    pub fn state_count(&self) -> usize {
        self.selected_actions.values().sum()
    }

    pub fn render(&self) -> String {
        let shape: Vec<String> = self.shape.iter().map(ToString::to_string).collect();
        let mut out = format!(
            "Shape:            ({})\nLearning rate:    {}\nDiscount factor:  {}\nNon-zero entries: {}\n",
            shape.join(", "),
            self.learning_rate,
            self.discount_factor,
            self.nonzero_entries
        );

        out.push_str(&format!("\nSelected actions over {} states:\n", self.state_count()));
        for (index, count) in &self.selected_actions {
            let multiplier = PriceAction::from_index(*index).map_or(0.0, PriceAction::multiplier);
            out.push_str(&format!(
                "  action {index} ({multiplier:.1}x, {}): {count}\n",
                SurgeTier::from_multiplier(multiplier)
            ));
        }

        if self.nonzero_entries == 0 {
            out.push_str("\nTable is untrained; every state prices at 1.0x\n");
        }
        out
    }
}

fn inspect(path: &Path) -> Result<()> {
    let policy = QTablePolicy::load(path)?;
    let summary = PolicySummary::from_policy(&policy)?;

    println!("Policy snapshot: {}\n", path.display());
    print!("{}", summary.render());
    Ok(())
}

fn lookup(
    path: &Path,
    hour: u8,
    traffic: u8,
    weather: Weather,
    event: bool,
    fallback: bool,
) -> Result<()> {
    let on_failure = if fallback {
        LoadFailurePolicy::Fallback
    } else {
        LoadFailurePolicy::Halt
    };

    let loaded = load_policy(path, on_failure, DEFAULT_LEARNING_RATE, DEFAULT_DISCOUNT_FACTOR)
        .map_err(|e| match e.remediation() {
            Some(hint) => anyhow::anyhow!("{e}\nHint: {hint}"),
            None => anyhow::Error::new(e),
        })?;

    if loaded.source.is_fallback() {
        println!("Warning: using a zero-initialized fallback table");
    }

    let multiplier = loaded
        .policy
        .multiplier_for(hour, traffic, weather.code(), u8::from(event))?;
    let tier = SurgeTier::from_multiplier(multiplier);

    println!("Surge multiplier: {multiplier:.2}x ({tier})");
    println!("{}", tier.message());
    Ok(())
}
