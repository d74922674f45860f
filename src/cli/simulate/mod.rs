//! Simulate command - replays workflow states through the predictor

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;
use tracing::info;

use crate::domain::state::{StatePrediction, WorkflowState};
use crate::infrastructure::services::PerformanceMetrics;

/// Arguments for the simulate command
#[derive(Args, Clone)]
pub struct SimulateArgs {
    /// JSON file with a list of workflow states, oldest first
    #[arg(long)]
    pub input: PathBuf,

    /// Number of predictions to request (overrides config)
    #[arg(long)]
    pub max_predictions: Option<usize>,

    /// Load the stored snapshot before replaying
    #[arg(long)]
    pub resume: bool,

    /// Save a snapshot through the configured storage after replaying
    #[arg(long)]
    pub persist: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulationReport {
    observed: usize,
    from: Option<WorkflowState>,
    predictions: Vec<StatePrediction>,
    performance: PerformanceMetrics,
    persisted: bool,
}

/// Run the simulation
pub async fn run(args: SimulateArgs) -> anyhow::Result<()> {
    let config = super::bootstrap()?;
    let states: Vec<WorkflowState> = super::read_json(&args.input)?;

    let engine = crate::create_engine_with_config(&config).await?;
    let predictor = engine.predictor();

    if args.resume && predictor.load_persisted_state().await? {
        info!("Resumed from stored snapshot");
    }

    for state in &states {
        engine.observe_state(state.clone()).await;
    }
    info!(observed = states.len(), "Replayed workflow states");

    let max = args.max_predictions.unwrap_or(config.predictor.max_predictions);
    let from = states.last().cloned();
    let predictions = match &from {
        Some(state) => predictor.predict_next_states(state, max).await,
        None => Vec::new(),
    };

    if args.persist {
        predictor.persist_state().await?;
    }

    let report = SimulationReport {
        observed: states.len(),
        from,
        predictions,
        performance: predictor.get_performance_metrics().await,
        persisted: args.persist,
    };
    super::print_json(&report)
}
