//! CLI module for the workflow predictor
//!
//! Provides offline subcommands:
//! - `simulate`: replay recorded workflow states and print predictions
//! - `calibrate`: fit confidence calibration to recorded outcomes

pub mod calibrate;
pub mod simulate;

use std::path::Path;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;

use crate::config::AppConfig;
use crate::infrastructure::logging::{init_logging, LoggingConfig};

/// Workflow predictor - learns workflow habits and predicts next steps
#[derive(Parser)]
#[command(name = "workflow-predictor")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Replay workflow states and print predictions for the last one
    Simulate(simulate::SimulateArgs),

    /// Fit Platt scaling to calibration points and report diagnostics
    Calibrate(calibrate::CalibrateArgs),
}

/// Load `.env`, layered configuration and logging
fn bootstrap() -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().unwrap_or_default();
    config.validate()?;
    init_logging(&LoggingConfig::from(&config));

    Ok(config)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
