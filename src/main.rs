use clap::Parser;
use workflow_predictor::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Simulate(args) => cli::simulate::run(args).await,
        Command::Calibrate(args) => cli::calibrate::run(args).await,
    }
}
