use crate::batch::{run_batch, BatchArgs};
use crate::score::{run_score, ScoreArgs};
use crate::server;
use churn_score::error::AppError;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Churn Scoring Service",
    about = "Score subscriptions for churn risk over HTTP or from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Score a single user/product pair and print the detailed result
    Score(ScoreArgs),
    /// Score every user/product pair in a CSV file
    Batch(BatchArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    #[command(flatten)]
    pub(crate) sources: SourceArgs,
}

/// Overrides shared by every command that loads the model.
#[derive(Args, Debug, Default, Clone)]
pub(crate) struct SourceArgs {
    /// Override the configured ONNX model path
    #[arg(long)]
    pub(crate) model: Option<PathBuf>,
    /// Override the configured SQLite feature store
    #[arg(long)]
    pub(crate) feature_store: Option<PathBuf>,
    /// Skip the recommendation stage
    #[arg(long)]
    pub(crate) no_recommendations: bool,
}

impl SourceArgs {
    pub(crate) fn apply(self, config: &mut churn_score::config::AppConfig) {
        if let Some(model) = self.model {
            config.model.path = model;
        }
        if let Some(store) = self.feature_store {
            config.scoring.feature_store_path = Some(store);
        }
        if self.no_recommendations {
            config.scoring.recommendations = false;
        }
    }
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Score(args) => run_score(args),
        Command::Batch(args) => run_batch(args),
    }
}
