use crate::cli::SourceArgs;
use crate::infra::build_scoring_service;
use churn_score::config::AppConfig;
use churn_score::error::AppError;
use churn_score::scoring::{FeatureStore, InferenceEngine, ScoringService};
use clap::Args;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use tracing::warn;
use uuid::Uuid;

#[derive(Args, Debug)]
pub(crate) struct BatchArgs {
    /// CSV file with `user_id,prod_id` columns
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Destination CSV (defaults to stdout)
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
    #[command(flatten)]
    pub(crate) sources: SourceArgs,
}

#[derive(Debug, Deserialize)]
struct BatchRow {
    user_id: String,
    prod_id: String,
}

#[derive(Debug, Serialize)]
struct BatchRecord {
    request_id: Uuid,
    user_id: Uuid,
    prod_id: String,
    score: f64,
    risk_level: &'static str,
    top_factor: Option<&'static str>,
    action: Option<&'static str>,
}

/// Counts reported after a batch run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BatchSummary {
    pub(crate) scored: usize,
    pub(crate) skipped: usize,
}

pub(crate) fn run_batch(args: BatchArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;
    args.sources.clone().apply(&mut config);

    let service = build_scoring_service(&config.model, &config.scoring)?;
    let input = File::open(&args.input)?;

    let summary = match &args.output {
        Some(path) => score_batch(&service, input, File::create(path)?)?,
        None => score_batch(&service, input, io::stdout().lock())?,
    };

    eprintln!(
        "Scored {} pair(s), skipped {} malformed row(s)",
        summary.scored, summary.skipped
    );
    Ok(())
}

/// Scores every row of `input`. Malformed rows are skipped; a scoring failure
/// aborts the run.
pub(crate) fn score_batch<S, E, R, W>(
    service: &ScoringService<S, E>,
    input: R,
    output: W,
) -> Result<BatchSummary, AppError>
where
    S: FeatureStore + 'static,
    E: InferenceEngine + 'static,
    R: Read,
    W: Write,
{
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(input);
    let mut writer = csv::Writer::from_writer(output);
    let mut summary = BatchSummary::default();

    for (line, row) in reader.deserialize::<BatchRow>().enumerate() {
        let row = match row {
            Ok(row) => row,
            Err(err) => {
                warn!(line = line + 2, error = %err, "skipping unreadable row");
                summary.skipped += 1;
                continue;
            }
        };

        let user_id = match Uuid::parse_str(&row.user_id) {
            Ok(id) if !row.prod_id.is_empty() => id,
            _ => {
                warn!(line = line + 2, user_id = %row.user_id, "skipping malformed pair");
                summary.skipped += 1;
                continue;
            }
        };

        let result = service.score_blocking(user_id, &row.prod_id)?;
        writer.serialize(BatchRecord {
            request_id: result.request_id,
            user_id,
            prod_id: row.prod_id,
            score: result.score,
            risk_level: result.risk_level.label(),
            top_factor: result.top_factors.first().map(|factor| factor.name.as_str()),
            action: result
                .recommendation
                .as_ref()
                .map(|recommendation| recommendation.action.label()),
        })?;
        summary.scored += 1;
    }

    writer.flush()?;
    Ok(summary)
}
