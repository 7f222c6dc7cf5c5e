use crate::cli::SourceArgs;
use crate::infra::{build_scoring_service, parse_uuid};
use churn_score::config::AppConfig;
use churn_score::error::AppError;
use churn_score::scoring::{ScoreResult, TOP_N};
use clap::Args;
use uuid::Uuid;

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// User identifier (UUID)
    #[arg(long, value_parser = parse_uuid)]
    pub(crate) user: Uuid,
    /// Product identifier
    #[arg(long)]
    pub(crate) product: String,
    /// Print only the score and tier
    #[arg(long)]
    pub(crate) simple: bool,
    /// Print a readable summary instead of JSON
    #[arg(long)]
    pub(crate) pretty: bool,
    #[command(flatten)]
    pub(crate) sources: SourceArgs,
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;
    args.sources.clone().apply(&mut config);

    let service = build_scoring_service(&config.model, &config.scoring)?;
    let result = service.score_blocking(args.user, &args.product)?;

    if args.pretty {
        println!("{}", render_summary(&result));
    } else if args.simple {
        println!("{}", render_json(&result.simple()));
    } else {
        println!("{}", render_json(&result));
    }

    Ok(())
}

fn render_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|err| format!("{{\"error\":\"{err}\"}}"))
}

pub(crate) fn render_summary(result: &ScoreResult) -> String {
    let mut lines = vec![
        format!("Request {}", result.request_id),
        format!(
            "Model {} scored {:.4} -> {} risk",
            result.model_version,
            result.score,
            result.risk_level.label()
        ),
    ];

    if result.top_factors.is_empty() {
        lines.push("Top factors: none".to_string());
    } else {
        lines.push(format!("Top factors (up to {TOP_N})"));
        for factor in &result.top_factors {
            lines.push(format!("- {}: {:+.4}", factor.name, factor.contribution));
        }
    }

    match &result.recommendation {
        Some(recommendation) => lines.push(format!(
            "Recommendation: {} ({})",
            recommendation.action.label(),
            recommendation.reason
        )),
        None => lines.push("Recommendation: disabled".to_string()),
    }

    lines.join("\n")
}
