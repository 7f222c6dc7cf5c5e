mod batch;
mod cli;
mod infra;
mod routes;
mod score;
mod server;

use churn_score::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
