use std::sync::Arc;

use rake_planner::{
    config::AppConfig,
    db::Db,
    jobs::{JobRunner, SqlxJobRepository},
    logger::init_tracing,
    metrics::Counters,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    sqlx::any::install_default_drivers();

    let is_production = std::env::var("APP_ENV").unwrap_or_default() == "production";
    init_tracing(is_production);

    tracing::info!("starting rake planner");

    let cfg = AppConfig::from_env();

    let db = Db::connect(&cfg.database_url).await?;
    db.migrate().await?;

    let repo: Arc<dyn rake_planner::jobs::JobRepository> = Arc::new(SqlxJobRepository::new((*db.pool).clone()));
    let counters = Counters::default();

    let runner = Arc::new(JobRunner::new(repo, cfg.job_poll_interval, counters));
    tokio::spawn(runner.run());

    tracing::info!("job runner started; waiting for shutdown signal");

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received");

    Ok(())
}
