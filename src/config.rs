use std::time::Duration;

/// Service-wide settings, separate from the per-job `PlannerConfig` (§6)
/// that travels with each planning request.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Database connection string. `sqlite://...` in dev/test, `postgres://...`
    /// in production — both run through the same `sqlx::AnyPool` code path.
    pub database_url: String,

    /// How often the job runner polls the `planning_jobs` table for a
    /// `queued` row when idle.
    ///
    /// There is no push notification between job creation and the runner
    /// loop (§9: "explicit job-runner loop pulling from a persistent
    /// `queued` set"); this bounds how long a job waits before being
    /// picked up.
    pub job_poll_interval: Duration,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://rake_planner_dev.db".to_string());

        Self {
            database_url,
            job_poll_interval: Duration::from_millis(500),
        }
    }
}
