//! Persistence boundary for planning jobs and plans (§4.8, §4.9, C8/C9).

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{JobStatus, Order, Plan, PlanRake, PlanningJob, Rake, Stockyard};
use crate::error::CommitAnomaly;

/// Outcome of attempting to commit a plan. Commit never fails because of a
/// stale reference row — it records the anomaly and moves on (§4.9, §7).
pub enum CommitOutcome {
    Committed { anomalies: Vec<CommitAnomaly> },
    AlreadyCommitted,
    PlanNotFound,
}

#[async_trait]
pub trait JobRepository: Send + Sync {
    async fn create_job(&self, job: &PlanningJob) -> Result<()>;

    async fn fetch_job(&self, job_id: &Uuid) -> Result<Option<PlanningJob>>;

    /// Pops the oldest `queued` job id, if any, without changing its status.
    /// The runner transitions it to `running` separately so a crash between
    /// the two leaves the job recoverable as still-queued.
    async fn next_queued_job(&self) -> Result<Option<Uuid>>;

    /// Returns `false` if the job was not in `queued` state (e.g. already
    /// cancelled) — the runner must not clobber a terminal status.
    async fn mark_running(&self, job_id: &Uuid, now: DateTime<Utc>) -> Result<bool>;

    async fn append_progress(&self, job_id: &Uuid, progress: u8, log_line: &str, now: DateTime<Utc>) -> Result<()>;

    async fn job_status(&self, job_id: &Uuid) -> Result<Option<JobStatus>>;

    async fn mark_completed(
        &self,
        job_id: &Uuid,
        plan: &Plan,
        plan_rakes: &[PlanRake],
        now: DateTime<Utc>,
    ) -> Result<()>;

    async fn mark_failed(&self, job_id: &Uuid, log_line: &str, now: DateTime<Utc>) -> Result<()>;

    /// Returns `false` if the job was already terminal.
    async fn cancel_job(&self, job_id: &Uuid, now: DateTime<Utc>) -> Result<bool>;

    async fn snapshot_orders(&self) -> Result<Vec<Order>>;
    async fn snapshot_stockyards(&self) -> Result<Vec<Stockyard>>;
    async fn snapshot_rakes(&self) -> Result<Vec<Rake>>;

    async fn fetch_plan_by_job(&self, job_id: &Uuid) -> Result<Option<(Plan, Vec<PlanRake>)>>;
    async fn fetch_plan(&self, plan_id: &Uuid) -> Result<Option<(Plan, Vec<PlanRake>)>>;

    /// Flips the referenced orders to `assigned` and rakes to `assigned`,
    /// and marks the plan `committed`, all in one transaction. Anomalies
    /// (a referenced row missing or not in the expected state) are
    /// collected rather than aborting the whole commit (§4.9).
    async fn commit_plan(&self, plan_id: &Uuid, now: DateTime<Utc>) -> Result<CommitOutcome>;
}
