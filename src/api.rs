//! External interface (§6) — the typed boundary a future HTTP layer would
//! call directly. No HTTP framework lives here: routing/serialization at
//! the wire is "external collaborator" scope per §1.

use std::sync::Arc;

use uuid::Uuid;

use crate::commit;
use crate::domain::{JobStatus, Plan, PlanRake, PlanningJob};
use crate::error::PlannerError;
use crate::jobs::repository::JobRepository;
use crate::metrics::Counters;
use crate::planner::types::PlannerConfig;
use crate::time::now;

/// Validates and enqueues a new planning job. Config validation (an
/// unrecognized `mode` string, for instance) happens before the job row is
/// ever persisted — a malformed request never reaches `queued` (§7).
pub async fn create_job(
    repo: &Arc<dyn JobRepository>,
    scenario_name: String,
    notes: Option<String>,
    config: PlannerConfig,
) -> Result<PlanningJob, PlannerError> {
    if scenario_name.trim().is_empty() {
        return Err(PlannerError::Validation("scenario_name must not be empty".to_string()));
    }

    let job = PlanningJob::new(scenario_name, config, notes, now());
    repo.create_job(&job).await?;
    Ok(job)
}

pub async fn job_status(repo: &Arc<dyn JobRepository>, job_id: Uuid) -> Result<PlanningJob, PlannerError> {
    repo.fetch_job(&job_id)
        .await?
        .ok_or_else(|| PlannerError::not_found(format!("job {job_id}")))
}

/// Requests cancellation. A job already `completed`/`failed`/`cancelled`
/// cannot be cancelled again (§4.8).
pub async fn cancel_job(repo: &Arc<dyn JobRepository>, job_id: Uuid) -> Result<(), PlannerError> {
    let status = repo
        .job_status(&job_id)
        .await?
        .ok_or_else(|| PlannerError::not_found(format!("job {job_id}")))?;

    if status.is_terminal() {
        return Err(PlannerError::precondition(format!("job {job_id} is already {}", status.as_str())));
    }

    repo.cancel_job(&job_id, now()).await?;
    Ok(())
}

pub async fn fetch_plan(repo: &Arc<dyn JobRepository>, job_id: Uuid) -> Result<(Plan, Vec<PlanRake>), PlannerError> {
    let status = repo
        .job_status(&job_id)
        .await?
        .ok_or_else(|| PlannerError::not_found(format!("job {job_id}")))?;

    if status != JobStatus::Completed {
        return Err(PlannerError::precondition(format!("job {job_id} has no plan (status: {})", status.as_str())));
    }

    repo.fetch_plan_by_job(&job_id)
        .await?
        .ok_or_else(|| PlannerError::Internal(format!("job {job_id} completed but its plan is missing")))
}

pub async fn commit_plan(repo: &Arc<dyn JobRepository>, counters: &Counters, plan_id: Uuid) -> Result<(), PlannerError> {
    commit::commit_plan(repo, counters, plan_id).await
}

pub async fn explain_plan(repo: &Arc<dyn JobRepository>, plan_id: Uuid) -> Result<String, PlannerError> {
    let (plan, rakes) = repo
        .fetch_plan(&plan_id)
        .await?
        .ok_or_else(|| PlannerError::not_found(format!("plan {plan_id}")))?;

    Ok(crate::explain::explain(&plan, &rakes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::repository_sqlx::SqlxJobRepository;
    use sqlx::any::AnyPoolOptions;

    async fn repo() -> Arc<dyn JobRepository> {
        sqlx::any::install_default_drivers();
        let db_name = Uuid::new_v4().to_string();
        let conn = format!("sqlite:file:{db_name}?mode=memory&cache=shared");
        let pool = AnyPoolOptions::new().max_connections(5).connect(&conn).await.unwrap();
        crate::db::schema::migrate(&pool).await.unwrap();
        Arc::new(SqlxJobRepository::new(pool))
    }

    #[tokio::test]
    async fn empty_scenario_name_is_rejected() {
        let repo = repo().await;
        let result = create_job(&repo, "   ".to_string(), None, PlannerConfig::default()).await;
        assert!(matches!(result, Err(PlannerError::Validation(_))));
    }

    #[tokio::test]
    async fn create_then_fetch_roundtrips() {
        let repo = repo().await;
        let job = create_job(&repo, "scenario A".to_string(), Some("note".to_string()), PlannerConfig::default())
            .await
            .unwrap();

        let fetched = job_status(&repo, job.id).await.unwrap();
        assert_eq!(fetched.scenario_name, "scenario A");
        assert_eq!(fetched.status, JobStatus::Queued);
        assert_eq!(fetched.notes.as_deref(), Some("note"));
    }

    #[tokio::test]
    async fn cancel_of_unknown_job_is_not_found() {
        let repo = repo().await;
        let result = cancel_job(&repo, Uuid::new_v4()).await;
        assert!(matches!(result, Err(PlannerError::NotFound(_))));
    }

    #[tokio::test]
    async fn fetch_plan_before_completion_is_precondition_failed() {
        let repo = repo().await;
        let job = create_job(&repo, "scenario B".to_string(), None, PlannerConfig::default()).await.unwrap();
        let result = fetch_plan(&repo, job.id).await;
        assert!(matches!(result, Err(PlannerError::PreconditionFailed(_))));
    }
}
