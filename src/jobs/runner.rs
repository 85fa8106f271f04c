//! Job runner: the background state machine driving C7 (§4.8, C8).
//!
//! A `tokio::spawn`ed consumer that never lets a single job's failure kill
//! the loop: one poll loop over a persistent `queued` set, since there is
//! no push notification between job creation and pickup.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use tracing::{Instrument, error, info, warn};
use uuid::Uuid;

use crate::domain::{AssignedOrder, Plan, PlanRake};
use crate::jobs::repository::JobRepository;
use crate::logger::{annotate_plan, job_span, warn_if_slow};
use crate::metrics::Counters;
use crate::planner;
use crate::time::now;
use std::sync::atomic::Ordering;

const SLOW_DB_THRESHOLD: Duration = Duration::from_millis(200);

pub struct JobRunner {
    repo: Arc<dyn JobRepository>,
    poll_interval: Duration,
    counters: Counters,
}

impl JobRunner {
    pub fn new(repo: Arc<dyn JobRepository>, poll_interval: Duration, counters: Counters) -> Self {
        Self { repo, poll_interval, counters }
    }

    /// Owned polling loop. Runs until the process exits; a single job's
    /// failure never stops the loop (§9).
    pub async fn run(self: Arc<Self>) {
        info!("job runner started");

        loop {
            match self.repo.next_queued_job().await {
                Ok(Some(job_id)) => {
                    self.counters.jobs_picked_up.fetch_add(1, Ordering::Relaxed);
                    let span = job_span(&job_id);
                    if let Err(e) = self.run_one(job_id).instrument(span).await {
                        error!(job_id = %job_id, error = %e, "job runner failed to drive job");
                    }
                }
                Ok(None) => {
                    tokio::time::sleep(self.poll_interval).await;
                }
                Err(e) => {
                    error!(error = %e, "failed to poll for queued jobs");
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }
    }

    /// Drives a single job from `queued` through to a terminal state.
    /// Checks for an external cancellation at every checkpoint (0/20/40/
    /// 80/100) and stops without overwriting a terminal status if one has
    /// landed — cancellation is cooperative, not preemptive (§4.8, §9).
    pub async fn run_one(&self, job_id: Uuid) -> anyhow::Result<()> {
        if !self.repo.mark_running(&job_id, now()).await? {
            self.counters.jobs_cancelled.fetch_add(1, Ordering::Relaxed);
            return Ok(()); // already cancelled before pickup
        }

        if self.is_cancelled(&job_id).await? {
            self.counters.jobs_cancelled.fetch_add(1, Ordering::Relaxed);
            return Ok(());
        }
        self.checkpoint(&job_id, 0, "job started").await?;

        let job = self
            .repo
            .fetch_job(&job_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("job {job_id} vanished after mark_running"))?;

        let orders = warn_if_slow("snapshot_orders", SLOW_DB_THRESHOLD, self.repo.snapshot_orders()).await?;
        let stockyards = warn_if_slow("snapshot_stockyards", SLOW_DB_THRESHOLD, self.repo.snapshot_stockyards()).await?;
        let rakes = warn_if_slow("snapshot_rakes", SLOW_DB_THRESHOLD, self.repo.snapshot_rakes()).await?;

        if self.is_cancelled(&job_id).await? {
            self.counters.jobs_cancelled.fetch_add(1, Ordering::Relaxed);
            return Ok(());
        }
        self.checkpoint(&job_id, 20, "reference data snapshotted").await?;

        if self.is_cancelled(&job_id).await? {
            self.counters.jobs_cancelled.fetch_add(1, Ordering::Relaxed);
            return Ok(());
        }
        self.checkpoint(&job_id, 40, "planner dispatch starting").await?;

        let config = job.config.clone();
        let result = std::panic::catch_unwind(AssertUnwindSafe(|| planner::run(&orders, &stockyards, &rakes, &config)));

        let plan_result = match result {
            Ok(Ok(plan_result)) => plan_result,
            Ok(Err(e)) => {
                self.fail(&job_id, &format!("planner failure: {e}")).await?;
                return Ok(());
            }
            Err(panic) => {
                let detail = panic_message(&panic);
                warn!(job_id = %job_id, detail = %detail, "planner panicked, trapped at job-runner boundary");
                self.fail(&job_id, &format!("planner panicked: {detail}")).await?;
                return Ok(());
            }
        };

        if self.is_cancelled(&job_id).await? {
            self.counters.jobs_cancelled.fetch_add(1, Ordering::Relaxed);
            return Ok(());
        }
        self.checkpoint(&job_id, 80, &format!("planner produced {} rake(s)", plan_result.rakes.len()))
            .await?;

        let plan = Plan::from_result(job_id, job.scenario_name.clone(), &plan_result, now());
        annotate_plan(&plan.id);

        let plan_rakes: Vec<PlanRake> = plan_result
            .rakes
            .iter()
            .map(|r| PlanRake {
                id: Uuid::new_v4(),
                plan_id: plan.id,
                rake_number: r.rake_number.clone(),
                origin_stockyard_id: stockyards
                    .iter()
                    .find(|sy| Some(&sy.code) == r.origin_stockyard_code.as_ref())
                    .map(|sy| sy.id),
                destinations: r.destinations.clone(),
                orders_assigned: r
                    .orders
                    .iter()
                    .map(|o| AssignedOrder {
                        order_id: o.order_id,
                        order_number: o.order_number.clone(),
                        product_code: o.product_code.clone(),
                        quantity_tonnes: o.quantity_tonnes,
                        destination: o.destination.clone(),
                        freight_cost: o.freight_cost,
                    })
                    .collect(),
                total_weight: r.total_weight,
                utilization_pct: r.utilization_pct,
                freight_cost: r.freight_cost,
            })
            .collect();

        if plan_result.algorithm.contains("scale guard") {
            self.counters.planner_fallback_scale_guard.fetch_add(1, Ordering::Relaxed);
        } else if plan_result.algorithm.contains("infeasible") {
            self.counters.planner_fallback_infeasible.fetch_add(1, Ordering::Relaxed);
        }

        self.repo.mark_completed(&job_id, &plan, &plan_rakes, now()).await?;
        self.counters.jobs_completed.fetch_add(1, Ordering::Relaxed);
        info!(job_id = %job_id, plan_id = %plan.id, "job completed");

        Ok(())
    }

    async fn is_cancelled(&self, job_id: &Uuid) -> anyhow::Result<bool> {
        Ok(matches!(self.repo.job_status(job_id).await?, Some(crate::domain::JobStatus::Cancelled)))
    }

    async fn checkpoint(&self, job_id: &Uuid, progress: u8, log_line: &str) -> anyhow::Result<()> {
        self.repo.append_progress(job_id, progress, log_line, now()).await
    }

    async fn fail(&self, job_id: &Uuid, log_line: &str) -> anyhow::Result<()> {
        self.counters.jobs_failed.fetch_add(1, Ordering::Relaxed);
        self.repo.mark_failed(job_id, log_line, now()).await
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
