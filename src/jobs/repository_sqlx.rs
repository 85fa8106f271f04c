//! SQLx-backed implementation of [`JobRepository`].
//!
//! Responsible only for persistence and row mapping; the trait in
//! `repository.rs` stays storage-agnostic.

use std::collections::HashMap;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{AnyPool, Row};
use uuid::Uuid;

use crate::domain::{AssignedOrder, JobStatus, Order, OrderStatus, Plan, PlanRake, PlanningJob, Rake, RakeStatus, Stockyard};
use crate::error::CommitAnomaly;
use crate::jobs::repository::{CommitOutcome, JobRepository};
use crate::planner::types::PlannerConfig;

pub struct SqlxJobRepository {
    pool: AnyPool,
}

impl SqlxJobRepository {
    pub fn new(pool: AnyPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobRepository for SqlxJobRepository {
    async fn create_job(&self, job: &PlanningJob) -> anyhow::Result<()> {
        let config_json = serde_json::to_string(&job.config)?;

        sqlx::query(
            r#"
INSERT INTO planning_jobs
  (id, scenario_name, notes, config_json, status, progress, logs, started_at, completed_at, created_at, updated_at)
VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?);
"#,
        )
        .bind(job.id.to_string())
        .bind(&job.scenario_name)
        .bind(&job.notes)
        .bind(config_json)
        .bind(job.status.as_str())
        .bind(job.progress as i32)
        .bind(&job.logs)
        .bind(job.started_at.map(|t| t.to_rfc3339()))
        .bind(job.completed_at.map(|t| t.to_rfc3339()))
        .bind(job.created_at.to_rfc3339())
        .bind(job.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn fetch_job(&self, job_id: &Uuid) -> anyhow::Result<Option<PlanningJob>> {
        let row = sqlx::query(r#"SELECT * FROM planning_jobs WHERE id = ?;"#)
            .bind(job_id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| row_to_job(&r)).transpose()
    }

    async fn next_queued_job(&self) -> anyhow::Result<Option<Uuid>> {
        let row = sqlx::query(
            r#"SELECT id FROM planning_jobs WHERE status = 'queued' ORDER BY created_at ASC LIMIT 1;"#,
        )
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => {
                let id: String = r.get("id");
                Ok(Some(Uuid::parse_str(&id).context("invalid job id")?))
            }
            None => Ok(None),
        }
    }

    async fn mark_running(&self, job_id: &Uuid, now: DateTime<Utc>) -> anyhow::Result<bool> {
        let res = sqlx::query(
            r#"
UPDATE planning_jobs
SET status = 'running', started_at = ?, updated_at = ?
WHERE id = ? AND status = 'queued';
"#,
        )
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .bind(job_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(res.rows_affected() == 1)
    }

    async fn append_progress(&self, job_id: &Uuid, progress: u8, log_line: &str, now: DateTime<Utc>) -> anyhow::Result<()> {
        let stamped = format!("[{}] {}\n", now.to_rfc3339(), log_line);

        sqlx::query(
            r#"
UPDATE planning_jobs
SET progress = ?, logs = logs || ?, updated_at = ?
WHERE id = ?;
"#,
        )
        .bind(progress as i32)
        .bind(stamped)
        .bind(now.to_rfc3339())
        .bind(job_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn job_status(&self, job_id: &Uuid) -> anyhow::Result<Option<JobStatus>> {
        let row = sqlx::query(r#"SELECT status FROM planning_jobs WHERE id = ?;"#)
            .bind(job_id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(r) => {
                let status: String = r.get("status");
                Ok(JobStatus::parse(&status))
            }
            None => Ok(None),
        }
    }

    async fn mark_completed(
        &self,
        job_id: &Uuid,
        plan: &Plan,
        plan_rakes: &[PlanRake],
        now: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
UPDATE planning_jobs
SET status = 'completed', progress = 100, completed_at = ?, updated_at = ?
WHERE id = ?;
"#,
        )
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .bind(job_id.to_string())
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
INSERT INTO plans
  (id, job_id, scenario_name, total_cost, freight_cost, demurrage_cost, idle_cost,
   utilization_pct, orders_fulfilled, total_orders, algorithm, committed, committed_at, created_at)
VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?);
"#,
        )
        .bind(plan.id.to_string())
        .bind(plan.job_id.to_string())
        .bind(&plan.scenario_name)
        .bind(plan.total_cost)
        .bind(plan.freight_cost)
        .bind(plan.demurrage_cost)
        .bind(plan.idle_cost)
        .bind(plan.utilization_pct)
        .bind(plan.orders_fulfilled)
        .bind(plan.total_orders)
        .bind(&plan.algorithm)
        .bind(plan.committed as i32)
        .bind(plan.committed_at.map(|t| t.to_rfc3339()))
        .bind(plan.created_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        for rake in plan_rakes {
            let destinations_json = serde_json::to_string(&rake.destinations)?;

            sqlx::query(
                r#"
INSERT INTO plan_rakes
  (id, plan_id, rake_number, origin_stockyard_id, destinations_json, total_weight, utilization_pct, freight_cost)
VALUES (?, ?, ?, ?, ?, ?, ?, ?);
"#,
            )
            .bind(rake.id.to_string())
            .bind(rake.plan_id.to_string())
            .bind(&rake.rake_number)
            .bind(rake.origin_stockyard_id.map(|id| id.to_string()))
            .bind(destinations_json)
            .bind(rake.total_weight)
            .bind(rake.utilization_pct)
            .bind(rake.freight_cost)
            .execute(&mut *tx)
            .await?;

            for order in &rake.orders_assigned {
                sqlx::query(
                    r#"
INSERT INTO plan_rake_orders
  (id, plan_rake_id, order_id, order_number, product_code, quantity_tonnes, destination, freight_cost)
VALUES (?, ?, ?, ?, ?, ?, ?, ?);
"#,
                )
                .bind(Uuid::new_v4().to_string())
                .bind(rake.id.to_string())
                .bind(order.order_id.to_string())
                .bind(&order.order_number)
                .bind(&order.product_code)
                .bind(order.quantity_tonnes)
                .bind(&order.destination)
                .bind(order.freight_cost)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        Ok(())
    }

    async fn mark_failed(&self, job_id: &Uuid, log_line: &str, now: DateTime<Utc>) -> anyhow::Result<()> {
        let stamped = format!("[{}] {}\n", now.to_rfc3339(), log_line);

        sqlx::query(
            r#"
UPDATE planning_jobs
SET status = 'failed', completed_at = ?, updated_at = ?, logs = logs || ?
WHERE id = ?;
"#,
        )
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .bind(stamped)
        .bind(job_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn cancel_job(&self, job_id: &Uuid, now: DateTime<Utc>) -> anyhow::Result<bool> {
        let res = sqlx::query(
            r#"
UPDATE planning_jobs
SET status = 'cancelled', completed_at = ?, updated_at = ?
WHERE id = ? AND status IN ('queued', 'running');
"#,
        )
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .bind(job_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(res.rows_affected() == 1)
    }

    async fn snapshot_orders(&self) -> anyhow::Result<Vec<Order>> {
        let rows = sqlx::query(r#"SELECT * FROM orders WHERE status = 'pending';"#)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_order).collect()
    }

    async fn snapshot_stockyards(&self) -> anyhow::Result<Vec<Stockyard>> {
        let rows = sqlx::query(r#"SELECT * FROM stockyards;"#).fetch_all(&self.pool).await?;
        let inventory_rows = sqlx::query(r#"SELECT * FROM stockyard_inventory;"#)
            .fetch_all(&self.pool)
            .await?;

        let mut inventory: HashMap<String, HashMap<String, f64>> = HashMap::new();
        for r in &inventory_rows {
            let stockyard_id: String = r.get("stockyard_id");
            let product_code: String = r.get("product_code");
            let qty: f64 = r.get("quantity_tonnes");
            inventory.entry(stockyard_id).or_default().insert(product_code, qty);
        }

        rows.iter().map(|r| row_to_stockyard(r, &inventory)).collect()
    }

    async fn snapshot_rakes(&self) -> anyhow::Result<Vec<Rake>> {
        let rows = sqlx::query(r#"SELECT * FROM rakes WHERE status = 'available';"#)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_rake).collect()
    }

    async fn fetch_plan_by_job(&self, job_id: &Uuid) -> anyhow::Result<Option<(Plan, Vec<PlanRake>)>> {
        let row = sqlx::query(r#"SELECT * FROM plans WHERE job_id = ?;"#)
            .bind(job_id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(r) => {
                let plan = row_to_plan(&r)?;
                let rakes = self.fetch_plan_rakes(&plan.id).await?;
                Ok(Some((plan, rakes)))
            }
            None => Ok(None),
        }
    }

    async fn fetch_plan(&self, plan_id: &Uuid) -> anyhow::Result<Option<(Plan, Vec<PlanRake>)>> {
        let row = sqlx::query(r#"SELECT * FROM plans WHERE id = ?;"#)
            .bind(plan_id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(r) => {
                let plan = row_to_plan(&r)?;
                let rakes = self.fetch_plan_rakes(&plan.id).await?;
                Ok(Some((plan, rakes)))
            }
            None => Ok(None),
        }
    }

    async fn commit_plan(&self, plan_id: &Uuid, now: DateTime<Utc>) -> anyhow::Result<CommitOutcome> {
        let mut tx = self.pool.begin().await?;

        let plan_row = sqlx::query(r#"SELECT committed FROM plans WHERE id = ?;"#)
            .bind(plan_id.to_string())
            .fetch_optional(&mut *tx)
            .await?;

        let Some(plan_row) = plan_row else {
            tx.rollback().await?;
            return Ok(CommitOutcome::PlanNotFound);
        };

        let already_committed: bool = plan_row.get::<i64, _>("committed") != 0;
        if already_committed {
            tx.commit().await?;
            return Ok(CommitOutcome::AlreadyCommitted);
        }

        let rake_rows = sqlx::query(r#"SELECT * FROM plan_rakes WHERE plan_id = ?;"#)
            .bind(plan_id.to_string())
            .fetch_all(&mut *tx)
            .await?;

        let mut anomalies = Vec::new();

        for rake_row in &rake_rows {
            let rake_number: String = rake_row.get("rake_number");

            let res = sqlx::query(r#"UPDATE rakes SET status = 'assigned' WHERE rake_number = ? AND status = 'available';"#)
                .bind(&rake_number)
                .execute(&mut *tx)
                .await?;

            if res.rows_affected() != 1 {
                anomalies.push(CommitAnomaly {
                    rake_number: Some(rake_number.clone()),
                    order_id: None,
                    detail: "rake missing or not available at commit time".to_string(),
                });
            }

            let plan_rake_id: String = rake_row.get("id");
            let order_rows = sqlx::query(r#"SELECT order_id FROM plan_rake_orders WHERE plan_rake_id = ?;"#)
                .bind(&plan_rake_id)
                .fetch_all(&mut *tx)
                .await?;

            for order_row in &order_rows {
                let order_id_str: String = order_row.get("order_id");
                let order_id = Uuid::parse_str(&order_id_str).context("invalid order id")?;

                let res = sqlx::query(r#"UPDATE orders SET status = 'assigned' WHERE id = ? AND status = 'pending';"#)
                    .bind(&order_id_str)
                    .execute(&mut *tx)
                    .await?;

                if res.rows_affected() != 1 {
                    anomalies.push(CommitAnomaly {
                        rake_number: Some(rake_number.clone()),
                        order_id: Some(order_id),
                        detail: "order missing or not pending at commit time".to_string(),
                    });
                }
            }
        }

        sqlx::query(r#"UPDATE plans SET committed = 1, committed_at = ? WHERE id = ?;"#)
            .bind(now.to_rfc3339())
            .bind(plan_id.to_string())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(CommitOutcome::Committed { anomalies })
    }
}

impl SqlxJobRepository {
    async fn fetch_plan_rakes(&self, plan_id: &Uuid) -> anyhow::Result<Vec<PlanRake>> {
        let rake_rows = sqlx::query(r#"SELECT * FROM plan_rakes WHERE plan_id = ?;"#)
            .bind(plan_id.to_string())
            .fetch_all(&self.pool)
            .await?;

        let mut out = Vec::new();
        for r in &rake_rows {
            let plan_rake_id: String = r.get("id");
            let order_rows = sqlx::query(r#"SELECT * FROM plan_rake_orders WHERE plan_rake_id = ?;"#)
                .bind(&plan_rake_id)
                .fetch_all(&self.pool)
                .await?;

            let orders_assigned = order_rows.iter().map(row_to_assigned_order).collect::<anyhow::Result<_>>()?;
            out.push(row_to_plan_rake(r, orders_assigned)?);
        }

        Ok(out)
    }
}

fn row_to_job(r: &sqlx::any::AnyRow) -> anyhow::Result<PlanningJob> {
    let id = Uuid::parse_str(&r.get::<String, _>("id")).context("invalid job id")?;
    let config_json: String = r.get("config_json");
    let config: PlannerConfig = serde_json::from_str(&config_json).context("invalid stored planner config")?;
    let status = JobStatus::parse(&r.get::<String, _>("status")).context("invalid job status")?;

    Ok(PlanningJob {
        id,
        scenario_name: r.get("scenario_name"),
        notes: r.get("notes"),
        config,
        status,
        progress: r.get::<i32, _>("progress") as u8,
        logs: r.get("logs"),
        started_at: parse_optional_timestamp(r.get("started_at"))?,
        completed_at: parse_optional_timestamp(r.get("completed_at"))?,
        created_at: parse_timestamp(&r.get::<String, _>("created_at"))?,
        updated_at: parse_timestamp(&r.get::<String, _>("updated_at"))?,
    })
}

fn row_to_order(r: &sqlx::any::AnyRow) -> anyhow::Result<Order> {
    let id = Uuid::parse_str(&r.get::<String, _>("id")).context("invalid order id")?;
    let source_stockyard_id: Option<String> = r.get("source_stockyard_id");
    let status = OrderStatus::parse(&r.get::<String, _>("status")).context("invalid order status")?;

    Ok(Order {
        id,
        order_number: r.get("order_number"),
        product_code: r.get("product_code"),
        quantity_tonnes: r.get("quantity_tonnes"),
        source_stockyard_id: source_stockyard_id
            .map(|s| Uuid::parse_str(&s))
            .transpose()
            .context("invalid source stockyard id")?,
        destination: r.get("destination"),
        destination_latitude: r.get("destination_latitude"),
        destination_longitude: r.get("destination_longitude"),
        priority: r.get("priority"),
        due_date: parse_timestamp(&r.get::<String, _>("due_date"))?,
        sla_hours: r.get("sla_hours"),
        status,
    })
}

fn row_to_stockyard(r: &sqlx::any::AnyRow, inventory: &HashMap<String, HashMap<String, f64>>) -> anyhow::Result<Stockyard> {
    let id_str: String = r.get("id");
    let id = Uuid::parse_str(&id_str).context("invalid stockyard id")?;

    Ok(Stockyard {
        id,
        code: r.get("code"),
        name: r.get("name"),
        location: r.get("location"),
        latitude: r.get("latitude"),
        longitude: r.get("longitude"),
        capacity_tonnes: r.get("capacity_tonnes"),
        current_inventory: inventory.get(&id_str).cloned().unwrap_or_default(),
    })
}

fn row_to_rake(r: &sqlx::any::AnyRow) -> anyhow::Result<Rake> {
    let id = Uuid::parse_str(&r.get::<String, _>("id")).context("invalid rake id")?;
    let status = RakeStatus::parse(&r.get::<String, _>("status")).context("invalid rake status")?;

    Ok(Rake {
        id,
        rake_number: r.get("rake_number"),
        wagon_type_code: r.get("wagon_type_code"),
        num_wagons: r.get("num_wagons"),
        total_capacity_tonnes: r.get("total_capacity_tonnes"),
        status,
        current_location: r.get("current_location"),
    })
}

fn row_to_plan(r: &sqlx::any::AnyRow) -> anyhow::Result<Plan> {
    Ok(Plan {
        id: Uuid::parse_str(&r.get::<String, _>("id")).context("invalid plan id")?,
        job_id: Uuid::parse_str(&r.get::<String, _>("job_id")).context("invalid plan job id")?,
        scenario_name: r.get("scenario_name"),
        total_cost: r.get("total_cost"),
        freight_cost: r.get("freight_cost"),
        demurrage_cost: r.get("demurrage_cost"),
        idle_cost: r.get("idle_cost"),
        utilization_pct: r.get("utilization_pct"),
        orders_fulfilled: r.get("orders_fulfilled"),
        total_orders: r.get("total_orders"),
        algorithm: r.get("algorithm"),
        committed: r.get::<i64, _>("committed") != 0,
        committed_at: parse_optional_timestamp(r.get("committed_at"))?,
        created_at: parse_timestamp(&r.get::<String, _>("created_at"))?,
    })
}

fn row_to_plan_rake(r: &sqlx::any::AnyRow, orders_assigned: Vec<AssignedOrder>) -> anyhow::Result<PlanRake> {
    let origin_stockyard_id: Option<String> = r.get("origin_stockyard_id");
    let destinations_json: String = r.get("destinations_json");

    Ok(PlanRake {
        id: Uuid::parse_str(&r.get::<String, _>("id")).context("invalid plan_rake id")?,
        plan_id: Uuid::parse_str(&r.get::<String, _>("plan_id")).context("invalid plan_rake plan id")?,
        rake_number: r.get("rake_number"),
        origin_stockyard_id: origin_stockyard_id
            .map(|s| Uuid::parse_str(&s))
            .transpose()
            .context("invalid origin stockyard id")?,
        destinations: serde_json::from_str(&destinations_json).context("invalid destinations json")?,
        orders_assigned,
        total_weight: r.get("total_weight"),
        utilization_pct: r.get("utilization_pct"),
        freight_cost: r.get("freight_cost"),
    })
}

fn row_to_assigned_order(r: &sqlx::any::AnyRow) -> anyhow::Result<AssignedOrder> {
    Ok(AssignedOrder {
        order_id: Uuid::parse_str(&r.get::<String, _>("order_id")).context("invalid assigned order id")?,
        order_number: r.get("order_number"),
        product_code: r.get("product_code"),
        quantity_tonnes: r.get("quantity_tonnes"),
        destination: r.get("destination"),
        freight_cost: r.get("freight_cost"),
    })
}

fn parse_timestamp(s: &str) -> anyhow::Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc))
}

fn parse_optional_timestamp(s: Option<String>) -> anyhow::Result<Option<DateTime<Utc>>> {
    s.map(|s| parse_timestamp(&s)).transpose()
}
