//! Commit executor (§4.9, C9).
//!
//! Thin orchestration over [`JobRepository::commit_plan`] — validates
//! preconditions and delegates the transactional row flips to the
//! repository, a "decide" layer on top of the repository's "persist
//! atomically" layer.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use tracing::warn;
use uuid::Uuid;

use crate::error::PlannerError;
use crate::jobs::repository::{CommitOutcome, JobRepository};
use crate::metrics::Counters;
use crate::time::now;

/// Commits a completed plan: flips its rakes and orders to `assigned` and
/// marks the plan `committed`. A second commit of the same plan is a
/// precondition failure, not a no-op — callers must not re-commit blindly
/// (§4.9, §7).
pub async fn commit_plan(repo: &Arc<dyn JobRepository>, counters: &Counters, plan_id: Uuid) -> Result<(), PlannerError> {
    match repo.commit_plan(&plan_id, now()).await? {
        CommitOutcome::Committed { anomalies } => {
            counters.plans_committed.fetch_add(1, Ordering::Relaxed);
            counters.commit_anomalies.fetch_add(anomalies.len() as u64, Ordering::Relaxed);
            for a in &anomalies {
                warn!(
                    plan_id = %plan_id,
                    rake_number = ?a.rake_number,
                    order_id = ?a.order_id,
                    detail = %a.detail,
                    "commit anomaly"
                );
            }
            Ok(())
        }
        CommitOutcome::AlreadyCommitted => Err(PlannerError::precondition(format!("plan {plan_id} already committed"))),
        CommitOutcome::PlanNotFound => Err(PlannerError::not_found(format!("plan {plan_id}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AssignedOrder, Plan, PlanRake, PlanningJob};
    use crate::jobs::repository_sqlx::SqlxJobRepository;
    use crate::metrics::Counters;
    use crate::planner::types::PlannerConfig;
    use chrono::Utc;
    use sqlx::any::AnyPoolOptions;

    #[tokio::test]
    async fn second_commit_is_precondition_failed() {
        sqlx::any::install_default_drivers();
        let db_name = uuid::Uuid::new_v4().to_string();
        let conn = format!("sqlite:file:{db_name}?mode=memory&cache=shared");
        let pool = AnyPoolOptions::new().max_connections(5).connect(&conn).await.unwrap();
        crate::db::schema::migrate(&pool).await.unwrap();

        let rake_id = Uuid::new_v4();
        sqlx::query("INSERT INTO rakes (id, rake_number, wagon_type_code, num_wagons, total_capacity_tonnes, status, current_location) VALUES (?, 'RK001', 'BOXN', 58, 3480.0, 'available', NULL);")
            .bind(rake_id.to_string())
            .execute(&pool)
            .await
            .unwrap();

        let order_id = Uuid::new_v4();
        sqlx::query("INSERT INTO orders (id, order_number, product_code, quantity_tonnes, source_stockyard_id, destination, destination_latitude, destination_longitude, priority, due_date, sla_hours, status) VALUES (?, 'ORD001', 'COAL', 2500.0, NULL, 'Dest1', NULL, NULL, 1, ?, 72.0, 'pending');")
            .bind(order_id.to_string())
            .bind(Utc::now().to_rfc3339())
            .execute(&pool)
            .await
            .unwrap();

        let repo: Arc<dyn JobRepository> = Arc::new(SqlxJobRepository::new(pool));

        let job = PlanningJob::new("scenario".to_string(), PlannerConfig::default(), None, Utc::now());
        repo.create_job(&job).await.unwrap();

        let result = crate::planner::types::PlanResult {
            rakes: vec![crate::planner::types::PlanRakeResult {
                rake_number: "RK001".to_string(),
                origin_stockyard_code: None,
                origin_stockyard_name: None,
                destinations: vec!["Dest1".to_string()],
                orders: vec![crate::planner::types::AssignedOrderResult {
                    order_id,
                    order_number: "ORD001".to_string(),
                    product_code: "COAL".to_string(),
                    quantity_tonnes: 2500.0,
                    destination: "Dest1".to_string(),
                    freight_cost: 100.0,
                }],
                total_weight: 2500.0,
                capacity: 3480.0,
                utilization_pct: 71.8,
                freight_cost: 100.0,
                demurrage_cost: 0.0,
                idle_cost: 200.0,
                wagon_type: "BOXN".to_string(),
                num_wagons: 58,
            }],
            total_cost: 100.0,
            freight_cost: 100.0,
            demurrage_cost: 0.0,
            idle_cost: 200.0,
            utilization_pct: 71.8,
            orders_fulfilled: 1,
            total_orders: 1,
            algorithm: "greedy".to_string(),
        };

        let plan = Plan::from_result(job.id, job.scenario_name.clone(), &result, Utc::now());
        let plan_rakes: Vec<PlanRake> = result
            .rakes
            .iter()
            .map(|r| PlanRake {
                id: Uuid::new_v4(),
                plan_id: plan.id,
                rake_number: r.rake_number.clone(),
                origin_stockyard_id: None,
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

        repo.mark_completed(&job.id, &plan, &plan_rakes, Utc::now()).await.unwrap();

        let counters = Counters::default();
        commit_plan(&repo, &counters, plan.id).await.expect("first commit succeeds");

        let rake = repo.snapshot_rakes().await.unwrap();
        assert!(rake.is_empty(), "rake must no longer be available after commit");

        let second = commit_plan(&repo, &counters, plan.id).await;
        assert!(matches!(second, Err(PlannerError::PreconditionFailed(_))));
    }

    #[tokio::test]
    async fn commit_of_unknown_plan_is_not_found() {
        sqlx::any::install_default_drivers();
        let db_name = uuid::Uuid::new_v4().to_string();
        let conn = format!("sqlite:file:{db_name}?mode=memory&cache=shared");
        let pool = AnyPoolOptions::new().max_connections(5).connect(&conn).await.unwrap();
        crate::db::schema::migrate(&pool).await.unwrap();
        let repo: Arc<dyn JobRepository> = Arc::new(SqlxJobRepository::new(pool));

        let counters = Counters::default();
        let result = commit_plan(&repo, &counters, Uuid::new_v4()).await;
        assert!(matches!(result, Err(PlannerError::NotFound(_))));
    }
}
