use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::planner::types::PlanResult;

/// An order assignment denormalized onto a `PlanRake` so the plan stays
/// meaningful after reference rows mutate or are deleted (§3 "Lifecycle &
/// ownership").
#[derive(Clone, Debug)]
pub struct AssignedOrder {
    pub order_id: Uuid,
    pub order_number: String,
    pub product_code: String,
    pub quantity_tonnes: f64,
    pub destination: String,
    pub freight_cost: f64,
}

/// One rake's worth of a plan: its origin, destinations, and assigned orders.
#[derive(Clone, Debug)]
pub struct PlanRake {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub rake_number: String,
    pub origin_stockyard_id: Option<Uuid>,
    pub destinations: Vec<String>,
    pub orders_assigned: Vec<AssignedOrder>,
    pub total_weight: f64,
    pub utilization_pct: f64,
    pub freight_cost: f64,
}

/// The outcome of a completed planning job (§3). Exists only for a job that
/// reached `completed`.
#[derive(Clone, Debug)]
pub struct Plan {
    pub id: Uuid,
    pub job_id: Uuid,
    pub scenario_name: String,
    pub total_cost: f64,
    pub freight_cost: f64,
    pub demurrage_cost: f64,
    pub idle_cost: f64,
    pub utilization_pct: f64,
    pub orders_fulfilled: i32,
    pub total_orders: i32,
    pub algorithm: String,
    pub committed: bool,
    pub committed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Plan {
    pub fn from_result(job_id: Uuid, scenario_name: String, result: &PlanResult, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            job_id,
            scenario_name,
            total_cost: result.total_cost,
            freight_cost: result.freight_cost,
            demurrage_cost: result.demurrage_cost,
            idle_cost: result.idle_cost,
            utilization_pct: result.utilization_pct,
            orders_fulfilled: result.orders_fulfilled as i32,
            total_orders: result.total_orders as i32,
            algorithm: result.algorithm.clone(),
            committed: false,
            committed_at: None,
            created_at: now,
        }
    }
}
