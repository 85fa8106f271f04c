use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cost::CostWeights;

/// Strategy selection for the planner dispatcher (§4.7, §6).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlannerMode {
    Greedy,
    Optimal,
    Hybrid,
}

impl Default for PlannerMode {
    fn default() -> Self {
        PlannerMode::Greedy
    }
}

fn default_min_rake_size() -> f64 {
    1000.0
}
fn default_freight_rate() -> f64 {
    2.5
}
fn default_demurrage_rate() -> f64 {
    500.0
}
fn default_idle_cost() -> f64 {
    100.0
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CostWeightsConfig {
    pub freight: f64,
    pub demurrage: f64,
    pub idle: f64,
}

impl Default for CostWeightsConfig {
    fn default() -> Self {
        let w = CostWeights::default();
        Self {
            freight: w.freight,
            demurrage: w.demurrage,
            idle: w.idle,
        }
    }
}

impl From<CostWeightsConfig> for CostWeights {
    fn from(c: CostWeightsConfig) -> Self {
        CostWeights {
            freight: c.freight,
            demurrage: c.demurrage,
            idle: c.idle,
        }
    }
}

/// Per-job planner configuration (§6). All fields are optional on the wire
/// (`serde(default)`), so a caller can submit `{}` and get the documented
/// defaults.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub mode: PlannerMode,
    pub allow_multi_destination: bool,
    #[serde(default = "default_min_rake_size")]
    pub min_rake_size: f64,
    pub cost_weights: CostWeightsConfig,
    #[serde(default = "default_freight_rate")]
    pub freight_rate: f64,
    #[serde(default = "default_demurrage_rate")]
    pub demurrage_rate: f64,
    #[serde(default = "default_idle_cost")]
    pub idle_cost: f64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            mode: PlannerMode::default(),
            allow_multi_destination: false,
            min_rake_size: default_min_rake_size(),
            cost_weights: CostWeightsConfig::default(),
            freight_rate: default_freight_rate(),
            demurrage_rate: default_demurrage_rate(),
            idle_cost: default_idle_cost(),
        }
    }
}

impl PlannerConfig {
    pub fn cost_weights(&self) -> CostWeights {
        self.cost_weights.into()
    }
}

/// One order as denormalized onto a packed rake, before persistence.
#[derive(Clone, Debug)]
pub struct AssignedOrderResult {
    pub order_id: Uuid,
    pub order_number: String,
    pub product_code: String,
    pub quantity_tonnes: f64,
    pub destination: String,
    pub freight_cost: f64,
}

/// One rake's pack, produced by a strategy (C5/C6) before persistence.
#[derive(Clone, Debug)]
pub struct PlanRakeResult {
    pub rake_number: String,
    pub origin_stockyard_code: Option<String>,
    pub origin_stockyard_name: Option<String>,
    pub destinations: Vec<String>,
    pub orders: Vec<AssignedOrderResult>,
    pub total_weight: f64,
    pub capacity: f64,
    pub utilization_pct: f64,
    pub freight_cost: f64,
    pub demurrage_cost: f64,
    pub idle_cost: f64,
    pub wagon_type: String,
    pub num_wagons: i32,
}

impl PlanRakeResult {
    pub fn order_ids(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.orders.iter().map(|o| o.order_id)
    }
}

/// The full output of a planning strategy (§3 `Plan`, §4.2).
#[derive(Clone, Debug)]
pub struct PlanResult {
    pub rakes: Vec<PlanRakeResult>,
    pub total_cost: f64,
    pub freight_cost: f64,
    pub demurrage_cost: f64,
    pub idle_cost: f64,
    pub utilization_pct: f64,
    pub orders_fulfilled: usize,
    pub total_orders: usize,
    pub algorithm: String,
}

impl PlanResult {
    pub fn empty(total_orders: usize, algorithm: impl Into<String>) -> Self {
        Self {
            rakes: Vec::new(),
            total_cost: 0.0,
            freight_cost: 0.0,
            demurrage_cost: 0.0,
            idle_cost: 0.0,
            utilization_pct: 0.0,
            orders_fulfilled: 0,
            total_orders,
            algorithm: algorithm.into(),
        }
    }
}
