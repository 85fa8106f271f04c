//! MILP-based packer (§4.6, C6).
//!
//! The reference system hands this model to CP-SAT (OR-Tools). There is no
//! CP-SAT binding in the Rust ecosystem that doesn't shell out to an
//! external solver process, so the same assignment model is solved here
//! with `good_lp`'s pure-Rust `microlp` backend instead — binary decision
//! variables, branch-and-bound handled inside the crate, no subprocess.
//!
//! §4.6 states the objective as a cost to *minimize*; since every
//! constraint here is `≤` and the cost terms are non-negative, a literal
//! minimize is degenerate — `x = 0` everywhere is always optimal, so the
//! solver would never assign a single order. §9's open question on this
//! objective explicitly permits extending it to parity with the greedy
//! packer instead of matching that degenerate reference behaviour; this
//! module takes that option and *maximises* packed tonnage, with the
//! algorithm tag below distinguishing the choice.

use std::time::{Duration, Instant};

use good_lp::{constraint, variable, Expression, ProblemVariables, Solution, SolverModel};
use tracing::{instrument, warn};

use crate::cost::{demurrage_cost, freight_cost, idle_cost, scalarized_total};
use crate::distance::distance_km;
use crate::domain::{Order, OrderStatus, Rake, RakeStatus, Stockyard};
use crate::inventory::InventoryLedger;
use crate::planner::greedy;
use crate::planner::types::{AssignedOrderResult, PlanRakeResult, PlanResult, PlannerConfig};
use crate::sourcing::select_source;

pub const ALGORITHM_TAG: &str = "optimal (parity-extended)";

/// Per-tonne proxy weight used in the assignment objective (§4.6).
const TONNE_PROXY_WEIGHT: f64 = 500.0;

/// Orders above this count make the assignment model impractically large
/// for a 30s solve bound; the caller falls back to greedy instead.
const MAX_ORDERS: usize = 50;
/// Rakes above this count, likewise.
const MAX_RAKES: usize = 20;

const SOLVE_TIME_LIMIT: Duration = Duration::from_secs(30);

/// Solves the assignment model, falling back to the greedy packer when the
/// problem is oversized, infeasible, or the wall-clock guard trips. The
/// fallback is tagged distinctly from a genuine `optimal` solve so callers
/// (and the job's log) can tell the two apart.
#[instrument(skip_all, fields(orders = orders.len(), rakes = rakes.len()))]
pub fn plan(orders: &[Order], stockyards: &[Stockyard], rakes: &[Rake], config: &PlannerConfig) -> PlanResult {
    let pending: Vec<&Order> = orders.iter().filter(|o| o.status == OrderStatus::Pending).collect();
    let available_rakes: Vec<&Rake> = rakes.iter().filter(|r| r.status == RakeStatus::Available).collect();

    if pending.is_empty() || available_rakes.is_empty() {
        return PlanResult::empty(orders.len(), ALGORITHM_TAG);
    }

    if pending.len() > MAX_ORDERS || available_rakes.len() > MAX_RAKES {
        warn!(
            orders = pending.len(),
            rakes = available_rakes.len(),
            "assignment model too large, falling back to greedy"
        );
        return greedy::plan_tagged(orders, stockyards, rakes, config, "hybrid (greedy fallback: scale guard)");
    }

    let started = Instant::now();
    match solve_assignment(&pending, &available_rakes, stockyards, config, started) {
        Some(assignment) => build_plan(assignment, &pending, &available_rakes, stockyards, config),
        None => {
            warn!("assignment model infeasible or timed out, falling back to greedy");
            greedy::plan_tagged(orders, stockyards, rakes, config, "hybrid (greedy fallback: infeasible/timeout)")
        }
    }
}

struct Assignment {
    /// `cells[i][j]` is `true` when order `i` is assigned to rake `j`.
    cells: Vec<Vec<bool>>,
}

/// Callers guarantee `orders` and `rakes` are both non-empty (`plan`'s
/// trivial-empty short-circuit runs first).
fn solve_assignment(
    orders: &[&Order],
    rakes: &[&Rake],
    stockyards: &[Stockyard],
    config: &PlannerConfig,
    started: Instant,
) -> Option<Assignment> {
    let ledger = InventoryLedger::from_snapshot(stockyards);

    let mut vars = ProblemVariables::new();
    let mut x = vec![vec![None; rakes.len()]; orders.len()];

    for (i, order) in orders.iter().enumerate() {
        for (j, _rake) in rakes.iter().enumerate() {
            let feasible = select_source(order, stockyards, &ledger)
                .is_some_and(|sy| ledger.have(&sy.code, &order.product_code, order.quantity_tonnes));
            if feasible {
                x[i][j] = Some(vars.add(variable().binary()));
            }
        }
    }

    if started.elapsed() > SOLVE_TIME_LIMIT {
        return None;
    }

    let mut objective = Expression::from(0.0);
    for (i, order) in orders.iter().enumerate() {
        for var in x[i].iter().flatten() {
            objective += *var * (order.quantity_tonnes * TONNE_PROXY_WEIGHT);
        }
    }

    // Maximising packed tonnage rather than literally minimizing the proxy
    // cost — see the module header for why a literal minimize degenerates.
    let mut model = vars.maximise(objective).using(good_lp::microlp);

    for row in &x {
        let mut sum = Expression::from(0.0);
        for var in row.iter().flatten() {
            sum += *var;
        }
        model = model.with(constraint!(sum <= 1));
    }

    for (j, rake) in rakes.iter().enumerate() {
        let mut load = Expression::from(0.0);
        for (i, order) in orders.iter().enumerate() {
            if let Some(var) = x[i][j] {
                load += var * order.quantity_tonnes;
            }
        }
        model = model.with(constraint!(load <= rake.total_capacity_tonnes));
    }

    if started.elapsed() > SOLVE_TIME_LIMIT {
        return None;
    }

    let solution = model.solve().ok()?;

    let mut cells = vec![vec![false; rakes.len()]; orders.len()];
    for (i, row) in x.iter().enumerate() {
        for (j, var) in row.iter().enumerate() {
            if let Some(var) = var {
                cells[i][j] = solution.value(*var) > 0.5;
            }
        }
    }

    Some(Assignment { cells })
}

fn build_plan(
    assignment: Assignment,
    orders: &[&Order],
    rakes: &[&Rake],
    stockyards: &[Stockyard],
    config: &PlannerConfig,
) -> PlanResult {
    let mut ledger = InventoryLedger::from_snapshot(stockyards);
    let mut plan_rakes: Vec<PlanRakeResult> = Vec::new();
    let mut orders_fulfilled = 0usize;

    for (j, rake) in rakes.iter().enumerate() {
        let mut total_weight = 0.0;
        let mut destinations: Vec<String> = Vec::new();
        let mut origin_code: Option<String> = None;
        let mut origin_name: Option<String> = None;
        let mut freight_total = 0.0;
        let mut rake_orders: Vec<AssignedOrderResult> = Vec::new();

        for (i, order) in orders.iter().enumerate() {
            if !assignment.cells[i][j] {
                continue;
            }

            let Some(source) = select_source(order, stockyards, &ledger) else {
                continue;
            };
            if !ledger.have(&source.code, &order.product_code, order.quantity_tonnes) {
                continue;
            }

            ledger.reserve(&source.code, &order.product_code, order.quantity_tonnes);

            total_weight += order.quantity_tonnes;
            if origin_code.is_none() {
                origin_code = Some(source.code.clone());
                origin_name = Some(source.name.clone());
            }
            if !destinations.contains(&order.destination) {
                destinations.push(order.destination.clone());
            }

            let distance = distance_km(source.point(), order.destination_point());
            let order_freight = freight_cost(distance, order.quantity_tonnes, config.freight_rate);
            freight_total += order_freight;

            rake_orders.push(AssignedOrderResult {
                order_id: order.id,
                order_number: order.order_number.clone(),
                product_code: order.product_code.clone(),
                quantity_tonnes: order.quantity_tonnes,
                destination: order.destination.clone(),
                freight_cost: order_freight,
            });
            orders_fulfilled += 1;
        }

        if rake_orders.is_empty() || total_weight < config.min_rake_size {
            continue;
        }

        let utilization_pct = 100.0 * total_weight / rake.total_capacity_tonnes;
        let demurrage = demurrage_cost(utilization_pct, config.demurrage_rate);
        let idle = idle_cost(rake_orders.len(), config.idle_cost);

        plan_rakes.push(PlanRakeResult {
            rake_number: rake.rake_number.clone(),
            origin_stockyard_code: origin_code,
            origin_stockyard_name: origin_name,
            destinations,
            orders: rake_orders,
            total_weight,
            capacity: rake.total_capacity_tonnes,
            utilization_pct,
            freight_cost: freight_total,
            demurrage_cost: demurrage,
            idle_cost: idle,
            wagon_type: rake.wagon_type_code.clone(),
            num_wagons: rake.num_wagons,
        });
    }

    let total_freight: f64 = plan_rakes.iter().map(|r| r.freight_cost).sum();
    let total_demurrage: f64 = plan_rakes.iter().map(|r| r.demurrage_cost).sum();
    let total_idle: f64 = plan_rakes.iter().map(|r| r.idle_cost).sum();
    let weights = config.cost_weights();

    let utilization_pct = if plan_rakes.is_empty() {
        0.0
    } else {
        plan_rakes.iter().map(|r| r.utilization_pct).sum::<f64>() / plan_rakes.len() as f64
    };

    PlanResult {
        total_cost: scalarized_total(total_freight, total_demurrage, total_idle, &weights),
        freight_cost: total_freight,
        demurrage_cost: total_demurrage,
        idle_cost: total_idle,
        utilization_pct,
        orders_fulfilled,
        total_orders: orders.len(),
        rakes: plan_rakes,
        algorithm: ALGORITHM_TAG.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, Utc};
    use std::collections::HashMap;
    use uuid::Uuid;

    fn mk_order(qty: f64, dest: &str) -> Order {
        Order {
            id: Uuid::new_v4(),
            order_number: format!("ORD-{qty}"),
            product_code: "COAL".to_string(),
            quantity_tonnes: qty,
            source_stockyard_id: None,
            destination: dest.to_string(),
            destination_latitude: None,
            destination_longitude: None,
            priority: 1,
            due_date: Utc::now() + ChronoDuration::days(1),
            sla_hours: 72.0,
            status: OrderStatus::Pending,
        }
    }

    fn mk_stockyard(qty: f64) -> Stockyard {
        Stockyard {
            id: Uuid::new_v4(),
            code: "SY001".to_string(),
            name: "SY001".to_string(),
            location: "x".to_string(),
            latitude: None,
            longitude: None,
            capacity_tonnes: 1_000_000.0,
            current_inventory: HashMap::from([("COAL".to_string(), qty)]),
        }
    }

    fn mk_rake(capacity: f64) -> Rake {
        Rake {
            id: Uuid::new_v4(),
            rake_number: "RK001".to_string(),
            wagon_type_code: "BOXN".to_string(),
            num_wagons: 58,
            total_capacity_tonnes: capacity,
            status: RakeStatus::Available,
            current_location: None,
        }
    }

    #[test]
    fn solves_a_small_assignment() {
        let orders = vec![mk_order(2500.0, "Dest1"), mk_order(2000.0, "Dest1")];
        let stockyards = vec![mk_stockyard(30_000.0)];
        let rakes = vec![mk_rake(3480.0)];
        let config = PlannerConfig::default();

        let result = plan(&orders, &stockyards, &rakes, &config);
        assert_eq!(result.algorithm, ALGORITHM_TAG);
        assert_eq!(result.rakes.len(), 1);
        assert_eq!(result.orders_fulfilled, 1);
    }

    #[test]
    fn oversized_problem_falls_back_to_greedy() {
        let orders: Vec<Order> = (0..51).map(|_| mk_order(100.0, "Dest1")).collect();
        let stockyards = vec![mk_stockyard(100_000.0)];
        let rakes = vec![mk_rake(3480.0)];
        let config = PlannerConfig::default();

        let result = plan(&orders, &stockyards, &rakes, &config);
        assert!(result.algorithm.starts_with("hybrid"));
    }

    #[test]
    fn empty_input_falls_back_cleanly() {
        let config = PlannerConfig::default();
        let result = plan(&[], &[], &[], &config);
        assert!(result.rakes.is_empty());
    }
}
