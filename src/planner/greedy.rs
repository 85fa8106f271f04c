//! Deterministic greedy packer (§4.5, C5).

use std::collections::HashSet;

use tracing::{debug, instrument};
use uuid::Uuid;

use crate::cost::{demurrage_cost, freight_cost, idle_cost, scalarized_total};
use crate::distance::distance_km;
use crate::domain::{Order, OrderStatus, Rake, RakeStatus, Stockyard};
use crate::inventory::InventoryLedger;
use crate::planner::types::{AssignedOrderResult, PlanRakeResult, PlanResult, PlannerConfig};
use crate::sourcing::select_source;

pub const ALGORITHM_TAG: &str = "greedy";

/// Runs the greedy packer over a snapshot of pending orders, stockyards and
/// available rakes.
#[instrument(skip_all, fields(orders = orders.len(), rakes = rakes.len()))]
pub fn plan(orders: &[Order], stockyards: &[Stockyard], rakes: &[Rake], config: &PlannerConfig) -> PlanResult {
    plan_tagged(orders, stockyards, rakes, config, ALGORITHM_TAG)
}

/// Same algorithm, with a caller-supplied algorithm tag — used by the
/// CP-SAT packer and the hybrid dispatcher when they fall back to greedy
/// but need to stamp a different tag (§4.6, §4.7).
pub fn plan_tagged(
    orders: &[Order],
    stockyards: &[Stockyard],
    rakes: &[Rake],
    config: &PlannerConfig,
    algorithm: &str,
) -> PlanResult {
    let mut sorted_orders: Vec<&Order> = orders.iter().filter(|o| o.status == OrderStatus::Pending).collect();
    sorted_orders.sort_by(|a, b| a.priority.cmp(&b.priority).then(a.due_date.cmp(&b.due_date)));

    let available_rakes: Vec<&Rake> = rakes.iter().filter(|r| r.status == RakeStatus::Available).collect();

    if sorted_orders.is_empty() || available_rakes.is_empty() {
        return PlanResult::empty(orders.len(), algorithm.to_string());
    }

    let mut ledger = InventoryLedger::from_snapshot(stockyards);
    let mut assigned: HashSet<Uuid> = HashSet::new();
    let mut plan_rakes: Vec<PlanRakeResult> = Vec::new();

    for rake in &available_rakes {
        if assigned.len() >= sorted_orders.len() {
            break;
        }

        if let Some(pack) = pack_rake(rake, &sorted_orders, &assigned, stockyards, &mut ledger, config) {
            if pack.total_weight >= config.min_rake_size {
                for id in pack.order_ids() {
                    assigned.insert(id);
                }
                plan_rakes.push(pack);
            }
        }
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

    debug!(
        rakes_packed = plan_rakes.len(),
        orders_fulfilled = assigned.len(),
        "greedy pack complete"
    );

    PlanResult {
        total_cost: scalarized_total(total_freight, total_demurrage, total_idle, &weights),
        freight_cost: total_freight,
        demurrage_cost: total_demurrage,
        idle_cost: total_idle,
        utilization_pct,
        orders_fulfilled: assigned.len(),
        total_orders: orders.len(),
        rakes: plan_rakes,
        algorithm: algorithm.to_string(),
    }
}

/// Packs a single rake by sweeping the priority-sorted order list once.
/// Orders never split across rakes; a rake loads from a single origin.
fn pack_rake(
    rake: &Rake,
    orders: &[&Order],
    assigned: &HashSet<Uuid>,
    stockyards: &[Stockyard],
    ledger: &mut InventoryLedger,
    config: &PlannerConfig,
) -> Option<PlanRakeResult> {
    let mut current_weight = 0.0;
    let mut destinations: Vec<String> = Vec::new();
    let mut origin: Option<&Stockyard> = None;
    let mut freight_total = 0.0;
    let mut rake_orders: Vec<AssignedOrderResult> = Vec::new();

    for order in orders {
        if assigned.contains(&order.id) {
            continue;
        }

        if current_weight + order.quantity_tonnes > rake.total_capacity_tonnes {
            continue;
        }

        if !config.allow_multi_destination
            && !destinations.is_empty()
            && !destinations.contains(&order.destination)
        {
            continue;
        }

        let Some(source) = select_source(order, stockyards, ledger) else {
            continue;
        };

        match origin {
            None => origin = Some(source),
            Some(adopted) if adopted.code != source.code => continue,
            _ => {}
        }

        if !ledger.have(&source.code, &order.product_code, order.quantity_tonnes) {
            continue;
        }

        ledger.reserve(&source.code, &order.product_code, order.quantity_tonnes);

        current_weight += order.quantity_tonnes;
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
    }

    if rake_orders.is_empty() {
        return None;
    }

    let utilization_pct = 100.0 * current_weight / rake.total_capacity_tonnes;
    let demurrage = demurrage_cost(utilization_pct, config.demurrage_rate);
    let idle = idle_cost(rake_orders.len(), config.idle_cost);

    Some(PlanRakeResult {
        rake_number: rake.rake_number.clone(),
        origin_stockyard_code: origin.map(|o| o.code.clone()),
        origin_stockyard_name: origin.map(|o| o.name.clone()),
        destinations,
        orders: rake_orders,
        total_weight: current_weight,
        capacity: rake.total_capacity_tonnes,
        utilization_pct,
        freight_cost: freight_total,
        demurrage_cost: demurrage,
        idle_cost: idle,
        wagon_type: rake.wagon_type_code.clone(),
        num_wagons: rake.num_wagons,
    })
}


#[cfg(test)]
mod proptests {
    use super::*;
    use chrono::{Duration, Utc};
    use proptest::prelude::*;
    use std::collections::HashMap;

    const RAKE_CAPACITY: f64 = 3480.0;

    fn mk_order(number: usize, qty: f64, priority: i32, due_offset_days: i64) -> Order {
        Order {
            id: Uuid::new_v4(),
            order_number: format!("ORD{number}"),
            product_code: "COAL".to_string(),
            quantity_tonnes: qty,
            source_stockyard_id: None,
            destination: "Dest1".to_string(),
            destination_latitude: None,
            destination_longitude: None,
            priority,
            due_date: Utc::now() + Duration::days(due_offset_days),
            sla_hours: 72.0,
            status: OrderStatus::Pending,
        }
    }

    fn mk_rake(number: usize) -> Rake {
        Rake {
            id: Uuid::new_v4(),
            rake_number: format!("RK{number}"),
            wagon_type_code: "BOXN".to_string(),
            num_wagons: 58,
            total_capacity_tonnes: RAKE_CAPACITY,
            status: RakeStatus::Available,
            current_location: None,
        }
    }

    fn mk_stockyard() -> Stockyard {
        // Abundant inventory — these properties are about packing, not starvation.
        Stockyard {
            id: Uuid::new_v4(),
            code: "SY001".to_string(),
            name: "SY001".to_string(),
            location: "x".to_string(),
            latitude: None,
            longitude: None,
            capacity_tonnes: 10_000_000.0,
            current_inventory: HashMap::from([("COAL".to_string(), 10_000_000.0)]),
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]
        #[test]
        fn greedy_pack_respects_universal_invariants(
            quantities in prop::collection::vec(100.0..3000.0f64, 1..10),
            priorities in prop::collection::vec(1..5i32, 1..10),
            due_offsets in prop::collection::vec(0..10i64, 1..10),
            rake_count in 1..4usize,
        ) {
            let n = quantities.len().min(priorities.len()).min(due_offsets.len());
            let orders: Vec<Order> = (0..n)
                .map(|i| mk_order(i, quantities[i], priorities[i], due_offsets[i]))
                .collect();
            let rakes: Vec<Rake> = (0..rake_count).map(mk_rake).collect();
            let stockyards = vec![mk_stockyard()];
            let config = PlannerConfig::default();

            let result = plan(&orders, &stockyards, &rakes, &config);

            // Invariant: determinism — same input, same output (§8).
            let second = plan(&orders, &stockyards, &rakes, &config);
            prop_assert_eq!(result.orders_fulfilled, second.orders_fulfilled);
            prop_assert_eq!(result.rakes.len(), second.rakes.len());
            prop_assert_eq!(result.total_cost, second.total_cost);

            // Invariant: capacity and min-rake-size bounds hold for every produced rake (§8).
            for r in &result.rakes {
                prop_assert!(r.total_weight <= r.capacity);
                prop_assert!(r.total_weight >= config.min_rake_size);

                let summed: f64 = r.orders.iter().map(|o| o.quantity_tonnes).sum();
                prop_assert!((summed - r.total_weight).abs() < 1e-6);
            }

            // Invariant: an order appears in at most one rake (§8).
            let mut seen = std::collections::HashSet::new();
            for r in &result.rakes {
                for o in &r.orders {
                    prop_assert!(seen.insert(o.order_id), "order {} assigned twice", o.order_number);
                }
            }
        }
    }
}
