//! Source-stockyard selection for a single order (§4.4, C4).

use crate::distance::distance_km;
use crate::domain::{Order, Stockyard};
use crate::inventory::InventoryLedger;

/// Picks a stockyard to source an order from, or `None` if none qualifies.
///
/// A pinned `source_stockyard_id` is authoritative and is returned without
/// an inventory check — if the pin turns out to be insufficient, the
/// calling pack loop simply fails to reserve and the order is dropped
/// later (documented gap, §9 Open Questions).
pub fn select_source<'a>(
    order: &Order,
    stockyards: &'a [Stockyard],
    ledger: &InventoryLedger,
) -> Option<&'a Stockyard> {
    if let Some(pinned_id) = order.source_stockyard_id {
        return stockyards.iter().find(|sy| sy.id == pinned_id);
    }

    let mut candidates: Vec<&Stockyard> = stockyards
        .iter()
        .filter(|sy| ledger.have(&sy.code, &order.product_code, order.quantity_tonnes))
        .collect();

    if candidates.is_empty() {
        return None;
    }

    match order.destination_point() {
        Some(dest) => {
            candidates.sort_by(|a, b| {
                distance_km(a.point(), Some(dest))
                    .partial_cmp(&distance_km(b.point(), Some(dest)))
                    .unwrap()
            });
        }
        None => {
            candidates.sort_by(|a, b| {
                let a_stock = ledger.remaining_of(&a.code, &order.product_code);
                let b_stock = ledger.remaining_of(&b.code, &order.product_code);
                b_stock.partial_cmp(&a_stock).unwrap()
            });
        }
    }

    candidates.into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OrderStatus;
    use chrono::Utc;
    use std::collections::HashMap;
    use uuid::Uuid;

    fn sy(code: &str, qty: f64, lat: Option<f64>, lon: Option<f64>) -> Stockyard {
        Stockyard {
            id: Uuid::new_v4(),
            code: code.to_string(),
            name: code.to_string(),
            location: "x".to_string(),
            latitude: lat,
            longitude: lon,
            capacity_tonnes: 1_000_000.0,
            current_inventory: HashMap::from([("COAL".to_string(), qty)]),
        }
    }

    fn order(quantity: f64, lat: Option<f64>, lon: Option<f64>) -> Order {
        Order {
            id: Uuid::new_v4(),
            order_number: "ORD001".to_string(),
            product_code: "COAL".to_string(),
            quantity_tonnes: quantity,
            source_stockyard_id: None,
            destination: "Dest 1".to_string(),
            destination_latitude: lat,
            destination_longitude: lon,
            priority: 1,
            due_date: Utc::now(),
            sla_hours: 72.0,
            status: OrderStatus::Pending,
        }
    }

    #[test]
    fn insufficient_stock_everywhere_returns_none() {
        let stockyards = vec![sy("SY001", 2_000.0, None, None)];
        let ledger = InventoryLedger::from_snapshot(&stockyards);
        let o = order(2_500.0, None, None);
        assert!(select_source(&o, &stockyards, &ledger).is_none());
    }

    #[test]
    fn without_coordinates_picks_most_stocked() {
        let stockyards = vec![sy("SY001", 5_000.0, None, None), sy("SY002", 9_000.0, None, None)];
        let ledger = InventoryLedger::from_snapshot(&stockyards);
        let o = order(1_000.0, None, None);
        let picked = select_source(&o, &stockyards, &ledger).unwrap();
        assert_eq!(picked.code, "SY002");
    }

    #[test]
    fn with_coordinates_picks_nearest() {
        let near = sy("NEAR", 5_000.0, Some(28.6), Some(77.2));
        let far = sy("FAR", 9_000.0, Some(10.0), Some(10.0));
        let stockyards = vec![far.clone(), near.clone()];
        let ledger = InventoryLedger::from_snapshot(&stockyards);
        let o = order(1_000.0, Some(28.7), Some(77.3));
        let picked = select_source(&o, &stockyards, &ledger).unwrap();
        assert_eq!(picked.code, "NEAR");
    }

    #[test]
    fn pinned_source_bypasses_inventory_check() {
        let sy_empty = sy("SY001", 0.0, None, None);
        let stockyards = vec![sy_empty.clone()];
        let ledger = InventoryLedger::from_snapshot(&stockyards);
        let mut o = order(2_500.0, None, None);
        o.source_stockyard_id = Some(sy_empty.id);
        let picked = select_source(&o, &stockyards, &ledger).unwrap();
        assert_eq!(picked.code, "SY001");
    }
}
