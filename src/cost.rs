//! Cost decomposition for a candidate rake pack (§4.2, C2).

/// Weights applied when scalarizing the three cost components into one
/// total for strategy comparison (§4.2, §6).
#[derive(Clone, Copy, Debug)]
pub struct CostWeights {
    pub freight: f64,
    pub demurrage: f64,
    pub idle: f64,
}

impl Default for CostWeights {
    fn default() -> Self {
        Self {
            freight: 1.0,
            demurrage: 0.5,
            idle: 0.3,
        }
    }
}

/// Utilization below this threshold is considered "underutilized enough" to
/// incur demurrage.
pub const DEMURRAGE_UTILIZATION_THRESHOLD_PCT: f64 = 75.0;

pub fn freight_cost(distance_km: f64, quantity_tonnes: f64, freight_rate: f64) -> f64 {
    distance_km * quantity_tonnes * freight_rate
}

/// One day's demurrage when utilization falls short of the loaded-enough
/// threshold, else zero.
pub fn demurrage_cost(utilization_pct: f64, demurrage_rate: f64) -> f64 {
    if utilization_pct < DEMURRAGE_UTILIZATION_THRESHOLD_PCT {
        demurrage_rate * 24.0
    } else {
        0.0
    }
}

/// Per-order handling-time proxy: two idle-hours charged per order.
pub fn idle_cost(order_count: usize, idle_rate: f64) -> f64 {
    idle_rate * (order_count as f64 * 2.0)
}

pub fn scalarized_total(freight: f64, demurrage: f64, idle: f64, weights: &CostWeights) -> f64 {
    weights.freight * freight + weights.demurrage * demurrage + weights.idle * idle
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demurrage_applies_below_threshold() {
        assert_eq!(demurrage_cost(74.9, 500.0), 500.0 * 24.0);
        assert_eq!(demurrage_cost(75.0, 500.0), 0.0);
        assert_eq!(demurrage_cost(100.0, 500.0), 0.0);
    }

    #[test]
    fn idle_scales_with_order_count() {
        assert_eq!(idle_cost(0, 100.0), 0.0);
        assert_eq!(idle_cost(3, 100.0), 100.0 * 6.0);
    }

    #[test]
    fn scalarized_total_applies_default_weights() {
        let w = CostWeights::default();
        let total = scalarized_total(1000.0, 12000.0, 600.0, &w);
        assert!((total - (1000.0 + 6000.0 + 180.0)).abs() < 1e-9);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]
        #[test]
        fn freight_cost_is_monotone_in_distance_and_quantity(
            distance in 0.0..10_000.0f64,
            quantity in 0.0..100_000.0f64,
            rate in 0.01..10.0f64,
        ) {
            let base = freight_cost(distance, quantity, rate);
            prop_assert!(freight_cost(distance + 1.0, quantity, rate) >= base);
            prop_assert!(freight_cost(distance, quantity + 1.0, rate) >= base);
            prop_assert!(base >= 0.0);
        }

        #[test]
        fn demurrage_cost_is_a_threshold_step(utilization_pct in 0.0..150.0f64, rate in 0.0..1000.0f64) {
            let cost = demurrage_cost(utilization_pct, rate);
            if utilization_pct < DEMURRAGE_UTILIZATION_THRESHOLD_PCT {
                prop_assert_eq!(cost, rate * 24.0);
            } else {
                prop_assert_eq!(cost, 0.0);
            }
        }

        #[test]
        fn idle_cost_scales_linearly_with_order_count(order_count in 0..1000usize, rate in 0.0..1000.0f64) {
            prop_assert_eq!(idle_cost(order_count, rate), rate * (order_count as f64 * 2.0));
        }

        #[test]
        fn scalarized_total_is_nonnegative_for_nonnegative_inputs(
            freight in 0.0..1_000_000.0f64,
            demurrage in 0.0..1_000_000.0f64,
            idle in 0.0..1_000_000.0f64,
        ) {
            let w = CostWeights::default();
            prop_assert!(scalarized_total(freight, demurrage, idle, &w) >= 0.0);
        }
    }
}
