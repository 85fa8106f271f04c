//! Planner dispatcher (§4.7, C7): picks a strategy module by
//! [`types::PlannerMode`] and runs it over a snapshot of domain data.

pub mod cp_sat;
pub mod greedy;
pub mod types;

use std::panic::AssertUnwindSafe;

use tracing::instrument;

use crate::domain::{Order, Rake, Stockyard};
use crate::error::PlannerError;
use types::{PlanResult, PlannerConfig, PlannerMode};

/// Runs the configured strategy. `Hybrid` runs the greedy packer once,
/// attempts the MILP packer, and returns whichever has the lower
/// scalarized total cost, tagged with the winner's own algorithm string
/// (§4.7, §9 "hybrid composes by result comparison"). If the MILP attempt
/// panics, hybrid falls back to the greedy result with the tag
/// overridden to "hybrid (greedy only)" (§4.7, §8 scenario 6).
#[instrument(skip_all, fields(mode = ?config.mode))]
pub fn run(
    orders: &[Order],
    stockyards: &[Stockyard],
    rakes: &[Rake],
    config: &PlannerConfig,
) -> Result<PlanResult, PlannerError> {
    match config.mode {
        PlannerMode::Greedy => Ok(greedy::plan(orders, stockyards, rakes, config)),
        PlannerMode::Optimal => Ok(cp_sat::plan(orders, stockyards, rakes, config)),
        PlannerMode::Hybrid => Ok(run_hybrid(orders, stockyards, rakes, config)),
    }
}

fn run_hybrid(orders: &[Order], stockyards: &[Stockyard], rakes: &[Rake], config: &PlannerConfig) -> PlanResult {
    let greedy_result = greedy::plan(orders, stockyards, rakes, config);

    let optimal_attempt =
        std::panic::catch_unwind(AssertUnwindSafe(|| cp_sat::plan(orders, stockyards, rakes, config)));

    match optimal_attempt {
        Ok(optimal_result) if optimal_result.total_cost <= greedy_result.total_cost => optimal_result,
        Ok(_) => greedy_result,
        Err(panic) => {
            tracing::warn!(detail = %panic_message(&panic), "cp_sat packer panicked during hybrid dispatch, falling back to greedy");
            let mut fallback = greedy_result;
            fallback.algorithm = "hybrid (greedy only)".to_string();
            fallback
        }
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_snapshot_runs_every_mode_without_panicking() {
        for mode in [PlannerMode::Greedy, PlannerMode::Optimal, PlannerMode::Hybrid] {
            let mut config = PlannerConfig::default();
            config.mode = mode;
            let result = run(&[], &[], &[], &config).unwrap();
            assert!(result.rakes.is_empty());
        }
    }

    #[test]
    fn hybrid_never_returns_a_worse_total_cost_than_greedy_alone() {
        let mut config = PlannerConfig::default();
        config.mode = PlannerMode::Hybrid;
        let hybrid_result = run(&[], &[], &[], &config).unwrap();

        config.mode = PlannerMode::Greedy;
        let greedy_result = run(&[], &[], &[], &config).unwrap();

        assert!(hybrid_result.total_cost <= greedy_result.total_cost);
    }
}
