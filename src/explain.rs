//! Derived natural-language plan summary (§6, supplemented feature).
//!
//! No LLM call here — this formats a [`Plan`] and its [`PlanRake`]s
//! into Markdown, pure presentation over already-computed fields.

use crate::domain::{Plan, PlanRake};

pub fn explain(plan: &Plan, rakes: &[PlanRake]) -> String {
    let mut out = String::new();

    out.push_str(&format!("# Plan: {}\n\n", plan.scenario_name));
    out.push_str("## Cost breakdown\n\n");
    out.push_str(&format!("- Total cost: {:.2}\n", plan.total_cost));
    out.push_str(&format!("- Freight: {:.2}\n", plan.freight_cost));
    out.push_str(&format!("- Demurrage: {:.2}\n", plan.demurrage_cost));
    out.push_str(&format!("- Idle: {:.2}\n\n", plan.idle_cost));

    out.push_str("## Utilization\n\n");
    out.push_str(&format!("Average utilization across {} rake(s): {:.1}%.\n", rakes.len(), plan.utilization_pct));
    out.push_str(&utilization_commentary(plan.utilization_pct));
    out.push('\n');

    out.push_str(&format!(
        "\n{} of {} orders fulfilled ({:.1}%) using the `{}` algorithm.\n\n",
        plan.orders_fulfilled,
        plan.total_orders,
        fulfillment_pct(plan),
        plan.algorithm,
    ));

    out.push_str("## Rakes\n\n");
    for rake in rakes {
        out.push_str(&format!(
            "- **{}** — {:.1}t ({:.1}% utilized), {} order(s), destinations: {}\n",
            rake.rake_number,
            rake.total_weight,
            rake.utilization_pct,
            rake.orders_assigned.len(),
            rake.destinations.join(", "),
        ));
    }

    out.push_str("\n## Recommendations\n\n");
    out.push_str(&recommendations(plan, rakes));

    out
}

fn fulfillment_pct(plan: &Plan) -> f64 {
    if plan.total_orders == 0 {
        0.0
    } else {
        100.0 * plan.orders_fulfilled as f64 / plan.total_orders as f64
    }
}

fn utilization_commentary(utilization_pct: f64) -> &'static str {
    if utilization_pct >= 90.0 {
        "Rakes are loaded close to capacity; little room for additional orders without adding rakes."
    } else if utilization_pct >= 75.0 {
        "Utilization is healthy and unlikely to trigger demurrage."
    } else if utilization_pct > 0.0 {
        "Utilization is below the demurrage threshold; some rakes are underloaded."
    } else {
        "No rakes were packed."
    }
}

fn recommendations(plan: &Plan, rakes: &[PlanRake]) -> String {
    let mut lines = Vec::new();

    if plan.orders_fulfilled < plan.total_orders {
        lines.push(format!(
            "- {} order(s) remain unfulfilled; consider adding rake capacity or relaxing `min_rake_size`.",
            plan.total_orders - plan.orders_fulfilled
        ));
    }

    if rakes.iter().any(|r| r.utilization_pct < 75.0) {
        lines.push("- Some rakes are underutilized; allowing multi-destination packing may reduce demurrage.".to_string());
    }

    if lines.is_empty() {
        lines.push("- No further action recommended.".to_string());
    }

    lines.join("\n") + "\n"
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn plan() -> Plan {
        Plan {
            id: Uuid::new_v4(),
            job_id: Uuid::new_v4(),
            scenario_name: "Q3 dispatch".to_string(),
            total_cost: 1234.5,
            freight_cost: 1000.0,
            demurrage_cost: 200.0,
            idle_cost: 34.5,
            utilization_pct: 82.0,
            orders_fulfilled: 3,
            total_orders: 4,
            algorithm: "greedy".to_string(),
            committed: false,
            committed_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn includes_scenario_name_and_algorithm() {
        let rendered = explain(&plan(), &[]);
        assert!(rendered.contains("Q3 dispatch"));
        assert!(rendered.contains("greedy"));
    }

    #[test]
    fn flags_unfulfilled_orders() {
        let rendered = explain(&plan(), &[]);
        assert!(rendered.contains("1 order(s) remain unfulfilled"));
    }

    #[test]
    fn fully_fulfilled_plan_has_no_unfulfilled_recommendation() {
        let mut p = plan();
        p.orders_fulfilled = p.total_orders;
        p.utilization_pct = 95.0;
        let rendered = explain(&p, &[]);
        assert!(!rendered.contains("remain unfulfilled"));
    }
}
