use std::time::Duration;
use tracing::{Span, field};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

pub fn init_tracing(json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let base = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        // Includes timing when the span closes
        .with_span_events(fmt::format::FmtSpan::CLOSE);

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(base.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(base.pretty())
            .init();
    }
}

/// Root span for one job-runner pass, carrying `job_id` through every log
/// line it emits.
pub fn job_span(job_id: &uuid::Uuid) -> Span {
    tracing::info_span!("job", job_id = %job_id, plan_id = field::Empty)
}

pub fn annotate_plan(plan_id: &uuid::Uuid) {
    Span::current().record("plan_id", &field::display(plan_id));
}

pub async fn warn_if_slow<F, T>(label: &'static str, max: Duration, fut: F) -> T
where
    F: std::future::Future<Output = T>,
{
    let start = std::time::Instant::now();
    let out = fut.await;
    let elapsed = start.elapsed();
    if elapsed > max {
        tracing::warn!(
            target: "performance",
            label = label,
            elapsed_ms = elapsed.as_millis() as u64,
            "slow operation detected"
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[tokio::test]
    #[traced_test]
    async fn warn_if_slow_logs_when_future_exceeds_budget() {
        warn_if_slow("snapshot_orders", Duration::from_millis(1), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
        })
        .await;

        assert!(logs_contain("slow operation detected"));
    }

    #[tokio::test]
    #[traced_test]
    async fn warn_if_slow_is_silent_under_budget() {
        warn_if_slow("snapshot_orders", Duration::from_secs(5), async {}).await;

        assert!(!logs_contain("slow operation detected"));
    }
}
