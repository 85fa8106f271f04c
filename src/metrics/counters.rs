use std::sync::Arc;
use std::sync::atomic::AtomicU64;

/// Minimal counters for operational visibility over the job runner (§4.8).
#[derive(Clone, Default)]
pub struct Counters {
    pub jobs_picked_up: Arc<AtomicU64>,
    pub jobs_completed: Arc<AtomicU64>,
    pub jobs_failed: Arc<AtomicU64>,
    pub jobs_cancelled: Arc<AtomicU64>,

    pub planner_fallback_scale_guard: Arc<AtomicU64>,
    pub planner_fallback_infeasible: Arc<AtomicU64>,

    pub plans_committed: Arc<AtomicU64>,
    pub commit_anomalies: Arc<AtomicU64>,
}
