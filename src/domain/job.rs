use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::planner::types::PlannerConfig;

/// State machine over a planning job (§4.8).
///
/// ```text
/// queued ── start ──▶ running ── ok ──▶ completed
///                         │
///                         ├── error ──▶ failed
///                         │
///                         └── cancel ─▶ cancelled
/// queued  ── cancel ──▶ cancelled
/// completed / failed / cancelled are terminal
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "queued" => Some(JobStatus::Queued),
            "running" => Some(JobStatus::Running),
            "completed" => Some(JobStatus::Completed),
            "failed" => Some(JobStatus::Failed),
            "cancelled" => Some(JobStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }
}

/// A planning job: the asynchronous unit of work driving C7 (§3, §4.8).
#[derive(Clone, Debug)]
pub struct PlanningJob {
    pub id: Uuid,
    pub scenario_name: String,
    pub notes: Option<String>,
    pub config: PlannerConfig,
    pub status: JobStatus,
    pub progress: u8,
    pub logs: String,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PlanningJob {
    pub fn new(scenario_name: String, config: PlannerConfig, notes: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            scenario_name,
            notes,
            config,
            status: JobStatus::Queued,
            progress: 0,
            logs: String::new(),
            started_at: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}
