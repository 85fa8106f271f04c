use thiserror::Error;

/// Error taxonomy for the planning service (§7).
///
/// Errors from synchronous calls (create/fetch/cancel/commit) surface as one
/// of these directly. Errors raised *inside* a background job are always
/// trapped at the job-runner boundary and converted into a `failed` job
/// status plus an appended log line — they never produce a `PlannerFailure`
/// seen by the caller that triggered the job (§4.8, §9).
#[derive(Error, Debug)]
pub enum PlannerError {
    #[error("config error: {0}")]
    Config(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("planner failure: {0}")]
    PlannerFailure(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl PlannerError {
    pub fn config(msg: impl Into<String>) -> Self {
        PlannerError::Config(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        PlannerError::NotFound(msg.into())
    }

    pub fn precondition(msg: impl Into<String>) -> Self {
        PlannerError::PreconditionFailed(msg.into())
    }
}

impl From<anyhow::Error> for PlannerError {
    fn from(e: anyhow::Error) -> Self {
        PlannerError::Internal(format!("{e:#}"))
    }
}

impl From<sqlx::Error> for PlannerError {
    fn from(e: sqlx::Error) -> Self {
        PlannerError::Internal(e.to_string())
    }
}

/// A commit-time anomaly: a referenced rake/order row is missing or not in
/// the expected state. Logged, never raised — commit never fails because of
/// this (§4.9, §7 `CommitAnomaly`).
#[derive(Clone, Debug)]
pub struct CommitAnomaly {
    pub rake_number: Option<String>,
    pub order_id: Option<uuid::Uuid>,
    pub detail: String,
}
