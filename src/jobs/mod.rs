pub mod repository;
pub mod repository_sqlx;
pub mod runner;

pub use repository::{CommitOutcome, JobRepository};
pub use repository_sqlx::SqlxJobRepository;
pub use runner::JobRunner;
