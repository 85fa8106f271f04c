pub mod job;
pub mod order;
pub mod plan;
pub mod rake;
pub mod stockyard;

pub use job::{JobStatus, PlanningJob};
pub use order::{Order, OrderStatus};
pub use plan::{AssignedOrder, Plan, PlanRake};
pub use rake::{Rake, RakeStatus};
pub use stockyard::Stockyard;
