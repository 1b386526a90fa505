mod plan;
mod progress;
mod service;
mod workflow;

// Public API of the test subsystem.
pub use crate::error::SessionError;
pub use plan::{TestBuilder, TestPlan};
pub use progress::TestProgress;
pub use service::TestSession;
pub use workflow::{FinishedTest, TestService};
