//! Timer model and resolution.

mod declaration;
mod execution;
mod job;
mod resolver;

pub use declaration::{FlowElementKind, TimerDeclaration, TimerField};
pub use execution::{Execution, ExecutionSnapshot};
pub use job::{JobType, TimerJob, INITIAL_REVISION};
pub use resolver::{TimerResolver, DEFAULT_RETRIES};
