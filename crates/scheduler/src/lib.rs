//! Timer-to-job scheduling core.
//!
//! [`TimerResolver`] turns a BPMN timer declaration (fixed date, duration
//! or cycle) into a [`TimerJob`] with a concrete due date, using a named
//! [`BusinessCalendar`](calendar::BusinessCalendar). Cycle timers that are
//! allowed to fire again carry a repeat string anchored at the engine
//! clock by [`prepare_repeat`].

pub mod calendar;
pub mod clock;
pub mod expression;
pub mod repeat;
pub mod timer;

// Re-exports for convenience.
pub use calendar::CalendarRegistry;
pub use clock::{Clock, ClockSnapshot, ManualClock, SystemClock};
pub use expression::{ExpressionEvaluator, TemplateEvaluator, Value, Variables, VariableScope};
pub use repeat::{prepare_repeat, prepare_repeat_at};
pub use timer::{
    Execution, ExecutionSnapshot, FlowElementKind, TimerDeclaration, TimerJob, TimerResolver,
};
