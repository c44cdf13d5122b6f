// Lifecycle state machine for scheduler-generated tasks.
//
// The state is derived from the task's own flags (`is_canceled`,
// `activated_at`); there is no separate transition table.

pub mod events;
pub mod guards;
pub mod states;
pub mod task_lifecycle;

// Re-export main types for convenient access
pub use events::LifecycleEvent;
pub use guards::LifecycleGuard;
pub use states::LifecycleState;
pub use task_lifecycle::{TaskLifecycle, TransitionOutcome};
