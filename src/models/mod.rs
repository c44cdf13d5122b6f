#[cfg(any(test, feature = "test-utils"))]
pub mod factories;
pub mod lineage;
pub mod task;
pub mod task_status;

// Re-export core models for easy access
pub use lineage::TaskLineage;
pub use task::{NewTask, Task, TaskId, TaskPatch, TaskRole, TenantId};
pub use task_status::{resolve_status, StatusRole, TaskStatusRecord};
