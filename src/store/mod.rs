//! # Task Store Port
//!
//! The storage interface the engine depends on. Persistence itself belongs to
//! the host application; the engine only needs the operations below, each
//! scoped by tenant.
//!
//! ## Consistency requirements
//!
//! - Read-your-writes: a write that returned must be visible to the next read
//!   issued by the same caller.
//! - [`TaskStore::claim_approval`] must be a single conditional update
//!   (compare-and-swap on `needs_approval`).
//! - [`TaskStore::create_instance`] must refuse to insert a second
//!   auto-generated instance for the same template and period.
//! - [`TaskStore::create_approved_task`] must refuse to insert a second
//!   regular task under the same parent instance.
//!
//! Two adapters ship with the crate: [`InMemoryTaskStore`] and, behind the
//! `postgres` feature, [`PgTaskStore`].

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::models::{NewTask, Task, TaskId, TaskPatch, TaskStatusRecord, TenantId};

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use memory::InMemoryTaskStore;
#[cfg(feature = "postgres")]
pub use postgres::PgTaskStore;

/// Tenant-scoped task listing filter. `None` filters are not applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskQuery {
    pub tenant_id: TenantId,
    pub client_id: Option<i64>,
    pub entity_id: Option<i64>,
    pub is_admin: Option<bool>,
}

impl TaskQuery {
    pub fn for_tenant(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            ..Self::default()
        }
    }

    /// Same tenant, client, entity and admin scope as `task`.
    pub fn scoped_to(task: &Task) -> Self {
        Self {
            tenant_id: task.tenant_id,
            client_id: task.client_id,
            entity_id: task.entity_id,
            is_admin: Some(task.is_admin),
        }
    }

    pub fn matches(&self, task: &Task) -> bool {
        task.tenant_id == self.tenant_id
            && self.client_id.map_or(true, |c| task.client_id == Some(c))
            && self.entity_id.map_or(true, |e| task.entity_id == Some(e))
            && self.is_admin.map_or(true, |a| task.is_admin == a)
    }
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Every tenant the batch run should visit.
    async fn list_tenants(&self) -> StoreResult<Vec<TenantId>>;

    async fn get_tasks(&self, query: &TaskQuery) -> StoreResult<Vec<Task>>;

    async fn get_task(&self, id: TaskId, tenant_id: TenantId) -> StoreResult<Option<Task>>;

    async fn create_task(&self, task: NewTask) -> StoreResult<Task>;

    /// Insert an auto-generated instance of `task.parent_task_id`.
    ///
    /// Returns `None`, inserting nothing, when that template already has an
    /// auto-generated child with the same compliance start and end dates.
    async fn create_instance(&self, task: NewTask) -> StoreResult<Option<Task>>;

    /// Insert a regular task approved from `task.parent_task_id`.
    ///
    /// Returns `None`, inserting nothing, when that parent already has a
    /// non-auto-generated child.
    async fn create_approved_task(&self, task: NewTask) -> StoreResult<Option<Task>>;

    async fn update_task(
        &self,
        id: TaskId,
        tenant_id: TenantId,
        patch: &TaskPatch,
    ) -> StoreResult<Option<Task>>;

    /// Atomically flip `needs_approval` from true to false.
    ///
    /// Returns whether this call performed the flip.
    async fn claim_approval(&self, id: TaskId, tenant_id: TenantId) -> StoreResult<bool>;

    async fn delete_task(&self, id: TaskId, tenant_id: TenantId) -> StoreResult<bool>;

    /// Statuses for a tenant, ordered by rank.
    async fn get_task_statuses(&self, tenant_id: TenantId) -> StoreResult<Vec<TaskStatusRecord>>;

    async fn get_tenant_setting(&self, tenant_id: TenantId, key: &str)
        -> StoreResult<Option<String>>;

    async fn set_tenant_setting(&self, tenant_id: TenantId, key: &str, value: &str)
        -> StoreResult<()>;
}
