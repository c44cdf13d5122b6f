//! In-memory [`TaskStore`] backed by a single `parking_lot::RwLock`.
//!
//! Every port call takes the lock once, so the conditional operations
//! (`claim_approval`, `create_instance`, `create_approved_task`) are atomic
//! with respect to each other. Used by the test suite and by embedders without a database.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use super::{TaskQuery, TaskStore};
use crate::clock::{Clock, SystemClock};
use crate::constants::INITIAL_STATUS_RANK;
use crate::error::{StoreError, StoreResult};
use crate::models::{
    NewTask, StatusRole, Task, TaskId, TaskPatch, TaskStatusRecord, TenantId,
};

#[derive(Debug, Default)]
struct MemoryState {
    tenants: BTreeSet<TenantId>,
    tasks: BTreeMap<TaskId, Task>,
    statuses: Vec<TaskStatusRecord>,
    settings: HashMap<(TenantId, String), String>,
    next_task_id: TaskId,
    next_status_id: i64,
    fail_creates: bool,
}

pub struct InMemoryTaskStore {
    state: RwLock<MemoryState>,
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryTaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Timestamps (`created_at`, `updated_at`) are read from `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: RwLock::new(MemoryState {
                next_task_id: 1,
                next_status_id: 1,
                ..MemoryState::default()
            }),
            clock,
        }
    }

    pub fn add_tenant(&self, tenant_id: TenantId) {
        self.state.write().tenants.insert(tenant_id);
    }

    /// Register a status row and return it with its assigned id.
    pub fn add_status(
        &self,
        tenant_id: TenantId,
        name: &str,
        rank: i32,
        role: Option<StatusRole>,
    ) -> TaskStatusRecord {
        let mut state = self.state.write();
        let record = TaskStatusRecord {
            id: state.next_status_id,
            tenant_id,
            name: name.to_string(),
            rank,
            role,
        };
        state.next_status_id += 1;
        state.tenants.insert(tenant_id);
        state.statuses.push(record.clone());
        record
    }

    /// The status set a new tenant starts with, without explicit roles.
    pub fn seed_default_statuses(&self, tenant_id: TenantId) -> Vec<TaskStatusRecord> {
        [
            ("New", INITIAL_STATUS_RANK),
            ("In Progress", 2),
            ("Completed", 3),
            ("Canceled", 4),
        ]
        .into_iter()
        .map(|(name, rank)| self.add_status(tenant_id, name, rank, None))
        .collect()
    }

    /// Make subsequent task inserts fail with a backend error.
    pub fn set_fail_creates(&self, fail: bool) {
        self.state.write().fail_creates = fail;
    }

    /// Snapshot of every task belonging to `tenant_id`, ordered by id.
    pub fn tasks(&self, tenant_id: TenantId) -> Vec<Task> {
        self.state
            .read()
            .tasks
            .values()
            .filter(|t| t.tenant_id == tenant_id)
            .cloned()
            .collect()
    }

    fn insert(&self, state: &mut MemoryState, new: NewTask) -> StoreResult<Task> {
        if state.fail_creates {
            return Err(StoreError::Backend("task insert rejected".to_string()));
        }
        let now = self.clock.now();
        let id = state.next_task_id;
        state.next_task_id += 1;
        state.tenants.insert(new.tenant_id);

        let task = new.into_task(id, now);
        state.tasks.insert(id, task.clone());
        Ok(task)
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn list_tenants(&self) -> StoreResult<Vec<TenantId>> {
        Ok(self.state.read().tenants.iter().copied().collect())
    }

    async fn get_tasks(&self, query: &TaskQuery) -> StoreResult<Vec<Task>> {
        Ok(self
            .state
            .read()
            .tasks
            .values()
            .filter(|t| query.matches(t))
            .cloned()
            .collect())
    }

    async fn get_task(&self, id: TaskId, tenant_id: TenantId) -> StoreResult<Option<Task>> {
        Ok(self
            .state
            .read()
            .tasks
            .get(&id)
            .filter(|t| t.tenant_id == tenant_id)
            .cloned())
    }

    async fn create_task(&self, task: NewTask) -> StoreResult<Task> {
        let mut state = self.state.write();
        self.insert(&mut state, task)
    }

    async fn create_instance(&self, task: NewTask) -> StoreResult<Option<Task>> {
        let mut state = self.state.write();
        if let Some(parent) = task.parent_task_id {
            let exists = state.tasks.values().any(|t| {
                t.parent_task_id == Some(parent)
                    && t.is_auto_generated
                    && t.compliance_start_date == task.compliance_start_date
                    && t.compliance_end_date == task.compliance_end_date
            });
            if exists {
                return Ok(None);
            }
        }
        self.insert(&mut state, task).map(Some)
    }

    async fn create_approved_task(&self, task: NewTask) -> StoreResult<Option<Task>> {
        let mut state = self.state.write();
        if let Some(parent) = task.parent_task_id {
            let exists = state
                .tasks
                .values()
                .any(|t| t.parent_task_id == Some(parent) && !t.is_auto_generated);
            if exists {
                return Ok(None);
            }
        }
        self.insert(&mut state, task).map(Some)
    }

    async fn update_task(
        &self,
        id: TaskId,
        tenant_id: TenantId,
        patch: &TaskPatch,
    ) -> StoreResult<Option<Task>> {
        let now = self.clock.now();
        let mut state = self.state.write();
        let Some(task) = state
            .tasks
            .get_mut(&id)
            .filter(|t| t.tenant_id == tenant_id)
        else {
            return Ok(None);
        };
        patch.apply(task);
        task.updated_at = now;
        Ok(Some(task.clone()))
    }

    async fn claim_approval(&self, id: TaskId, tenant_id: TenantId) -> StoreResult<bool> {
        let now = self.clock.now();
        let mut state = self.state.write();
        match state.tasks.get_mut(&id) {
            Some(task) if task.tenant_id == tenant_id && task.needs_approval => {
                task.needs_approval = false;
                task.updated_at = now;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_task(&self, id: TaskId, tenant_id: TenantId) -> StoreResult<bool> {
        let mut state = self.state.write();
        let owned = state
            .tasks
            .get(&id)
            .is_some_and(|t| t.tenant_id == tenant_id);
        if owned {
            state.tasks.remove(&id);
        }
        Ok(owned)
    }

    async fn get_task_statuses(&self, tenant_id: TenantId) -> StoreResult<Vec<TaskStatusRecord>> {
        let mut statuses: Vec<_> = self
            .state
            .read()
            .statuses
            .iter()
            .filter(|s| s.tenant_id == tenant_id)
            .cloned()
            .collect();
        statuses.sort_by_key(|s| (s.rank, s.id));
        Ok(statuses)
    }

    async fn get_tenant_setting(
        &self,
        tenant_id: TenantId,
        key: &str,
    ) -> StoreResult<Option<String>> {
        Ok(self
            .state
            .read()
            .settings
            .get(&(tenant_id, key.to_string()))
            .cloned())
    }

    async fn set_tenant_setting(
        &self,
        tenant_id: TenantId,
        key: &str,
        value: &str,
    ) -> StoreResult<()> {
        let mut state = self.state.write();
        state.tenants.insert(tenant_id);
        state
            .settings
            .insert((tenant_id, key.to_string()), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::factories::TaskFactory;

    #[tokio::test]
    async fn test_claim_approval_is_single_shot() {
        let store = InMemoryTaskStore::new();
        let task = store
            .create_task(TaskFactory::instance(1, 99).build())
            .await
            .unwrap();
        assert!(task.needs_approval);

        assert!(store.claim_approval(task.id, 1).await.unwrap());
        assert!(!store.claim_approval(task.id, 1).await.unwrap());
        // Wrong tenant never claims.
        assert!(!store.claim_approval(task.id, 2).await.unwrap());
    }

    #[tokio::test]
    async fn test_create_approved_task_refuses_second_child() {
        let store = InMemoryTaskStore::new();
        let instance = store
            .create_task(TaskFactory::instance(1, 99).build())
            .await
            .unwrap();

        let child = TaskFactory::regular(1).parent(instance.id).build();
        assert!(store.create_approved_task(child.clone()).await.unwrap().is_some());
        assert!(store.create_approved_task(child).await.unwrap().is_none());
        assert_eq!(store.tasks(1).len(), 2);
    }

    #[tokio::test]
    async fn test_create_instance_refuses_same_period_twice() {
        let store = InMemoryTaskStore::new();
        let june = TaskFactory::instance(1, 99).month(2025, 6).build();

        assert!(store.create_instance(june.clone()).await.unwrap().is_some());
        assert!(store.create_instance(june).await.unwrap().is_none());

        // Another period, or another template, is a different instance
        let july = TaskFactory::instance(1, 99).month(2025, 7).build();
        assert!(store.create_instance(july).await.unwrap().is_some());
        let other = TaskFactory::instance(1, 98).month(2025, 6).build();
        assert!(store.create_instance(other).await.unwrap().is_some());
        assert_eq!(store.tasks(1).len(), 3);
    }

    #[tokio::test]
    async fn test_tenant_isolation() {
        let store = InMemoryTaskStore::new();
        let task = store
            .create_task(TaskFactory::template(1).build())
            .await
            .unwrap();

        assert!(store.get_task(task.id, 2).await.unwrap().is_none());
        assert!(!store.delete_task(task.id, 2).await.unwrap());
        assert!(store
            .update_task(task.id, 2, &TaskPatch::new().recurring(false))
            .await
            .unwrap()
            .is_none());
        assert!(store.get_tasks(&TaskQuery::for_tenant(2)).await.unwrap().is_empty());
        assert_eq!(store.list_tenants().await.unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn test_statuses_ordered_by_rank() {
        let store = InMemoryTaskStore::new();
        store.add_status(1, "Done", 3, None);
        store.add_status(1, "New", 1, None);
        store.add_status(2, "Other tenant", 1, None);

        let statuses = store.get_task_statuses(1).await.unwrap();
        let names: Vec<_> = statuses.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["New", "Done"]);
    }

    #[tokio::test]
    async fn test_failed_create_surfaces_error() {
        let store = InMemoryTaskStore::new();
        store.set_fail_creates(true);
        let result = store.create_task(TaskFactory::template(1).build()).await;
        assert!(matches!(result, Err(StoreError::Backend(_))));
        assert!(store.tasks(1).is_empty());
    }
}
