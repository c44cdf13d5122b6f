//! # Task Lineage
//!
//! Arena view over a tenant's tasks, keyed by id, with a parent -> children
//! index. Answers the lineage questions the engine asks without re-deriving
//! roles from flag combinations at every call site:
//!
//! - which instances share a template (siblings),
//! - whether an instance already produced its regular task,
//! - whether a template already has an instance for a given period.

use std::collections::HashMap;

use super::{Task, TaskId, TaskRole};
use crate::period::CompliancePeriod;

#[derive(Debug, Default)]
pub struct TaskLineage {
    tasks: HashMap<TaskId, Task>,
    children: HashMap<TaskId, Vec<TaskId>>,
}

impl TaskLineage {
    pub fn from_tasks(tasks: impl IntoIterator<Item = Task>) -> Self {
        let mut lineage = Self::default();
        for task in tasks {
            if let Some(parent) = task.parent_task_id {
                lineage.children.entry(parent).or_default().push(task.id);
            }
            lineage.tasks.insert(task.id, task);
        }
        for ids in lineage.children.values_mut() {
            ids.sort_unstable();
        }
        lineage
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(&id)
    }

    /// Every task in the arena, in no particular order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    pub fn role(&self, id: TaskId) -> Option<TaskRole> {
        self.get(id).map(Task::role)
    }

    pub fn parent(&self, id: TaskId) -> Option<&Task> {
        self.get(id)
            .and_then(|t| t.parent_task_id)
            .and_then(|p| self.get(p))
    }

    pub fn children(&self, id: TaskId) -> impl Iterator<Item = &Task> {
        self.children
            .get(&id)
            .into_iter()
            .flatten()
            .filter_map(|child| self.tasks.get(child))
    }

    /// Auto-generated instances materialized from `template_id`.
    pub fn instances_of(&self, template_id: TaskId) -> impl Iterator<Item = &Task> {
        self.children(template_id)
            .filter(|t| t.role() == TaskRole::Instance)
    }

    /// Other instances generated from the same template as `instance_id`.
    pub fn siblings(&self, instance_id: TaskId) -> Vec<&Task> {
        let Some(parent) = self.get(instance_id).and_then(|t| t.parent_task_id) else {
            return Vec::new();
        };
        self.instances_of(parent)
            .filter(|t| t.id != instance_id)
            .collect()
    }

    /// The regular task an instance was approved into, if any.
    pub fn approved_child(&self, instance_id: TaskId) -> Option<&Task> {
        self.children(instance_id).find(|t| !t.is_auto_generated)
    }

    /// True when no sibling instance covers a strictly later period.
    pub fn is_latest_period(&self, instance_id: TaskId) -> bool {
        let Some(end) = self
            .get(instance_id)
            .and_then(Task::compliance_window)
            .map(|w| w.end)
        else {
            return true;
        };
        !self
            .siblings(instance_id)
            .iter()
            .filter_map(|s| s.compliance_window())
            .any(|w| w.end > end)
    }

    /// The instance `template_id` already produced for `period`, if any.
    pub fn instance_for_period(
        &self,
        template_id: TaskId,
        period: &CompliancePeriod,
    ) -> Option<&Task> {
        self.instances_of(template_id).find(|t| t.covers_period(period))
    }
}
