//! PostgreSQL [`TaskStore`] built on SQLx.
//!
//! Schema lives in `migrations/0001_compliance_tasks.sql`. The two
//! conditional operations map onto single statements:
//!
//! - `claim_approval`: `UPDATE ... WHERE needs_approval = TRUE`, won when one
//!   row is affected.
//! - `create_instance`: `INSERT ... ON CONFLICT DO NOTHING` against the
//!   partial unique index on `(parent_task_id, compliance_start_date,
//!   compliance_end_date)` for auto-generated tasks.
//! - `create_approved_task`: the same against the partial unique index on
//!   `parent_task_id` for regular tasks.

use async_trait::async_trait;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use super::{TaskQuery, TaskStore};
use crate::error::StoreResult;
use crate::models::{NewTask, Task, TaskId, TaskPatch, TaskStatusRecord, TenantId};

const MIGRATION: &str = include_str!("../../migrations/0001_compliance_tasks.sql");

const TASK_COLUMNS: &str = "id, tenant_id, title, description, client_id, entity_id, is_admin, \
    task_category_id, service_type_id, assignee_id, status_id, due_date, parent_task_id, \
    compliance_frequency, compliance_duration, compliance_start_date, compliance_end_date, \
    compliance_period, compliance_year, is_recurring, is_auto_generated, needs_approval, \
    is_canceled, canceled_at, activated_at, is_billable, budgeted_hours, billing_rate, \
    fixed_fee, custom_fields, created_at, updated_at";

const INSERT_COLUMNS: &str = "tenant_id, title, description, client_id, entity_id, is_admin, \
    task_category_id, service_type_id, assignee_id, status_id, due_date, parent_task_id, \
    compliance_frequency, compliance_duration, compliance_start_date, compliance_end_date, \
    compliance_period, compliance_year, is_recurring, is_auto_generated, needs_approval, \
    is_billable, budgeted_hours, billing_rate, fixed_fee, custom_fields";

#[derive(Debug, FromRow)]
struct StatusRow {
    id: i64,
    tenant_id: i64,
    name: String,
    rank: i32,
    role: Option<String>,
}

impl From<StatusRow> for TaskStatusRecord {
    fn from(row: StatusRow) -> Self {
        let role = row.role.as_deref().and_then(|r| match r.parse() {
            Ok(role) => Some(role),
            Err(e) => {
                tracing::warn!(status_id = row.id, error = %e, "Ignoring unknown status role");
                None
            }
        });
        TaskStatusRecord {
            id: row.id,
            tenant_id: row.tenant_id,
            name: row.name,
            rank: row.rank,
            role,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PgTaskStore {
    pool: PgPool,
}

impl PgTaskStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply the bundled schema. Idempotent.
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::raw_sql(MIGRATION).execute(&self.pool).await?;
        Ok(())
    }

    fn insert_builder(task: &NewTask) -> QueryBuilder<'_, Postgres> {
        let mut builder = QueryBuilder::new(format!("INSERT INTO compliance_tasks ({INSERT_COLUMNS}) "));
        builder.push_values(std::iter::once(task), |mut row, t| {
            row.push_bind(t.tenant_id)
                .push_bind(&t.title)
                .push_bind(&t.description)
                .push_bind(t.client_id)
                .push_bind(t.entity_id)
                .push_bind(t.is_admin)
                .push_bind(t.task_category_id)
                .push_bind(t.service_type_id)
                .push_bind(t.assignee_id)
                .push_bind(t.status_id)
                .push_bind(t.due_date)
                .push_bind(t.parent_task_id)
                .push_bind(&t.compliance_frequency)
                .push_bind(&t.compliance_duration)
                .push_bind(t.compliance_start_date)
                .push_bind(t.compliance_end_date)
                .push_bind(&t.compliance_period)
                .push_bind(t.compliance_year)
                .push_bind(t.is_recurring)
                .push_bind(t.is_auto_generated)
                .push_bind(t.needs_approval)
                .push_bind(t.is_billable)
                .push_bind(t.budgeted_hours)
                .push_bind(t.billing_rate)
                .push_bind(t.fixed_fee)
                .push_bind(&t.custom_fields);
        });
        builder
    }
}

#[async_trait]
impl TaskStore for PgTaskStore {
    async fn list_tenants(&self) -> StoreResult<Vec<TenantId>> {
        let ids = sqlx::query_scalar::<_, i64>(
            "SELECT id FROM compliance_tenants WHERE is_active ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    async fn get_tasks(&self, query: &TaskQuery) -> StoreResult<Vec<Task>> {
        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM compliance_tasks \
             WHERE tenant_id = $1 \
               AND ($2::BIGINT IS NULL OR client_id = $2) \
               AND ($3::BIGINT IS NULL OR entity_id = $3) \
               AND ($4::BOOLEAN IS NULL OR is_admin = $4) \
             ORDER BY id"
        );
        let tasks = sqlx::query_as::<_, Task>(&sql)
            .bind(query.tenant_id)
            .bind(query.client_id)
            .bind(query.entity_id)
            .bind(query.is_admin)
            .fetch_all(&self.pool)
            .await?;
        Ok(tasks)
    }

    async fn get_task(&self, id: TaskId, tenant_id: TenantId) -> StoreResult<Option<Task>> {
        let sql =
            format!("SELECT {TASK_COLUMNS} FROM compliance_tasks WHERE id = $1 AND tenant_id = $2");
        let task = sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(task)
    }

    async fn create_task(&self, task: NewTask) -> StoreResult<Task> {
        let mut builder = Self::insert_builder(&task);
        builder.push(" RETURNING ").push(TASK_COLUMNS);
        let created = builder
            .build_query_as::<Task>()
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn create_instance(&self, task: NewTask) -> StoreResult<Option<Task>> {
        let mut builder = Self::insert_builder(&task);
        builder
            .push(
                " ON CONFLICT (parent_task_id, compliance_start_date, compliance_end_date) \
                 WHERE is_auto_generated = TRUE AND parent_task_id IS NOT NULL \
                 DO NOTHING RETURNING ",
            )
            .push(TASK_COLUMNS);
        let created = builder
            .build_query_as::<Task>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(created)
    }

    async fn create_approved_task(&self, task: NewTask) -> StoreResult<Option<Task>> {
        let mut builder = Self::insert_builder(&task);
        builder
            .push(
                " ON CONFLICT (parent_task_id) \
                 WHERE is_auto_generated = FALSE AND parent_task_id IS NOT NULL \
                 DO NOTHING RETURNING ",
            )
            .push(TASK_COLUMNS);
        let created = builder
            .build_query_as::<Task>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(created)
    }

    async fn update_task(
        &self,
        id: TaskId,
        tenant_id: TenantId,
        patch: &TaskPatch,
    ) -> StoreResult<Option<Task>> {
        let mut builder: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("UPDATE compliance_tasks SET updated_at = LOCALTIMESTAMP");
        if let Some(status_id) = patch.status_id {
            builder.push(", status_id = ").push_bind(status_id);
        }
        if let Some(is_recurring) = patch.is_recurring {
            builder.push(", is_recurring = ").push_bind(is_recurring);
        }
        if let Some(needs_approval) = patch.needs_approval {
            builder.push(", needs_approval = ").push_bind(needs_approval);
        }
        if let Some(is_canceled) = patch.is_canceled {
            builder.push(", is_canceled = ").push_bind(is_canceled);
        }
        if let Some(canceled_at) = patch.canceled_at {
            builder.push(", canceled_at = ").push_bind(canceled_at);
        }
        if let Some(activated_at) = patch.activated_at {
            builder.push(", activated_at = ").push_bind(activated_at);
        }
        builder
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" AND tenant_id = ")
            .push_bind(tenant_id)
            .push(" RETURNING ")
            .push(TASK_COLUMNS);

        let updated = builder
            .build_query_as::<Task>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(updated)
    }

    async fn claim_approval(&self, id: TaskId, tenant_id: TenantId) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE compliance_tasks \
             SET needs_approval = FALSE, updated_at = LOCALTIMESTAMP \
             WHERE id = $1 AND tenant_id = $2 AND needs_approval = TRUE",
        )
        .bind(id)
        .bind(tenant_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn delete_task(&self, id: TaskId, tenant_id: TenantId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM compliance_tasks WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_task_statuses(&self, tenant_id: TenantId) -> StoreResult<Vec<TaskStatusRecord>> {
        let rows = sqlx::query_as::<_, StatusRow>(
            "SELECT id, tenant_id, name, rank, role FROM compliance_task_statuses \
             WHERE tenant_id = $1 ORDER BY rank, id",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(TaskStatusRecord::from).collect())
    }

    async fn get_tenant_setting(
        &self,
        tenant_id: TenantId,
        key: &str,
    ) -> StoreResult<Option<String>> {
        let value = sqlx::query_scalar::<_, String>(
            "SELECT value FROM compliance_tenant_settings WHERE tenant_id = $1 AND key = $2",
        )
        .bind(tenant_id)
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;
        Ok(value)
    }

    async fn set_tenant_setting(
        &self,
        tenant_id: TenantId,
        key: &str,
        value: &str,
    ) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO compliance_tenant_settings (tenant_id, key, value) VALUES ($1, $2, $3) \
             ON CONFLICT (tenant_id, key) DO UPDATE SET value = EXCLUDED.value",
        )
        .bind(tenant_id)
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
