#![allow(dead_code)]

pub mod strategies;

use chrono::{NaiveDate, NaiveDateTime};
use std::sync::Arc;

use compliance_core::clock::FixedClock;
use compliance_core::config::EngineConfig;
use compliance_core::models::Task;
use compliance_core::orchestration::ComplianceEngine;
use compliance_core::store::InMemoryTaskStore;

pub const TENANT: i64 = 1;

pub fn at(year: i32, month: u32, day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// An engine over an in-memory store pinned to `now`, with one tenant whose
/// statuses follow the legacy name/rank convention.
pub struct Fixture {
    pub store: Arc<InMemoryTaskStore>,
    pub engine: ComplianceEngine,
}

impl Fixture {
    pub fn at(now: NaiveDateTime) -> Self {
        Self::with_config(now, EngineConfig::default())
    }

    pub fn with_config(now: NaiveDateTime, config: EngineConfig) -> Self {
        let clock = Arc::new(FixedClock(now));
        let store = Arc::new(InMemoryTaskStore::with_clock(clock.clone()));
        store.seed_default_statuses(TENANT);
        let engine = ComplianceEngine::with_clock(store.clone(), clock, config);
        Self { store, engine }
    }

    /// A second engine sharing this fixture's store, running at `now`.
    pub fn engine_at(&self, now: NaiveDateTime) -> ComplianceEngine {
        ComplianceEngine::with_clock(
            self.store.clone(),
            Arc::new(FixedClock(now)),
            EngineConfig::default(),
        )
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.store.tasks(TENANT)
    }

    pub fn task(&self, id: i64) -> Task {
        self.tasks()
            .into_iter()
            .find(|t| t.id == id)
            .unwrap_or_else(|| panic!("task {id} not found"))
    }

    pub fn instances(&self) -> Vec<Task> {
        self.tasks()
            .into_iter()
            .filter(|t| t.is_auto_generated)
            .collect()
    }

    /// Regular tasks approved from an instance.
    pub fn approved(&self) -> Vec<Task> {
        let instance_ids: Vec<i64> = self.instances().iter().map(|t| t.id).collect();
        self.tasks()
            .into_iter()
            .filter(|t| {
                !t.is_auto_generated
                    && t.parent_task_id.is_some_and(|p| instance_ids.contains(&p))
            })
            .collect()
    }
}
