//! Shared test helpers for `workpulse-core` integration tests.
//!
//! In-memory implementations of every store port with call counters and
//! fault injection, plus a harness that wires them to a mock clock.

#![allow(dead_code)]

pub mod stores;

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use workpulse_common::time::{Clock, MockClock};
use workpulse_core::EngineStores;
use workpulse_domain::TaskType;

pub use stores::{FaultPlan, InMemoryCatalog, InMemorySessions, InMemoryTaskLogs, InMemoryWorkDays};

pub const ACTOR: &str = "actor-1";

/// Fixed start instant for every test clock.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
}

pub struct Harness {
    pub clock: MockClock,
    pub sessions: Arc<InMemorySessions>,
    pub task_logs: Arc<InMemoryTaskLogs>,
    pub work_days: Arc<InMemoryWorkDays>,
    pub catalog: Arc<InMemoryCatalog>,
}

impl Harness {
    pub fn new() -> Self {
        Self::starting_at(t0())
    }

    pub fn starting_at(at: DateTime<Utc>) -> Self {
        let catalog = InMemoryCatalog::default();
        catalog.insert(TaskType {
            id: "inspection".into(),
            name: "Site inspection".into(),
            category: None,
        });
        catalog.insert(TaskType { id: "survey".into(), name: "Survey".into(), category: None });

        Self {
            clock: MockClock::starting_at(at),
            sessions: Arc::new(InMemorySessions::default()),
            task_logs: Arc::new(InMemoryTaskLogs::default()),
            work_days: Arc::new(InMemoryWorkDays::default()),
            catalog: Arc::new(catalog),
        }
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::new(self.clock.clone())
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.utc_now()
    }

    pub fn stores(&self) -> EngineStores {
        EngineStores {
            sessions: self.sessions.clone(),
            task_logs: self.task_logs.clone(),
            work_days: self.work_days.clone(),
            catalog: self.catalog.clone(),
        }
    }
}
