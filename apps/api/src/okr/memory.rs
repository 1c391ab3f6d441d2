//! In-memory `OkrRepository` for tests, with switchable write failures.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::AppError;
use crate::okr::models::{Objective, Period};
use crate::okr::repository::{ObjectiveMutation, OkrRepository};

#[derive(Default)]
pub struct MemoryOkrRepository {
    objectives: Mutex<HashMap<Uuid, Objective>>,
    fail_writes: AtomicBool,
}

impl MemoryOkrRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent write fail with a transient error.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn snapshot(&self, id: Uuid) -> Option<Objective> {
        self.objectives.lock().unwrap().get(&id).cloned()
    }

    fn check_writable(&self) -> Result<(), AppError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Transient("simulated storage outage".to_string()));
        }
        Ok(())
    }
}

fn sorted(mut objectives: Vec<Objective>) -> Vec<Objective> {
    objectives.sort_by(|a, b| {
        (a.year, a.period, a.created_at).cmp(&(b.year, b.period, b.created_at))
    });
    objectives
}

#[async_trait]
impl OkrRepository for MemoryOkrRepository {
    async fn insert(&self, objective: &Objective) -> Result<(), AppError> {
        self.check_writable()?;
        self.objectives
            .lock()
            .unwrap()
            .insert(objective.id, objective.clone());
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Objective>, AppError> {
        Ok(self.snapshot(id))
    }

    async fn list_for_employee(
        &self,
        employee_id: Uuid,
        year: Option<i32>,
    ) -> Result<Vec<Objective>, AppError> {
        let objectives = self.objectives.lock().unwrap();
        Ok(sorted(
            objectives
                .values()
                .filter(|o| o.employee_id == employee_id)
                .filter(|o| year.map_or(true, |y| o.year == y))
                .cloned()
                .collect(),
        ))
    }

    async fn list_open_for_period(
        &self,
        year: i32,
        period: Period,
    ) -> Result<Vec<Objective>, AppError> {
        let objectives = self.objectives.lock().unwrap();
        Ok(sorted(
            objectives
                .values()
                .filter(|o| o.year == year && o.period == period && !o.is_archived())
                .cloned()
                .collect(),
        ))
    }

    async fn modify(&self, id: Uuid, mutation: ObjectiveMutation) -> Result<Objective, AppError> {
        let mut objectives = self.objectives.lock().unwrap();
        let current = objectives
            .get(&id)
            .ok_or_else(|| AppError::NotFound(format!("Objective {id} not found")))?;

        let mut updated = current.clone();
        mutation(&mut updated)?;
        self.check_writable()?;

        objectives.insert(id, updated.clone());
        Ok(updated)
    }

    async fn archive(&self, ids: &[Uuid], archived_at: DateTime<Utc>) -> Result<u64, AppError> {
        self.check_writable()?;
        let mut objectives = self.objectives.lock().unwrap();
        let mut changed = 0;
        for id in ids {
            if let Some(objective) = objectives.get_mut(id) {
                if !objective.is_archived() {
                    objective.mark_archived(archived_at);
                    changed += 1;
                }
            }
        }
        Ok(changed)
    }
}
