// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! What the recurrence propagator needs from persistence, plus an in-memory
//! backend for tests and embedders. The SQLite backend lives in [`crate::db`].

use crate::error::{EngineError, EngineResult};
use crate::models::{Budget, Fingerprint, NewBudget};
use crate::period::Period;
use std::collections::HashSet;
use std::sync::Mutex;

pub trait BudgetStore {
    /// All budgets stored for `period`, any mode.
    fn budgets_in(&self, period: Period) -> EngineResult<Vec<Budget>>;

    /// Whether the user removed `fingerprint` from `period` on purpose.
    fn is_suppressed(&self, period: Period, fingerprint: &Fingerprint) -> EngineResult<bool>;

    /// Inserts `budget` unless its month already holds a record with the same
    /// fingerprint. The existence check must be repeated at insert time, not
    /// trusted from an earlier read. `Ok(None)` means nothing was written.
    fn insert_if_absent(&self, budget: &NewBudget) -> EngineResult<Option<Budget>>;
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    budgets: Vec<Budget>,
    suppressed: HashSet<(Period, Fingerprint)>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_budgets(budgets: Vec<Budget>) -> Self {
        let next_id = budgets.iter().map(|b| b.id).max().unwrap_or(0);
        InMemoryStore {
            inner: Mutex::new(Inner {
                next_id,
                budgets,
                suppressed: HashSet::new(),
            }),
        }
    }

    fn lock(&self) -> EngineResult<std::sync::MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|e| EngineError::Persistence(e.to_string().into()))
    }

    /// Stores a budget unconditionally, as a user edit would.
    pub fn insert(&self, budget: NewBudget) -> EngineResult<Budget> {
        let mut inner = self.lock()?;
        inner.next_id += 1;
        let stored = budget.into_budget(inner.next_id);
        inner.budgets.push(stored.clone());
        Ok(stored)
    }

    /// Deletes a budget; with `suppress`, remembers that its definition must
    /// not come back in that month.
    pub fn remove(&self, id: i64, suppress: bool) -> EngineResult<Option<Budget>> {
        let mut inner = self.lock()?;
        let Some(pos) = inner.budgets.iter().position(|b| b.id == id) else {
            return Ok(None);
        };
        let removed = inner.budgets.remove(pos);
        if suppress {
            if let (Ok(period), Some(fp)) = (removed.period(), removed.fingerprint()) {
                inner.suppressed.insert((period, fp));
            }
        }
        Ok(Some(removed))
    }

    pub fn all(&self) -> EngineResult<Vec<Budget>> {
        Ok(self.lock()?.budgets.clone())
    }
}

impl BudgetStore for InMemoryStore {
    fn budgets_in(&self, period: Period) -> EngineResult<Vec<Budget>> {
        Ok(self
            .lock()?
            .budgets
            .iter()
            .filter(|b| b.in_period(period))
            .cloned()
            .collect())
    }

    fn is_suppressed(&self, period: Period, fingerprint: &Fingerprint) -> EngineResult<bool> {
        Ok(self.lock()?.suppressed.contains(&(period, *fingerprint)))
    }

    fn insert_if_absent(&self, budget: &NewBudget) -> EngineResult<Option<Budget>> {
        let mut inner = self.lock()?;
        let fp = budget.fingerprint();
        let taken = inner.budgets.iter().any(|b| {
            b.year == budget.year && b.month == budget.month && b.fingerprint() == fp
        });
        if taken {
            return Ok(None);
        }
        inner.next_id += 1;
        let stored = budget.clone().into_budget(inner.next_id);
        inner.budgets.push(stored.clone());
        Ok(Some(stored))
    }
}
