// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Carries recurring budget definitions from one month into the next.
//!
//! Each call moves definitions a single month forward. To cover a gap of
//! several months the caller walks them in order, see [`propagate_through`].

use crate::error::{EngineResult, IntegrityWarning, RecordRef};
use crate::models::{Budget, BudgetKind, BudgetMode, Fingerprint, NewBudget};
use crate::period::Period;
use crate::store::BudgetStore;
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, Default, Serialize)]
pub struct Propagation {
    pub created: Vec<Budget>,
    #[serde(skip)]
    pub warnings: Vec<IntegrityWarning>,
}

/// Copies every recurring definition of the previous month into `target`
/// unless `target` already has a record for it (whatever its amount) or the
/// user suppressed it there. Running it twice creates nothing the second time.
pub fn propagate_recurring<S: BudgetStore + ?Sized>(
    store: &S,
    target: Period,
) -> EngineResult<Propagation> {
    let previous = target.previous();
    let recurring: Vec<Budget> = store
        .budgets_in(previous)?
        .into_iter()
        .filter(|b| b.mode == BudgetMode::Recurring)
        .collect();
    let mut out = Propagation::default();
    if recurring.is_empty() {
        tracing::debug!(%target, "no recurring budgets in {}", previous);
        return Ok(out);
    }

    let existing: HashSet<Fingerprint> = store
        .budgets_in(target)?
        .iter()
        .filter_map(Budget::fingerprint)
        .collect();

    let mut seen = HashSet::new();
    for b in &recurring {
        let Some(fp) = b.fingerprint() else {
            let w = match b.kind {
                BudgetKind::Income => IntegrityWarning::MissingSource {
                    record: RecordRef::Budget(b.id),
                },
                BudgetKind::Expense => IntegrityWarning::MissingGroup {
                    record: RecordRef::Budget(b.id),
                },
            };
            tracing::warn!(record = %w.record(), "skipping recurring budget: {}", w);
            out.warnings.push(w);
            continue;
        };
        if existing.contains(&fp) || !seen.insert(fp) {
            continue;
        }
        if store.is_suppressed(target, &fp)? {
            tracing::debug!(%target, fingerprint = %fp, "recurring budget suppressed");
            continue;
        }
        let (source_id, group_id, subgroup_id) = fp.keys();
        let draft = NewBudget {
            year: target.year(),
            month: target.month(),
            kind: fp.kind(),
            source_id,
            group_id,
            subgroup_id,
            amount: b.amount,
            mode: BudgetMode::Recurring,
            installments: None,
            installment_number: None,
            is_fixed_cost: b.is_fixed_cost,
        };
        match store.insert_if_absent(&draft)? {
            Some(created) => {
                tracing::info!(%target, fingerprint = %fp, amount = %created.amount, "propagated recurring budget");
                out.created.push(created);
            }
            None => tracing::debug!(%target, fingerprint = %fp, "already present at insert time"),
        }
    }
    Ok(out)
}

/// Propagates into every month after `from` up to and including `to`, one
/// hop at a time and in order.
pub fn propagate_through<S: BudgetStore + ?Sized>(
    store: &S,
    from: Period,
    to: Period,
) -> EngineResult<Propagation> {
    let mut total = Propagation::default();
    for period in Period::range(from.next(), to) {
        let step = propagate_recurring(store, period)?;
        total.created.extend(step.created);
        total.warnings.extend(step.warnings);
    }
    Ok(total)
}
