// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Turns "N installments of V starting at D" into N per-month records.
//!
//! Every record carries the entered value unchanged. Nothing here divides a
//! total across installments.

use crate::error::{EngineError, EngineResult};
use crate::models::{BudgetKind, BudgetMode, NewBudget, NewTransaction, TransactionKind};
use crate::period::Period;
use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;

/// Something the user entered once that becomes one record per installment.
pub trait InstallmentDraft {
    type Record;

    /// Record for installment `number` (1-based) of `count`, dated `date`.
    fn materialize(&self, date: NaiveDate, number: u32, count: u32) -> Self::Record;
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransactionDraft {
    pub kind: TransactionKind,
    pub value: Decimal,
    pub source_id: Option<i64>,
    pub group_id: Option<i64>,
    pub subgroup_id: Option<i64>,
    pub payment_method: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BudgetDraft {
    pub kind: BudgetKind,
    pub amount: Decimal,
    pub source_id: Option<i64>,
    pub group_id: Option<i64>,
    pub subgroup_id: Option<i64>,
    pub is_fixed_cost: bool,
}

impl InstallmentDraft for TransactionDraft {
    type Record = NewTransaction;

    fn materialize(&self, date: NaiveDate, number: u32, count: u32) -> NewTransaction {
        NewTransaction {
            kind: self.kind,
            value: self.value,
            date,
            source_id: self.source_id,
            group_id: self.group_id,
            subgroup_id: self.subgroup_id,
            payment_method: self.payment_method.clone(),
            installments: Some(count),
            installment_number: Some(number),
            note: self.note.clone(),
        }
    }
}

impl InstallmentDraft for BudgetDraft {
    type Record = NewBudget;

    fn materialize(&self, date: NaiveDate, number: u32, count: u32) -> NewBudget {
        let period = Period::of(date);
        NewBudget {
            year: period.year(),
            month: period.month(),
            kind: self.kind,
            source_id: self.source_id,
            group_id: self.group_id,
            subgroup_id: self.subgroup_id,
            amount: self.amount,
            mode: BudgetMode::Installment,
            installments: Some(count),
            installment_number: Some(number),
            is_fixed_cost: self.is_fixed_cost,
        }
    }
}

/// Record `i` lands `i - 1` months after `start_date`; days past the end of a
/// shorter month clamp to its last day.
pub fn expand_installments<D: InstallmentDraft>(
    draft: &D,
    count: u32,
    start_date: NaiveDate,
) -> EngineResult<Vec<D::Record>> {
    if count < 2 {
        return Err(EngineError::InvalidInstallmentCount(count.to_string()));
    }
    (1..=count)
        .map(|number| {
            let date = start_date
                .checked_add_months(Months::new(number - 1))
                .ok_or_else(|| EngineError::InvalidInstallmentCount(count.to_string()))?;
            Ok(draft.materialize(date, number, count))
        })
        .collect()
}

/// Parses user input such as `"6"`. Non-integers and counts below 2 fail.
pub fn parse_installment_count(s: &str) -> EngineResult<u32> {
    let trimmed = s.trim();
    match trimmed.parse::<u32>() {
        Ok(n) if n >= 2 => Ok(n),
        _ => Err(EngineError::InvalidInstallmentCount(trimmed.to_string())),
    }
}
