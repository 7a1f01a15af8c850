// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Pure folds from full transaction/budget collections to per-period
//! summaries. Callers pass everything; filtering by period happens here.

use crate::config::Thresholds;
use crate::error::{IntegrityWarning, RecordRef};
use crate::hierarchy::{Attribution, CategoryTree, UNCATEGORIZED};
use crate::models::{
    Budget, BudgetKind, Category, GroupSummary, MonthPerformance, MonthSummary, Source,
    SourceSummary, SubgroupSummary, Transaction, TransactionKind, YearlySummary,
};
use crate::period::{classify, Period, PeriodPosition};
use crate::variance::{heatmap_status_with, percentage};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};

pub const UNKNOWN_SOURCE: &str = "(no source)";

#[derive(Debug, Clone, Copy, Default)]
struct Tally {
    budgeted: Decimal,
    actual: Decimal,
}

fn log_warnings(warnings: &[IntegrityWarning]) {
    for w in warnings {
        tracing::warn!(record = %w.record(), "data integrity: {}", w);
    }
}

/// Whether `t` falls in `period` with a usable value.
fn counts_in(t: &Transaction, period: Period, warnings: &mut Vec<IntegrityWarning>) -> bool {
    if !period.contains(t.date) {
        return false;
    }
    if t.value <= Decimal::ZERO {
        warnings.push(IntegrityWarning::NonPositiveValue {
            record: RecordRef::Transaction(t.id),
        });
        return false;
    }
    true
}

pub fn compute_month_summary(
    transactions: &[Transaction],
    budgets: &[Budget],
    period: Period,
) -> MonthSummary {
    let mut warnings = Vec::new();
    let mut s = MonthSummary::default();
    for t in transactions.iter().filter(|t| counts_in(t, period, &mut warnings)) {
        match t.kind {
            TransactionKind::Earning => s.total_income += t.value,
            TransactionKind::Expense => s.total_expense += t.value,
        }
    }
    for b in budgets.iter().filter(|b| b.in_period(period)) {
        match b.kind {
            BudgetKind::Income => s.budgeted_income += b.amount,
            BudgetKind::Expense => s.budgeted_expense += b.amount,
        }
    }
    s.net_balance = s.total_income - s.total_expense;
    log_warnings(&warnings);
    s
}

/// Expense rollup per category group for one month. Groups with no record in
/// the period are left out; the uncategorized group, if any, comes last.
pub fn compute_group_summaries(
    transactions: &[Transaction],
    budgets: &[Budget],
    categories: &[Category],
    period: Period,
    include_subcategories: bool,
) -> Vec<GroupSummary> {
    let tree = CategoryTree::build(categories);
    let mut warnings = Vec::new();
    let mut attributed: Vec<(Attribution, Tally)> = Vec::new();

    let mut skipped = Vec::new();
    for t in transactions
        .iter()
        .filter(|t| t.kind == TransactionKind::Expense && counts_in(t, period, &mut skipped))
    {
        let a = tree.attribute(
            RecordRef::Transaction(t.id),
            t.group_id,
            t.subgroup_id,
            &mut warnings,
        );
        attributed.push((
            a,
            Tally {
                budgeted: Decimal::ZERO,
                actual: t.value,
            },
        ));
    }
    for b in budgets
        .iter()
        .filter(|b| b.in_period(period) && b.kind == BudgetKind::Expense)
    {
        let a = tree.attribute(
            RecordRef::Budget(b.id),
            b.group_id,
            b.subgroup_id,
            &mut warnings,
        );
        attributed.push((
            a,
            Tally {
                budgeted: b.amount,
                actual: Decimal::ZERO,
            },
        ));
    }
    log_warnings(tree.warnings());
    log_warnings(&skipped);
    log_warnings(&warnings);

    let mut groups: HashMap<Option<i64>, Tally> = HashMap::new();
    let mut subgroups: HashMap<i64, Tally> = HashMap::new();
    for (a, tally) in &attributed {
        let g = groups.entry(a.group).or_default();
        g.budgeted += tally.budgeted;
        g.actual += tally.actual;
        if let Some(sub) = a.subgroup {
            let s = subgroups.entry(sub).or_default();
            s.budgeted += tally.budgeted;
            s.actual += tally.actual;
        }
    }

    let mut out = Vec::new();
    for group in tree.groups() {
        let Some(tally) = groups.get(&Some(group.id)) else {
            continue;
        };
        let subs = if include_subcategories {
            group
                .subgroups
                .iter()
                .filter_map(|id| {
                    subgroups.get(id).map(|t| SubgroupSummary {
                        subgroup_id: *id,
                        subgroup_name: tree.name(*id).unwrap_or_default().to_string(),
                        budgeted: t.budgeted,
                        actual: t.actual,
                        remaining: t.budgeted - t.actual,
                        percentage: percentage(t.actual, t.budgeted),
                    })
                })
                .collect()
        } else {
            Vec::new()
        };
        out.push(group_summary(Some(group.id), &group.name, tally, subs));
    }
    if let Some(tally) = groups.get(&None) {
        out.push(group_summary(None, UNCATEGORIZED, tally, Vec::new()));
    }
    out
}

fn group_summary(
    id: Option<i64>,
    name: &str,
    t: &Tally,
    subgroups: Vec<SubgroupSummary>,
) -> GroupSummary {
    GroupSummary {
        group_id: id,
        group_name: name.to_string(),
        budgeted: t.budgeted,
        actual: t.actual,
        remaining: t.budgeted - t.actual,
        percentage: percentage(t.actual, t.budgeted),
        subgroups,
    }
}

/// Income-side counterpart of [`compute_group_summaries`], keyed by source.
pub fn source_summaries(
    transactions: &[Transaction],
    budgets: &[Budget],
    sources: &[Source],
    period: Period,
) -> Vec<SourceSummary> {
    let known: HashSet<i64> = sources.iter().map(|s| s.id).collect();
    let mut warnings = Vec::new();
    let mut tallies: HashMap<Option<i64>, Tally> = HashMap::new();
    let mut key_for = |record: RecordRef, source_id: Option<i64>| match source_id {
        Some(id) if known.contains(&id) => Some(id),
        Some(id) => {
            warnings.push(IntegrityWarning::UnknownSource {
                record,
                source_id: id,
            });
            None
        }
        None => {
            warnings.push(IntegrityWarning::MissingSource { record });
            None
        }
    };

    let mut skipped = Vec::new();
    for t in transactions
        .iter()
        .filter(|t| t.kind == TransactionKind::Earning && counts_in(t, period, &mut skipped))
    {
        let key = key_for(RecordRef::Transaction(t.id), t.source_id);
        tallies.entry(key).or_default().actual += t.value;
    }
    for b in budgets
        .iter()
        .filter(|b| b.in_period(period) && b.kind == BudgetKind::Income)
    {
        let key = key_for(RecordRef::Budget(b.id), b.source_id);
        tallies.entry(key).or_default().budgeted += b.amount;
    }
    log_warnings(&skipped);
    log_warnings(&warnings);

    let summary = |id: Option<i64>, name: &str, t: &Tally| SourceSummary {
        source_id: id,
        source_name: name.to_string(),
        budgeted: t.budgeted,
        actual: t.actual,
        remaining: t.budgeted - t.actual,
        percentage: percentage(t.actual, t.budgeted),
    };
    let mut out: Vec<SourceSummary> = sources
        .iter()
        .filter_map(|s| tallies.get(&Some(s.id)).map(|t| summary(Some(s.id), &s.name, t)))
        .collect();
    if let Some(t) = tallies.get(&None) {
        out.push(summary(None, UNKNOWN_SOURCE, t));
    }
    out
}

pub fn compute_yearly_summary(
    transactions: &[Transaction],
    budgets: &[Budget],
    categories: &[Category],
    year: i32,
    reference: NaiveDate,
) -> YearlySummary {
    compute_yearly_summary_with(
        &Thresholds::default(),
        transactions,
        budgets,
        categories,
        year,
        reference,
    )
}

/// Twelve month summaries of `year` plus their totals. Month totals do not
/// depend on the category tree, so `_categories` is accepted and not read.
pub fn compute_yearly_summary_with(
    thresholds: &Thresholds,
    transactions: &[Transaction],
    budgets: &[Budget],
    _categories: &[Category],
    year: i32,
    reference: NaiveDate,
) -> YearlySummary {
    let mut totals = MonthSummary::default();
    let months = Period::months_of(year)
        .map(|period| {
            let summary = compute_month_summary(transactions, budgets, period);
            totals.accumulate(&summary);
            let position = classify(period, reference);
            MonthPerformance {
                period,
                summary,
                position,
                is_future: position == PeriodPosition::Future,
                status: heatmap_status_with(
                    thresholds,
                    summary.net_balance,
                    summary.budgeted_balance(),
                ),
            }
        })
        .collect();
    YearlySummary {
        year,
        months,
        totals,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Income,
    Expense,
    Balance,
}

impl Metric {
    pub fn parse(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(Metric::Income),
            "expense" => Ok(Metric::Expense),
            "balance" => Ok(Metric::Balance),
            other => Err(anyhow::anyhow!(
                "Invalid metric '{}', expected income|expense|balance",
                other
            )),
        }
    }

    fn pick(self, s: &MonthSummary) -> Decimal {
        match self {
            Metric::Income => s.total_income,
            Metric::Expense => s.total_expense,
            Metric::Balance => s.net_balance,
        }
    }
}

/// One value per month of `yearly`, in calendar order.
pub fn monthly_series(yearly: &YearlySummary, metric: Metric, include_future: bool) -> Vec<Decimal> {
    yearly
        .months
        .iter()
        .filter(|m| include_future || !m.is_future)
        .map(|m| metric.pick(&m.summary))
        .collect()
}

/// Every integrity problem in a snapshot, without computing anything.
pub fn check_integrity(
    transactions: &[Transaction],
    budgets: &[Budget],
    categories: &[Category],
    sources: &[Source],
) -> Vec<IntegrityWarning> {
    let tree = CategoryTree::build(categories);
    let known_sources: HashSet<i64> = sources.iter().map(|s| s.id).collect();
    let mut warnings: Vec<IntegrityWarning> = tree.warnings().to_vec();

    let check_source = |record: RecordRef, source_id: Option<i64>, out: &mut Vec<_>| {
        match source_id {
            None => out.push(IntegrityWarning::MissingSource { record }),
            Some(id) if !known_sources.contains(&id) => {
                out.push(IntegrityWarning::UnknownSource {
                    record,
                    source_id: id,
                })
            }
            Some(_) => {}
        }
    };

    for t in transactions {
        let record = RecordRef::Transaction(t.id);
        if t.value <= Decimal::ZERO {
            warnings.push(IntegrityWarning::NonPositiveValue { record });
        }
        match t.kind {
            TransactionKind::Earning => check_source(record, t.source_id, &mut warnings),
            TransactionKind::Expense => {
                tree.attribute(record, t.group_id, t.subgroup_id, &mut warnings);
            }
        }
    }
    for b in budgets {
        let record = RecordRef::Budget(b.id);
        if b.period().is_err() {
            warnings.push(IntegrityWarning::InvalidBudgetMonth {
                record,
                month: b.month,
            });
        }
        match b.kind {
            BudgetKind::Income => check_source(record, b.source_id, &mut warnings),
            BudgetKind::Expense => {
                tree.attribute(record, b.group_id, b.subgroup_id, &mut warnings);
            }
        }
    }
    warnings
}
