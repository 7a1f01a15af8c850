// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::EngineResult;
use crate::period::{Period, PeriodPosition};
use crate::variance::HeatmapTier;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A group when `parent_id` is `None`, a subgroup otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub parent_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Earning,
    Expense,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetKind {
    Income,
    Expense,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetMode {
    Unique,
    Recurring,
    Installment,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionKind::Earning => "earning",
            TransactionKind::Expense => "expense",
        }
    }

    pub fn parse(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "earning" | "income" => Ok(TransactionKind::Earning),
            "expense" => Ok(TransactionKind::Expense),
            other => Err(anyhow::anyhow!(
                "Invalid transaction type '{}', expected earning|expense",
                other
            )),
        }
    }
}

impl BudgetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BudgetKind::Income => "income",
            BudgetKind::Expense => "expense",
        }
    }

    pub fn parse(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(BudgetKind::Income),
            "expense" => Ok(BudgetKind::Expense),
            other => Err(anyhow::anyhow!(
                "Invalid budget type '{}', expected income|expense",
                other
            )),
        }
    }
}

impl BudgetMode {
    pub fn as_str(self) -> &'static str {
        match self {
            BudgetMode::Unique => "unique",
            BudgetMode::Recurring => "recurring",
            BudgetMode::Installment => "installment",
        }
    }

    pub fn parse(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "unique" => Ok(BudgetMode::Unique),
            "recurring" => Ok(BudgetMode::Recurring),
            "installment" => Ok(BudgetMode::Installment),
            other => Err(anyhow::anyhow!(
                "Invalid budget mode '{}', expected unique|recurring|installment",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub kind: TransactionKind,
    pub value: Decimal,
    pub date: NaiveDate,
    pub source_id: Option<i64>,
    pub group_id: Option<i64>,
    pub subgroup_id: Option<i64>,
    pub payment_method: Option<String>,
    pub installments: Option<u32>,
    pub installment_number: Option<u32>,
    pub note: Option<String>,
}

/// A transaction that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub kind: TransactionKind,
    pub value: Decimal,
    pub date: NaiveDate,
    pub source_id: Option<i64>,
    pub group_id: Option<i64>,
    pub subgroup_id: Option<i64>,
    pub payment_method: Option<String>,
    pub installments: Option<u32>,
    pub installment_number: Option<u32>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub id: i64,
    pub year: i32,
    pub month: u32,
    pub kind: BudgetKind,
    pub source_id: Option<i64>,
    pub group_id: Option<i64>,
    pub subgroup_id: Option<i64>,
    pub amount: Decimal, // per month, per installment
    pub mode: BudgetMode,
    pub installments: Option<u32>,
    pub installment_number: Option<u32>,
    pub is_fixed_cost: bool,
}

/// A budget that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBudget {
    pub year: i32,
    pub month: u32,
    pub kind: BudgetKind,
    pub source_id: Option<i64>,
    pub group_id: Option<i64>,
    pub subgroup_id: Option<i64>,
    pub amount: Decimal,
    pub mode: BudgetMode,
    pub installments: Option<u32>,
    pub installment_number: Option<u32>,
    pub is_fixed_cost: bool,
}

/// Identity of a budget definition independent of its month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Fingerprint {
    Income {
        source_id: i64,
    },
    Expense {
        group_id: i64,
        subgroup_id: Option<i64>,
    },
}

impl Fingerprint {
    /// `None` when the keys required by `kind` are missing.
    pub fn from_parts(
        kind: BudgetKind,
        source_id: Option<i64>,
        group_id: Option<i64>,
        subgroup_id: Option<i64>,
    ) -> Option<Self> {
        match kind {
            BudgetKind::Income => source_id.map(|source_id| Fingerprint::Income { source_id }),
            BudgetKind::Expense => group_id.map(|group_id| Fingerprint::Expense {
                group_id,
                subgroup_id,
            }),
        }
    }

    pub fn kind(&self) -> BudgetKind {
        match self {
            Fingerprint::Income { .. } => BudgetKind::Income,
            Fingerprint::Expense { .. } => BudgetKind::Expense,
        }
    }

    /// (source_id, group_id, subgroup_id) as stored.
    pub fn keys(&self) -> (Option<i64>, Option<i64>, Option<i64>) {
        match *self {
            Fingerprint::Income { source_id } => (Some(source_id), None, None),
            Fingerprint::Expense {
                group_id,
                subgroup_id,
            } => (None, Some(group_id), subgroup_id),
        }
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fingerprint::Income { source_id } => write!(f, "income:{}", source_id),
            Fingerprint::Expense {
                group_id,
                subgroup_id: Some(sub),
            } => write!(f, "expense:{}:{}", group_id, sub),
            Fingerprint::Expense {
                group_id,
                subgroup_id: None,
            } => write!(f, "expense:{}", group_id),
        }
    }
}

impl Budget {
    pub fn period(&self) -> EngineResult<Period> {
        Period::new(self.year, self.month)
    }

    pub fn in_period(&self, period: Period) -> bool {
        self.year == period.year() && self.month == period.month()
    }

    pub fn fingerprint(&self) -> Option<Fingerprint> {
        Fingerprint::from_parts(self.kind, self.source_id, self.group_id, self.subgroup_id)
    }
}

impl NewBudget {
    pub fn fingerprint(&self) -> Option<Fingerprint> {
        Fingerprint::from_parts(self.kind, self.source_id, self.group_id, self.subgroup_id)
    }

    pub fn into_budget(self, id: i64) -> Budget {
        Budget {
            id,
            year: self.year,
            month: self.month,
            kind: self.kind,
            source_id: self.source_id,
            group_id: self.group_id,
            subgroup_id: self.subgroup_id,
            amount: self.amount,
            mode: self.mode,
            installments: self.installments,
            installment_number: self.installment_number,
            is_fixed_cost: self.is_fixed_cost,
        }
    }
}

impl NewTransaction {
    pub fn into_transaction(self, id: i64) -> Transaction {
        Transaction {
            id,
            kind: self.kind,
            value: self.value,
            date: self.date,
            source_id: self.source_id,
            group_id: self.group_id,
            subgroup_id: self.subgroup_id,
            payment_method: self.payment_method,
            installments: self.installments,
            installment_number: self.installment_number,
            note: self.note,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MonthSummary {
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub budgeted_income: Decimal,
    pub budgeted_expense: Decimal,
    pub net_balance: Decimal,
}

impl MonthSummary {
    pub fn budgeted_balance(&self) -> Decimal {
        self.budgeted_income - self.budgeted_expense
    }

    /// Elementwise sum, used for year totals.
    pub fn accumulate(&mut self, other: &MonthSummary) {
        self.total_income += other.total_income;
        self.total_expense += other.total_expense;
        self.budgeted_income += other.budgeted_income;
        self.budgeted_expense += other.budgeted_expense;
        self.net_balance += other.net_balance;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubgroupSummary {
    pub subgroup_id: i64,
    pub subgroup_name: String,
    pub budgeted: Decimal,
    pub actual: Decimal,
    pub remaining: Decimal,
    pub percentage: Decimal,
}

/// Per-group rollup. `group_id` is `None` for the synthetic uncategorized group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub group_id: Option<i64>,
    pub group_name: String,
    pub budgeted: Decimal,
    pub actual: Decimal,
    pub remaining: Decimal,
    pub percentage: Decimal,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subgroups: Vec<SubgroupSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceSummary {
    pub source_id: Option<i64>,
    pub source_name: String,
    pub budgeted: Decimal,
    pub actual: Decimal,
    pub remaining: Decimal,
    pub percentage: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthPerformance {
    pub period: Period,
    pub summary: MonthSummary,
    pub position: PeriodPosition,
    pub is_future: bool,
    pub status: HeatmapTier,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearlySummary {
    pub year: i32,
    pub months: Vec<MonthPerformance>,
    pub totals: MonthSummary,
}
