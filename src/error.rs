// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Error and diagnostic types shared by the engine modules.

use std::fmt;

pub type EngineResult<T> = Result<T, EngineError>;

/// Failures surfaced by engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("invalid period {year}-{month:02}: month must be between 1 and 12")]
    InvalidPeriod { year: i32, month: u32 },

    #[error("invalid installment count '{0}': expected a whole number of at least 2")]
    InvalidInstallmentCount(String),

    /// I/O failure from the persistence collaborator, passed through unchanged.
    #[error("persistence failure: {0}")]
    Persistence(Box<dyn std::error::Error + Send + Sync>),
}

impl From<rusqlite::Error> for EngineError {
    fn from(e: rusqlite::Error) -> Self {
        EngineError::Persistence(Box::new(e))
    }
}

/// Which stored record a diagnostic is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordRef {
    Transaction(i64),
    Budget(i64),
    Category(i64),
}

impl fmt::Display for RecordRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordRef::Transaction(id) => write!(f, "transaction #{}", id),
            RecordRef::Budget(id) => write!(f, "budget #{}", id),
            RecordRef::Category(id) => write!(f, "category #{}", id),
        }
    }
}

/// Non-fatal data problem. The offending record is skipped or re-attributed,
/// never the whole computation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntegrityWarning {
    #[error("{record}: expense without a group")]
    MissingGroup { record: RecordRef },

    #[error("{record}: income without a source")]
    MissingSource { record: RecordRef },

    #[error("{record}: references unknown category #{category_id}")]
    UnknownCategory { record: RecordRef, category_id: i64 },

    #[error("{record}: references unknown source #{source_id}")]
    UnknownSource { record: RecordRef, source_id: i64 },

    #[error("{record}: subgroup #{subgroup_id} belongs to group #{actual_parent}, not #{group_id}")]
    SubgroupParentMismatch {
        record: RecordRef,
        group_id: i64,
        subgroup_id: i64,
        actual_parent: i64,
    },

    #[error("{record}: value must be positive")]
    NonPositiveValue { record: RecordRef },

    #[error("{record}: nested more than two levels deep, collapsed onto group #{root}")]
    NestedTooDeep { record: RecordRef, root: i64 },

    #[error("{record}: parent chain is broken or cyclic")]
    BrokenParentChain { record: RecordRef },

    #[error("{record}: month {month} is outside 1-12")]
    InvalidBudgetMonth { record: RecordRef, month: u32 },
}

impl IntegrityWarning {
    pub fn record(&self) -> RecordRef {
        match self {
            IntegrityWarning::MissingGroup { record }
            | IntegrityWarning::MissingSource { record }
            | IntegrityWarning::UnknownCategory { record, .. }
            | IntegrityWarning::UnknownSource { record, .. }
            | IntegrityWarning::SubgroupParentMismatch { record, .. }
            | IntegrityWarning::NonPositiveValue { record }
            | IntegrityWarning::NestedTooDeep { record, .. }
            | IntegrityWarning::BrokenParentChain { record }
            | IntegrityWarning::InvalidBudgetMonth { record, .. } => *record,
        }
    }
}
