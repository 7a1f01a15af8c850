// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::Thresholds;
use rust_decimal::Decimal;
use serde::Serialize;

/// Spend on a single budget line against its amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusTier {
    Ok,
    Warning,
    Critical,
    Exceeded,
}

/// A month's actual balance against its budgeted balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HeatmapTier {
    Excellent,
    Good,
    Warning,
    Danger,
}

impl StatusTier {
    pub fn as_str(self) -> &'static str {
        match self {
            StatusTier::Ok => "ok",
            StatusTier::Warning => "warning",
            StatusTier::Critical => "critical",
            StatusTier::Exceeded => "exceeded",
        }
    }
}

impl HeatmapTier {
    pub fn as_str(self) -> &'static str {
        match self {
            HeatmapTier::Excellent => "excellent",
            HeatmapTier::Good => "good",
            HeatmapTier::Warning => "warning",
            HeatmapTier::Danger => "danger",
        }
    }
}

pub fn budget_status(actual: Decimal, budgeted: Decimal) -> StatusTier {
    budget_status_with(&Thresholds::default(), actual, budgeted)
}

pub fn budget_status_with(t: &Thresholds, actual: Decimal, budgeted: Decimal) -> StatusTier {
    if budgeted <= Decimal::ZERO {
        return StatusTier::Ok;
    }
    // a positive budget too small to divide by is overspent by any positive actual
    let Some(ratio) = actual.checked_div(budgeted) else {
        return if actual > Decimal::ZERO {
            StatusTier::Exceeded
        } else {
            StatusTier::Ok
        };
    };
    if ratio >= t.exceeded_ratio {
        StatusTier::Exceeded
    } else if ratio >= t.critical_ratio {
        StatusTier::Critical
    } else if ratio >= t.warning_ratio {
        StatusTier::Warning
    } else {
        StatusTier::Ok
    }
}

pub fn heatmap_status(actual_balance: Decimal, budgeted_balance: Decimal) -> HeatmapTier {
    heatmap_status_with(&Thresholds::default(), actual_balance, budgeted_balance)
}

/// With no positive target only the sign of the outcome matters.
pub fn heatmap_status_with(
    t: &Thresholds,
    actual_balance: Decimal,
    budgeted_balance: Decimal,
) -> HeatmapTier {
    if budgeted_balance <= Decimal::ZERO {
        return if actual_balance >= Decimal::ZERO {
            HeatmapTier::Good
        } else {
            HeatmapTier::Danger
        };
    }
    let Some(pct) = actual_balance
        .checked_div(budgeted_balance)
        .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
    else {
        return if actual_balance > Decimal::ZERO {
            HeatmapTier::Excellent
        } else {
            HeatmapTier::Danger
        };
    };
    if pct >= t.heatmap_excellent {
        HeatmapTier::Excellent
    } else if pct >= t.heatmap_good {
        HeatmapTier::Good
    } else if pct >= t.heatmap_warning {
        HeatmapTier::Warning
    } else {
        HeatmapTier::Danger
    }
}

/// `part / whole * 100`, or 0 when `whole <= 0`. Saturates at
/// `Decimal::MAX`/`Decimal::MIN` when the result does not fit.
pub fn percentage(part: Decimal, whole: Decimal) -> Decimal {
    if whole <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    part.checked_div(whole)
        .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or(if part > Decimal::ZERO {
            Decimal::MAX
        } else {
            Decimal::MIN
        })
}
