// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::Thresholds;
use rust_decimal::Decimal;
use serde::Serialize;

pub const DEFAULT_MIN_POINTS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendResult {
    pub direction: TrendDirection,
    pub points: Vec<Decimal>,
    /// First-to-last change in percent; `None` when it is undefined
    /// (too few points or a zero starting value) or does not fit a `Decimal`.
    pub change_percent: Option<Decimal>,
}

impl TrendDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            TrendDirection::Up => "up",
            TrendDirection::Down => "down",
            TrendDirection::Neutral => "neutral",
        }
    }
}

pub fn analyze_trend(series: &[Decimal], min_points: usize) -> TrendResult {
    analyze_trend_with(&Thresholds::default(), series, min_points)
}

pub fn analyze_trend_with(t: &Thresholds, series: &[Decimal], min_points: usize) -> TrendResult {
    let (first, last) = match (series.first(), series.last()) {
        (Some(f), Some(l)) if series.len() >= min_points.max(1) => (*f, *l),
        _ => {
            return TrendResult {
                direction: TrendDirection::Neutral,
                points: Vec::new(),
                change_percent: None,
            };
        }
    };

    if first.is_zero() {
        let direction = if last > Decimal::ZERO {
            TrendDirection::Up
        } else if last < Decimal::ZERO {
            TrendDirection::Down
        } else {
            TrendDirection::Neutral
        };
        return TrendResult {
            direction,
            points: series.to_vec(),
            change_percent: None,
        };
    }

    let Some(change) = last
        .checked_sub(first)
        .and_then(|delta| delta.checked_div(first.abs()))
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
    else {
        // too large to represent, so certainly past the significance band
        let direction = if last > first {
            TrendDirection::Up
        } else {
            TrendDirection::Down
        };
        return TrendResult {
            direction,
            points: series.to_vec(),
            change_percent: None,
        };
    };
    let direction = if change >= t.significant_change {
        TrendDirection::Up
    } else if change <= -t.significant_change {
        TrendDirection::Down
    } else {
        TrendDirection::Neutral
    };
    TrendResult {
        direction,
        points: series.to_vec(),
        change_percent: Some(change),
    }
}
