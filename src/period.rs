// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Calendar months: ordering, adjacency and past/current/future placement
//! relative to an explicit reference date.

use crate::error::{EngineError, EngineResult};
use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

static MONTH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d{4})-(\d{1,2})\s*$").expect("static month pattern"));

/// A (year, month) pair. Field order makes the derived `Ord` chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Period {
    year: i32,
    month: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodPosition {
    Past,
    Current,
    Future,
}

impl Period {
    pub fn new(year: i32, month: u32) -> EngineResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(EngineError::InvalidPeriod { year, month });
        }
        Ok(Period { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Period {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(self) -> i32 {
        self.year
    }

    pub fn month(self) -> u32 {
        self.month
    }

    pub fn previous(self) -> Self {
        if self.month == 1 {
            Period {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Period {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    pub fn next(self) -> Self {
        if self.month == 12 {
            Period {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Period {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Moves forward by `months` whole months.
    pub fn advance(self, months: u32) -> Self {
        let zero_based = self.month as i64 - 1 + months as i64;
        Period {
            year: self.year + (zero_based / 12) as i32,
            month: (zero_based % 12) as u32 + 1,
        }
    }

    pub fn first_day(self) -> NaiveDate {
        // month is validated on construction, day 1 always exists
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// Every month from `from` to `to`, both inclusive. Empty when `from > to`.
    pub fn range(from: Period, to: Period) -> impl Iterator<Item = Period> {
        std::iter::successors(Some(from), |p| Some(p.next())).take_while(move |p| *p <= to)
    }

    /// The twelve months of `year`.
    pub fn months_of(year: i32) -> impl Iterator<Item = Period> {
        (1..=12).map(move |month| Period { year, month })
    }
}

pub fn compare_month(a: Period, b: Period) -> Ordering {
    a.cmp(&b)
}

pub fn classify(period: Period, reference: NaiveDate) -> PeriodPosition {
    match period.cmp(&Period::of(reference)) {
        Ordering::Less => PeriodPosition::Past,
        Ordering::Equal => PeriodPosition::Current,
        Ordering::Greater => PeriodPosition::Future,
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Period {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = MONTH_RE
            .captures(s)
            .ok_or_else(|| anyhow::anyhow!("Invalid month '{}', expected YYYY-MM", s))?;
        let year: i32 = caps[1].parse()?;
        let month: u32 = caps[2].parse()?;
        Ok(Period::new(year, month)?)
    }
}
