// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Classification thresholds and their overrides in the `settings` table.

use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use serde::Serialize;

const KEY_PREFIX: &str = "threshold.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Thresholds {
    /// actual/budgeted ratio at which a budget line turns `warning`.
    pub warning_ratio: Decimal,
    pub critical_ratio: Decimal,
    pub exceeded_ratio: Decimal,
    /// Percent of the budgeted balance reached.
    pub heatmap_excellent: Decimal,
    pub heatmap_good: Decimal,
    pub heatmap_warning: Decimal,
    /// Percent change treated as a real movement in a trend.
    pub significant_change: Decimal,
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds {
            warning_ratio: Decimal::new(80, 2),
            critical_ratio: Decimal::new(95, 2),
            exceeded_ratio: Decimal::ONE,
            heatmap_excellent: Decimal::from(110),
            heatmap_good: Decimal::from(90),
            heatmap_warning: Decimal::from(70),
            significant_change: Decimal::TEN,
        }
    }
}

impl Thresholds {
    pub const KEYS: [&'static str; 7] = [
        "warning_ratio",
        "critical_ratio",
        "exceeded_ratio",
        "heatmap_excellent",
        "heatmap_good",
        "heatmap_warning",
        "significant_change",
    ];

    fn slot(&mut self, key: &str) -> Option<&mut Decimal> {
        match key {
            "warning_ratio" => Some(&mut self.warning_ratio),
            "critical_ratio" => Some(&mut self.critical_ratio),
            "exceeded_ratio" => Some(&mut self.exceeded_ratio),
            "heatmap_excellent" => Some(&mut self.heatmap_excellent),
            "heatmap_good" => Some(&mut self.heatmap_good),
            "heatmap_warning" => Some(&mut self.heatmap_warning),
            "significant_change" => Some(&mut self.significant_change),
            _ => None,
        }
    }

    pub fn set(&mut self, key: &str, value: Decimal) -> Result<()> {
        let slot = self.slot(key).with_context(|| {
            format!(
                "Unknown setting '{}', expected one of: {}",
                key,
                Self::KEYS.join(", ")
            )
        })?;
        *slot = value;
        Ok(())
    }

    pub fn entries(&self) -> Vec<(&'static str, Decimal)> {
        vec![
            ("warning_ratio", self.warning_ratio),
            ("critical_ratio", self.critical_ratio),
            ("exceeded_ratio", self.exceeded_ratio),
            ("heatmap_excellent", self.heatmap_excellent),
            ("heatmap_good", self.heatmap_good),
            ("heatmap_warning", self.heatmap_warning),
            ("significant_change", self.significant_change),
        ]
    }

    /// Tiers must stay ordered or classification would skip a tier.
    pub fn validate(&self) -> Result<()> {
        if !(self.warning_ratio <= self.critical_ratio && self.critical_ratio <= self.exceeded_ratio)
        {
            anyhow::bail!(
                "Ratios must satisfy warning <= critical <= exceeded (got {} / {} / {})",
                self.warning_ratio,
                self.critical_ratio,
                self.exceeded_ratio
            );
        }
        if !(self.heatmap_warning <= self.heatmap_good && self.heatmap_good <= self.heatmap_excellent)
        {
            anyhow::bail!(
                "Heatmap tiers must satisfy warning <= good <= excellent (got {} / {} / {})",
                self.heatmap_warning,
                self.heatmap_good,
                self.heatmap_excellent
            );
        }
        if self.significant_change < Decimal::ZERO {
            anyhow::bail!("significant_change must not be negative");
        }
        Ok(())
    }
}

/// Defaults merged with any `threshold.*` rows in `settings`.
pub fn load_thresholds(conn: &Connection) -> Result<Thresholds> {
    let mut t = Thresholds::default();
    let mut stmt = conn.prepare("SELECT key, value FROM settings WHERE key LIKE 'threshold.%'")?;
    let rows = stmt.query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?)))?;
    for row in rows {
        let (key, raw) = row?;
        let name = key.trim_start_matches(KEY_PREFIX);
        let value = raw
            .parse::<Decimal>()
            .with_context(|| format!("Invalid value '{}' for setting '{}'", raw, name))?;
        t.set(name, value)?;
    }
    t.validate()?;
    Ok(t)
}

pub fn save_threshold(conn: &Connection, key: &str, value: Decimal) -> Result<()> {
    let mut merged = load_thresholds(conn)?;
    merged.set(key, value)?;
    merged.validate()?;
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![format!("{}{}", KEY_PREFIX, key), value.to_string()],
    )?;
    Ok(())
}
