// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::aggregation::check_integrity;
use crate::db;
use crate::error::IntegrityWarning;
use crate::utils::pretty_table;
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection) -> Result<()> {
    let warnings = diagnose(conn)?;
    if warnings.is_empty() {
        println!("doctor: no issues found");
    } else {
        let rows = warnings
            .iter()
            .map(|w| vec![w.record().to_string(), w.to_string()])
            .collect();
        println!("{}", pretty_table(&["Record", "Issue"], rows));
    }
    Ok(())
}

pub fn diagnose(conn: &Connection) -> Result<Vec<IntegrityWarning>> {
    Ok(check_integrity(
        &db::load_transactions(conn)?,
        &db::load_budgets(conn)?,
        &db::load_categories(conn)?,
        &db::load_sources(conn)?,
    ))
}
