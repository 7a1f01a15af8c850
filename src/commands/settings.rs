// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::{load_thresholds, save_threshold};
use crate::utils::{parse_decimal, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("show", _)) => {
            let t = load_thresholds(conn)?;
            let rows = t
                .entries()
                .into_iter()
                .map(|(k, v)| vec![k.to_string(), v.to_string()])
                .collect();
            println!("{}", pretty_table(&["Setting", "Value"], rows));
        }
        Some(("set", sub)) => {
            let key = sub.get_one::<String>("key").unwrap().trim();
            let value = parse_decimal(sub.get_one::<String>("value").unwrap())?;
            save_threshold(conn, key, value)?;
            println!("{} = {}", key, value);
        }
        _ => {}
    }
    Ok(())
}
