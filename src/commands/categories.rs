// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::db::load_categories;
use crate::hierarchy::{CategoryTree, Placement};
use crate::utils::{id_for_category, pretty_table};
use anyhow::Result;
use rusqlite::{params, Connection};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", _)) => list(conn)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let name = sub.get_one::<String>("name").unwrap().trim();
    let parent = match sub.get_one::<String>("parent") {
        Some(p) => {
            let pid = id_for_category(conn, p)?;
            let grand: Option<i64> = conn.query_row(
                "SELECT parent_id FROM categories WHERE id=?1",
                params![pid],
                |r| r.get(0),
            )?;
            if grand.is_some() {
                anyhow::bail!(
                    "'{}' is a subgroup; subgroups can only sit under a group",
                    p.trim()
                );
            }
            Some(pid)
        }
        None => None,
    };
    conn.execute(
        "INSERT INTO categories(name, parent_id) VALUES (?1, ?2)",
        params![name, parent],
    )?;
    println!("Added category '{}'", name);
    Ok(())
}

fn list(conn: &Connection) -> Result<()> {
    let tree = CategoryTree::build(&load_categories(conn)?);
    let mut data = Vec::new();
    for g in tree.groups() {
        data.push(vec![g.name.clone(), String::new()]);
        for sub in &g.subgroups {
            data.push(vec![
                g.name.clone(),
                tree.name(*sub).unwrap_or_default().to_string(),
            ]);
        }
    }
    for c in load_categories(conn)? {
        if tree.placement(c.id) == Some(Placement::Detached) {
            data.push(vec!["(detached)".into(), c.name]);
        }
    }
    println!("{}", pretty_table(&["Group", "Subgroup"], data));
    Ok(())
}
