// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::db::{self, SqliteStore};
use crate::installments::{expand_installments, parse_installment_count, BudgetDraft};
use crate::models::{Budget, BudgetKind, BudgetMode, Fingerprint, NewBudget};
use crate::period::Period;
use crate::recurrence::{propagate_recurring, propagate_through, Propagation};
use crate::utils::{
    fmt_money, id_for_source, maybe_print_json, parse_amount, pretty_table, resolve_category,
};
use anyhow::{Context, Result};
use rusqlite::Connection;
use std::collections::HashMap;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => {
            set(conn, sub)?;
        }
        Some(("list", sub)) => list(conn, sub)?,
        Some(("rm", sub)) => rm(conn, sub)?,
        Some(("propagate", sub)) => {
            propagate(conn, sub)?;
        }
        _ => {}
    }
    Ok(())
}

pub fn set(conn: &Connection, sub: &clap::ArgMatches) -> Result<Vec<Budget>> {
    let period: Period = sub.get_one::<String>("month").unwrap().parse()?;
    let kind = BudgetKind::parse(sub.get_one::<String>("type").unwrap())?;
    let amount = parse_amount(sub.get_one::<String>("amount").unwrap())?;
    let requested = sub
        .get_one::<String>("mode")
        .map(|m| BudgetMode::parse(m))
        .transpose()?;

    let mut draft = BudgetDraft {
        kind,
        amount,
        source_id: None,
        group_id: None,
        subgroup_id: None,
        is_fixed_cost: sub.get_flag("fixed"),
    };
    match kind {
        BudgetKind::Income => {
            let source = sub
                .get_one::<String>("source")
                .ok_or_else(|| anyhow::anyhow!("Income budgets need --source"))?;
            draft.source_id = Some(id_for_source(conn, source)?);
        }
        BudgetKind::Expense => {
            let category = sub
                .get_one::<String>("category")
                .ok_or_else(|| anyhow::anyhow!("Expense budgets need --category"))?;
            let (group, subgroup) = resolve_category(conn, category)?;
            draft.group_id = Some(group);
            draft.subgroup_id = subgroup;
        }
    }

    let mode = match requested {
        Some(m) => m,
        None => {
            let fp = Fingerprint::from_parts(kind, draft.source_id, draft.group_id, draft.subgroup_id);
            db::find_definition(conn, period, fp)?
                .map(|b| b.mode)
                .unwrap_or(BudgetMode::Unique)
        }
    };

    let records: Vec<NewBudget> = match (mode, sub.get_one::<String>("installments")) {
        (BudgetMode::Installment, Some(n)) => {
            expand_installments(&draft, parse_installment_count(n)?, period.first_day())?
        }
        (BudgetMode::Installment, None) => {
            anyhow::bail!("Installment budgets need --installments")
        }
        (_, Some(_)) => anyhow::bail!("--installments only applies to --mode installment"),
        (_, None) => vec![NewBudget {
            year: period.year(),
            month: period.month(),
            kind,
            source_id: draft.source_id,
            group_id: draft.group_id,
            subgroup_id: draft.subgroup_id,
            amount,
            mode,
            installments: None,
            installment_number: None,
            is_fixed_cost: draft.is_fixed_cost,
        }],
    };

    let tx = conn.unchecked_transaction()?;
    let mut stored = Vec::with_capacity(records.len());
    for r in &records {
        stored.push(db::upsert_budget(&tx, r)?);
    }
    tx.commit()?;
    println!(
        "Budget set for {}: {} {} ({}{})",
        period,
        kind.as_str(),
        amount,
        mode.as_str(),
        if stored.len() > 1 {
            format!(", {} months", stored.len())
        } else {
            String::new()
        }
    );
    Ok(stored)
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let budgets = match sub.get_one::<String>("month") {
        Some(m) => db::budgets_in(conn, m.parse()?)?,
        None => {
            let mut all = db::load_budgets(conn)?;
            all.reverse();
            all
        }
    };
    if maybe_print_json(json_flag, jsonl_flag, &budgets)? {
        return Ok(());
    }
    let names = target_names(conn)?;
    let data = budgets
        .iter()
        .map(|b| {
            let target = b
                .subgroup_id
                .or(b.group_id)
                .and_then(|id| names.categories.get(&id))
                .or_else(|| b.source_id.and_then(|id| names.sources.get(&id)))
                .cloned()
                .unwrap_or_default();
            vec![
                b.id.to_string(),
                format!("{:04}-{:02}", b.year, b.month),
                b.kind.as_str().to_string(),
                target,
                fmt_money(&b.amount),
                match (b.installment_number, b.installments) {
                    (Some(n), Some(c)) => format!("{} {}/{}", b.mode.as_str(), n, c),
                    _ => b.mode.as_str().to_string(),
                },
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["Id", "Month", "Type", "Target", "Amount", "Mode"], data)
    );
    Ok(())
}

fn rm(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let raw = sub.get_one::<String>("id").unwrap().trim();
    let id: i64 = raw
        .parse()
        .with_context(|| format!("Invalid budget id '{}'", raw))?;
    let suppress = sub.get_flag("suppress");
    match db::delete_budget(conn, id, suppress)? {
        Some(b) if suppress => println!(
            "Removed budget #{} and suppressed it for {:04}-{:02}",
            b.id, b.year, b.month
        ),
        Some(b) => println!("Removed budget #{}", b.id),
        None => anyhow::bail!("Budget #{} not found", id),
    }
    Ok(())
}

pub fn propagate(conn: &Connection, sub: &clap::ArgMatches) -> Result<Propagation> {
    let target: Period = sub.get_one::<String>("month").unwrap().parse()?;
    let store = SqliteStore::new(conn);
    let outcome = match sub.get_one::<String>("from") {
        Some(from) => propagate_through(&store, from.parse()?, target)?,
        None => propagate_recurring(&store, target)?,
    };
    for w in &outcome.warnings {
        eprintln!("warning: {}", w);
    }
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &outcome.created)? {
        println!(
            "Propagated {} recurring budget(s) up to {}",
            outcome.created.len(),
            target
        );
    }
    Ok(outcome)
}

pub(crate) struct TargetNames {
    pub categories: HashMap<i64, String>,
    pub sources: HashMap<i64, String>,
}

pub(crate) fn target_names(conn: &Connection) -> Result<TargetNames> {
    Ok(TargetNames {
        categories: db::load_categories(conn)?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect(),
        sources: db::load_sources(conn)?
            .into_iter()
            .map(|s| (s.id, s.name))
            .collect(),
    })
}
