// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::db::insert_transaction;
use crate::installments::{expand_installments, parse_installment_count, TransactionDraft};
use crate::models::{NewTransaction, TransactionKind};
use crate::period::Period;
use crate::utils::{
    id_for_source, maybe_print_json, parse_amount, parse_date, pretty_table, resolve_category,
};
use anyhow::Result;
use rusqlite::Connection;
use serde::Serialize;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            add(conn, sub)?;
        }
        Some(("list", sub)) => list(conn, sub)?,
        _ => {}
    }
    Ok(())
}

/// Records the transaction, or one per installment. Returns the new ids.
pub fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<Vec<i64>> {
    let kind = TransactionKind::parse(sub.get_one::<String>("type").unwrap())?;
    let date = parse_date(sub.get_one::<String>("date").unwrap())?;
    let value = parse_amount(sub.get_one::<String>("value").unwrap())?;
    let note = sub.get_one::<String>("note").map(|s| s.trim().to_string());
    let method = sub.get_one::<String>("method").map(|s| s.trim().to_string());

    let mut draft = TransactionDraft {
        kind,
        value,
        source_id: None,
        group_id: None,
        subgroup_id: None,
        payment_method: method,
        note,
    };
    match kind {
        TransactionKind::Earning => {
            let source = sub
                .get_one::<String>("source")
                .ok_or_else(|| anyhow::anyhow!("Earnings need --source"))?;
            draft.source_id = Some(id_for_source(conn, source)?);
        }
        TransactionKind::Expense => {
            let category = sub
                .get_one::<String>("category")
                .ok_or_else(|| anyhow::anyhow!("Expenses need --category"))?;
            let (group, subgroup) = resolve_category(conn, category)?;
            draft.group_id = Some(group);
            draft.subgroup_id = subgroup;
        }
    }

    let records: Vec<NewTransaction> = match sub.get_one::<String>("installments") {
        Some(n) => expand_installments(&draft, parse_installment_count(n)?, date)?,
        None => vec![NewTransaction {
            kind: draft.kind,
            value: draft.value,
            date,
            source_id: draft.source_id,
            group_id: draft.group_id,
            subgroup_id: draft.subgroup_id,
            payment_method: draft.payment_method.clone(),
            installments: None,
            installment_number: None,
            note: draft.note.clone(),
        }],
    };

    let tx = conn.unchecked_transaction()?;
    let mut ids = Vec::with_capacity(records.len());
    for r in &records {
        ids.push(insert_transaction(&tx, r)?);
    }
    tx.commit()?;

    if records.len() > 1 {
        println!(
            "Recorded {} installments of {} from {}",
            records.len(),
            value,
            date
        );
    } else {
        println!("Recorded {} {} on {}", kind.as_str(), value, date);
    }
    Ok(ids)
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let data = query_rows(conn, sub)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.date.clone(),
                    r.kind.clone(),
                    r.value.clone(),
                    r.category.clone(),
                    r.installment.clone(),
                    r.note.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Date", "Type", "Value", "Category/Source", "Installment", "Note"],
                rows,
            )
        );
    }
    Ok(())
}

#[derive(Serialize)]
pub struct TransactionRow {
    pub date: String,
    pub kind: String,
    pub value: String,
    pub category: String,
    pub installment: String,
    pub note: String,
}

pub fn query_rows(conn: &Connection, sub: &clap::ArgMatches) -> Result<Vec<TransactionRow>> {
    let mut sql = String::from(
        "SELECT t.date, t.type, t.value, COALESCE(sg.name, g.name, s.name), t.installment_number, t.installments, t.note
         FROM transactions t
         LEFT JOIN categories g ON t.group_id=g.id
         LEFT JOIN categories sg ON t.subgroup_id=sg.id
         LEFT JOIN sources s ON t.source_id=s.id
         WHERE 1=1",
    );
    let mut params_vec: Vec<String> = Vec::new();

    if let Some(month) = sub.get_one::<String>("month") {
        let period: Period = month.parse()?;
        sql.push_str(" AND substr(t.date,1,7)=?");
        params_vec.push(period.to_string());
    }
    sql.push_str(" ORDER BY t.date DESC, t.id DESC");
    if let Some(limit) = sub.get_one::<usize>("limit") {
        sql.push_str(" LIMIT ?");
        params_vec.push(limit.to_string());
    }

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(rusqlite::params_from_iter(params_vec.iter()))?;

    let mut data = Vec::new();
    while let Some(r) = rows.next()? {
        let number: Option<u32> = r.get(4)?;
        let count: Option<u32> = r.get(5)?;
        let category: Option<String> = r.get(3)?;
        let note: Option<String> = r.get(6)?;
        data.push(TransactionRow {
            date: r.get(0)?,
            kind: r.get(1)?,
            value: r.get(2)?,
            category: category.unwrap_or_default(),
            installment: match (number, count) {
                (Some(n), Some(c)) => format!("{}/{}", n, c),
                _ => String::new(),
            },
            note: note.unwrap_or_default(),
        });
    }
    Ok(data)
}
