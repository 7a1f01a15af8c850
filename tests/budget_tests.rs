// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use budgetpulse::models::BudgetMode;
use budgetpulse::period::Period;
use budgetpulse::{cli, commands::budgets, db};
use rusqlite::Connection;
use rust_decimal::Decimal;

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    conn.execute_batch(
        "INSERT INTO categories(id,name) VALUES (1,'Housing');
         INSERT INTO categories(id,name,parent_id) VALUES (2,'Rent',1);
         INSERT INTO sources(id,name) VALUES (1,'Salary');",
    )
    .unwrap();
    conn
}

fn budget_matches(args: &[&str]) -> clap::ArgMatches {
    let mut argv = vec!["budgetpulse", "budget"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    match matches.subcommand() {
        Some(("budget", m)) => m.clone(),
        _ => panic!("no budget subcommand"),
    }
}

fn run(conn: &Connection, args: &[&str]) -> anyhow::Result<()> {
    budgets::handle(conn, &budget_matches(args))
}

fn month(conn: &Connection, year: i32, month: u32) -> Vec<budgetpulse::models::Budget> {
    db::budgets_in(conn, Period::new(year, month).unwrap()).unwrap()
}

#[test]
fn set_twice_updates_the_same_record() {
    let conn = setup();
    let args = |amount: &'static str| {
        [
            "set", "--month", "2025-03", "--type", "expense", "--amount", amount, "--category",
            "Rent", "--mode", "recurring",
        ]
    };
    run(&conn, &args("1200")).unwrap();
    run(&conn, &args("1250")).unwrap();
    let march = month(&conn, 2025, 3);
    assert_eq!(march.len(), 1);
    assert_eq!(march[0].amount, Decimal::from(1250));
    assert_eq!(march[0].group_id, Some(1));
    assert_eq!(march[0].subgroup_id, Some(2));
}

#[test]
fn installment_budgets_span_months() {
    let conn = setup();
    let m = budget_matches(&[
        "set", "--month", "2025-11", "--type", "expense", "--amount", "300", "--category",
        "Housing", "--mode", "installment", "--installments", "3",
    ]);
    let Some(("set", set_m)) = m.subcommand() else {
        panic!("no set subcommand");
    };
    let stored = budgets::set(&conn, set_m).unwrap();
    let months: Vec<(i32, u32)> = stored.iter().map(|b| (b.year, b.month)).collect();
    assert_eq!(months, [(2025, 11), (2025, 12), (2026, 1)]);
    assert!(stored.iter().all(|b| b.mode == BudgetMode::Installment));
    assert_eq!(month(&conn, 2026, 1)[0].installment_number, Some(3));
}

#[test]
fn installments_flag_requires_installment_mode() {
    let conn = setup();
    assert!(run(
        &conn,
        &[
            "set", "--month", "2025-03", "--type", "expense", "--amount", "10", "--category",
            "Housing", "--installments", "3",
        ],
    )
    .is_err());
    assert!(run(
        &conn,
        &[
            "set", "--month", "2025-03", "--type", "expense", "--amount", "10", "--category",
            "Housing", "--mode", "installment",
        ],
    )
    .is_err());
    assert!(db::load_budgets(&conn).unwrap().is_empty());
}

#[test]
fn invalid_month_is_rejected() {
    let conn = setup();
    assert!(run(
        &conn,
        &["set", "--month", "2025-13", "--type", "income", "--amount", "10", "--source", "Salary"],
    )
    .is_err());
}

#[test]
fn propagate_from_fills_the_gap() {
    let conn = setup();
    run(
        &conn,
        &[
            "set", "--month", "2025-01", "--type", "income", "--amount", "4000", "--source",
            "Salary", "--mode", "recurring",
        ],
    )
    .unwrap();
    let m = budget_matches(&["propagate", "--month", "2025-04", "--from", "2025-01"]);
    let Some(("propagate", prop_m)) = m.subcommand() else {
        panic!("no propagate subcommand");
    };
    let outcome = budgets::propagate(&conn, prop_m).unwrap();
    assert_eq!(outcome.created.len(), 3);
    for mo in 2..=4 {
        let rows = month(&conn, 2025, mo);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].amount, Decimal::from(4000));
    }
    assert!(budgets::propagate(&conn, prop_m).unwrap().created.is_empty());
}

#[test]
fn rm_with_suppress_keeps_it_gone() {
    let conn = setup();
    run(
        &conn,
        &[
            "set", "--month", "2025-01", "--type", "expense", "--amount", "80", "--category",
            "Housing", "--mode", "recurring",
        ],
    )
    .unwrap();
    run(&conn, &["propagate", "--month", "2025-02"]).unwrap();
    let feb = month(&conn, 2025, 2);
    assert_eq!(feb.len(), 1);

    let id = feb[0].id.to_string();
    run(&conn, &["rm", "--id", id.as_str(), "--suppress"]).unwrap();
    run(&conn, &["propagate", "--month", "2025-02"]).unwrap();
    assert!(month(&conn, 2025, 2).is_empty());

    assert!(run(&conn, &["rm", "--id", id.as_str()]).is_err());
}

#[test]
fn editing_a_propagated_month_updates_that_record() {
    let conn = setup();
    run(
        &conn,
        &[
            "set", "--month", "2024-01", "--type", "expense", "--amount", "300", "--category",
            "Housing", "--mode", "recurring",
        ],
    )
    .unwrap();
    run(&conn, &["propagate", "--month", "2024-02"]).unwrap();
    run(
        &conn,
        &["set", "--month", "2024-02", "--type", "expense", "--amount", "200", "--category", "Housing"],
    )
    .unwrap();

    let feb = month(&conn, 2024, 2);
    assert_eq!(feb.len(), 1);
    assert_eq!(feb[0].amount, Decimal::from(200));
    assert_eq!(feb[0].mode, BudgetMode::Recurring);

    // an explicit mode replaces the carried one instead of adding a record
    run(
        &conn,
        &[
            "set", "--month", "2024-02", "--type", "expense", "--amount", "250", "--category",
            "Housing", "--mode", "unique",
        ],
    )
    .unwrap();
    let feb = month(&conn, 2024, 2);
    assert_eq!(feb.len(), 1);
    assert_eq!(feb[0].mode, BudgetMode::Unique);
    assert_eq!(feb[0].amount, Decimal::from(250));

    // March inherits from February, which no longer recurs
    run(&conn, &["propagate", "--month", "2024-03"]).unwrap();
    assert!(month(&conn, 2024, 3).is_empty());
}
