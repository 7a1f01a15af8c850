// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use budgetpulse::aggregation::Metric;
use budgetpulse::commands::{doctor, reports};
use budgetpulse::config::Thresholds;
use budgetpulse::error::{IntegrityWarning, RecordRef};
use budgetpulse::models::BudgetMode;
use budgetpulse::period::Period;
use budgetpulse::trend::TrendDirection;
use budgetpulse::{cli, db};
use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    conn.execute_batch(
        "INSERT INTO categories(id,name) VALUES (1,'Housing'),(3,'Food');
         INSERT INTO categories(id,name,parent_id) VALUES (2,'Rent',1);
         INSERT INTO sources(id,name) VALUES (1,'Salary');
         INSERT INTO transactions(type,value,date,source_id) VALUES ('earning','3000','2025-01-01',1);
         INSERT INTO transactions(type,value,date,group_id,subgroup_id) VALUES ('expense','1000','2025-01-03',1,2);
         INSERT INTO transactions(type,value,date,group_id) VALUES ('expense','400','2025-02-10',3);
         INSERT INTO budgets(year,month,type,group_id,amount,mode) VALUES (2025,1,'expense',1,'900','recurring');
         INSERT INTO budgets(year,month,type,source_id,amount,mode) VALUES (2025,1,'income',1,'3000','unique');",
    )
    .unwrap();
    conn
}

fn report(conn: &Connection, args: &[&str]) -> anyhow::Result<()> {
    let mut argv = vec!["budgetpulse", "report"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    match matches.subcommand() {
        Some(("report", m)) => reports::handle(conn, m),
        _ => panic!("no report subcommand"),
    }
}

#[test]
fn every_report_renders() {
    let conn = setup();
    report(&conn, &["month", "--month", "2025-01"]).unwrap();
    report(&conn, &["groups", "--month", "2025-01", "--subcategories"]).unwrap();
    report(&conn, &["sources", "--month", "2025-01", "--jsonl"]).unwrap();
    report(&conn, &["year", "--year", "2025", "--today", "2025-02-15", "--json"]).unwrap();
    report(
        &conn,
        &["trend", "--year", "2025", "--metric", "balance", "--today", "2025-02-15"],
    )
    .unwrap();
}

fn p(year: i32, month: u32) -> Period {
    Period::new(year, month).unwrap()
}

fn d(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn feb_15() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 2, 15).unwrap()
}

#[test]
fn month_report_totals() {
    let conn = setup();
    let s = reports::month_summary(&conn, p(2025, 1)).unwrap();
    assert_eq!(s.total_income, d("3000"));
    assert_eq!(s.total_expense, d("1000"));
    assert_eq!(s.budgeted_income, d("3000"));
    assert_eq!(s.budgeted_expense, d("900"));
    assert_eq!(s.net_balance, d("2000"));
}

#[test]
fn viewing_a_later_month_carries_recurring_budgets_into_it() {
    let conn = setup();
    let s = reports::month_summary(&conn, p(2025, 3)).unwrap();
    assert_eq!(s.budgeted_expense, d("900"));
    assert_eq!(s.budgeted_income, Decimal::ZERO);

    for m in [2, 3] {
        let rows = db::budgets_in(&conn, p(2025, m)).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].mode, BudgetMode::Recurring);
        assert_eq!(rows[0].group_id, Some(1));
    }
    // viewing again creates nothing new
    reports::month_summary(&conn, p(2025, 3)).unwrap();
    assert_eq!(db::load_budgets(&conn).unwrap().len(), 4);
}

#[test]
fn group_and_source_reports_hold_the_numbers() {
    let conn = setup();
    let groups = reports::group_summaries(&conn, p(2025, 1), true).unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].group_name, "Housing");
    assert_eq!(groups[0].budgeted, d("900"));
    assert_eq!(groups[0].actual, d("1000"));
    assert_eq!(groups[0].remaining, d("-100"));
    assert_eq!(groups[0].subgroups[0].subgroup_name, "Rent");
    assert_eq!(groups[0].subgroups[0].actual, d("1000"));

    let sources = reports::source_rows(&conn, p(2025, 1)).unwrap();
    assert_eq!(sources.len(), 1);
    assert_eq!(sources[0].source_name, "Salary");
    assert_eq!(sources[0].percentage, d("100"));
}

#[test]
fn year_report_carries_through_december() {
    let conn = setup();
    let year = reports::yearly_summary(&conn, &Thresholds::default(), 2025, feb_15()).unwrap();
    assert_eq!(year.totals.total_income, d("3000"));
    assert_eq!(year.totals.total_expense, d("1400"));
    assert_eq!(year.totals.budgeted_expense, d("10800"));
    assert!(year.months[2..].iter().all(|m| m.is_future));
    assert_eq!(db::budgets_in(&conn, p(2025, 12)).unwrap().len(), 1);
}

#[test]
fn trend_report_uses_elapsed_months_only() {
    let conn = setup();
    let t = Thresholds::default();
    let expense = reports::trend_of(&conn, &t, 2025, Metric::Expense, 2, feb_15()).unwrap();
    assert_eq!(expense.points, [d("1000"), d("400")]);
    assert_eq!(expense.direction, TrendDirection::Down);
    assert_eq!(expense.change_percent, Some(d("-60")));

    let income = reports::trend_of(&conn, &t, 2025, Metric::Income, 3, feb_15()).unwrap();
    assert_eq!(income.direction, TrendDirection::Neutral);
    assert!(income.points.is_empty());
}

#[test]
fn bad_report_arguments_fail() {
    let conn = setup();
    assert!(report(&conn, &["month", "--month", "2025-00"]).is_err());
    assert!(report(&conn, &["trend", "--year", "2025", "--metric", "savings"]).is_err());
    assert!(report(&conn, &["year", "--year", "2025", "--today", "15/02/2025"]).is_err());
}

#[test]
fn doctor_finds_nothing_on_clean_data() {
    let conn = setup();
    assert!(doctor::diagnose(&conn).unwrap().is_empty());
}

#[test]
fn doctor_reports_mismatched_subgroup() {
    let conn = setup();
    conn.execute(
        "INSERT INTO transactions(type,value,date,group_id,subgroup_id) VALUES ('expense','5','2025-01-04',3,2)",
        [],
    )
    .unwrap();
    let id = conn.last_insert_rowid();
    assert_eq!(
        doctor::diagnose(&conn).unwrap(),
        [IntegrityWarning::SubgroupParentMismatch {
            record: RecordRef::Transaction(id),
            group_id: 3,
            subgroup_id: 2,
            actual_parent: 1,
        }]
    );
}
