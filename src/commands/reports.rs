// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::aggregation::{
    compute_group_summaries, compute_month_summary, compute_yearly_summary_with, monthly_series,
    source_summaries, Metric,
};
use crate::config::{load_thresholds, Thresholds};
use crate::db::{self, SqliteStore};
use crate::models::{GroupSummary, MonthSummary, SourceSummary, YearlySummary};
use crate::period::Period;
use crate::recurrence::{propagate_through, Propagation};
use crate::trend::{analyze_trend_with, TrendResult, DEFAULT_MIN_POINTS};
use crate::utils::{fmt_money, fmt_pct, maybe_print_json, parse_date, pretty_table};
use crate::variance::{budget_status_with, heatmap_status_with};
use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::Connection;
use serde_json::json;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("month", sub)) => month(conn, sub)?,
        Some(("groups", sub)) => groups(conn, sub)?,
        Some(("sources", sub)) => sources(conn, sub)?,
        Some(("year", sub)) => year(conn, sub)?,
        Some(("trend", sub)) => trend(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn month_of(sub: &clap::ArgMatches) -> Result<Period> {
    sub.get_one::<String>("month").unwrap().parse()
}

/// `--today` when given, the local calendar date otherwise.
fn reference_date(sub: &clap::ArgMatches) -> Result<NaiveDate> {
    match sub.get_one::<String>("today") {
        Some(s) => parse_date(s),
        None => Ok(chrono::Local::now().date_naive()),
    }
}

/// Materializes recurring budgets in every month up to `through`, starting
/// after the latest earlier month that has any. Viewing a month runs this
/// before aggregating it.
pub fn carry_forward(conn: &Connection, through: Period) -> Result<Propagation> {
    let Some(from) = db::latest_recurring_before(conn, through)? else {
        return Ok(Propagation::default());
    };
    let outcome = propagate_through(&SqliteStore::new(conn), from, through)?;
    if !outcome.created.is_empty() {
        tracing::info!(
            %through,
            created = outcome.created.len(),
            "carried recurring budgets forward"
        );
    }
    Ok(outcome)
}

pub fn month_summary(conn: &Connection, period: Period) -> Result<MonthSummary> {
    carry_forward(conn, period)?;
    Ok(compute_month_summary(
        &db::load_transactions(conn)?,
        &db::load_budgets(conn)?,
        period,
    ))
}

pub fn group_summaries(
    conn: &Connection,
    period: Period,
    include_subcategories: bool,
) -> Result<Vec<GroupSummary>> {
    carry_forward(conn, period)?;
    Ok(compute_group_summaries(
        &db::load_transactions(conn)?,
        &db::load_budgets(conn)?,
        &db::load_categories(conn)?,
        period,
        include_subcategories,
    ))
}

pub fn source_rows(conn: &Connection, period: Period) -> Result<Vec<SourceSummary>> {
    carry_forward(conn, period)?;
    Ok(source_summaries(
        &db::load_transactions(conn)?,
        &db::load_budgets(conn)?,
        &db::load_sources(conn)?,
        period,
    ))
}

/// Carries recurring budgets through December of `year` first.
pub fn yearly_summary(
    conn: &Connection,
    thresholds: &Thresholds,
    year: i32,
    today: NaiveDate,
) -> Result<YearlySummary> {
    carry_forward(conn, Period::new(year, 12)?)?;
    Ok(compute_yearly_summary_with(
        thresholds,
        &db::load_transactions(conn)?,
        &db::load_budgets(conn)?,
        &db::load_categories(conn)?,
        year,
        today,
    ))
}

pub fn trend_of(
    conn: &Connection,
    thresholds: &Thresholds,
    year: i32,
    metric: Metric,
    min_points: usize,
    today: NaiveDate,
) -> Result<TrendResult> {
    let yearly = yearly_summary(conn, thresholds, year, today)?;
    let series = monthly_series(&yearly, metric, false);
    Ok(analyze_trend_with(thresholds, &series, min_points))
}

fn month(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let period = month_of(sub)?;
    let thresholds = load_thresholds(conn)?;
    let s = month_summary(conn, period)?;
    let status = heatmap_status_with(&thresholds, s.net_balance, s.budgeted_balance());
    let value = json!({ "period": period, "summary": s, "status": status });
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &value)? {
        return Ok(());
    }
    let data = vec![
        vec!["Income".into(), fmt_money(&s.budgeted_income), fmt_money(&s.total_income)],
        vec!["Expense".into(), fmt_money(&s.budgeted_expense), fmt_money(&s.total_expense)],
        vec!["Balance".into(), fmt_money(&s.budgeted_balance()), fmt_money(&s.net_balance)],
    ];
    println!("{} ({})", period, status.as_str());
    println!("{}", pretty_table(&["", "Budgeted", "Actual"], data));
    Ok(())
}

fn groups(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let period = month_of(sub)?;
    let thresholds = load_thresholds(conn)?;
    let summaries = group_summaries(conn, period, sub.get_flag("subcategories"))?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &summaries)? {
        return Ok(());
    }
    let mut data = Vec::new();
    for g in &summaries {
        data.push(vec![
            g.group_name.clone(),
            fmt_money(&g.budgeted),
            fmt_money(&g.actual),
            fmt_money(&g.remaining),
            fmt_pct(&g.percentage),
            budget_status_with(&thresholds, g.actual, g.budgeted)
                .as_str()
                .to_string(),
        ]);
        for s in &g.subgroups {
            data.push(vec![
                format!("  {}", s.subgroup_name),
                fmt_money(&s.budgeted),
                fmt_money(&s.actual),
                fmt_money(&s.remaining),
                fmt_pct(&s.percentage),
                budget_status_with(&thresholds, s.actual, s.budgeted)
                    .as_str()
                    .to_string(),
            ]);
        }
    }
    println!(
        "{}",
        pretty_table(
            &["Group", "Budgeted", "Actual", "Remaining", "Used", "Status"],
            data
        )
    );
    Ok(())
}

fn sources(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let period = month_of(sub)?;
    let summaries = source_rows(conn, period)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &summaries)? {
        return Ok(());
    }
    let data = summaries
        .iter()
        .map(|s| {
            vec![
                s.source_name.clone(),
                fmt_money(&s.budgeted),
                fmt_money(&s.actual),
                fmt_pct(&s.percentage),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["Source", "Budgeted", "Received", "Reached"], data)
    );
    Ok(())
}

fn year(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let year = *sub.get_one::<i32>("year").unwrap();
    let today = reference_date(sub)?;
    let thresholds = load_thresholds(conn)?;
    let summary = yearly_summary(conn, &thresholds, year, today)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &summary)? {
        return Ok(());
    }
    let mut data: Vec<Vec<String>> = summary
        .months
        .iter()
        .map(|m| {
            vec![
                m.period.to_string(),
                fmt_money(&m.summary.total_income),
                fmt_money(&m.summary.total_expense),
                fmt_money(&m.summary.net_balance),
                fmt_money(&m.summary.budgeted_balance()),
                if m.is_future {
                    "-".to_string()
                } else {
                    m.status.as_str().to_string()
                },
            ]
        })
        .collect();
    let t = &summary.totals;
    data.push(vec![
        "Total".into(),
        fmt_money(&t.total_income),
        fmt_money(&t.total_expense),
        fmt_money(&t.net_balance),
        fmt_money(&t.budgeted_balance()),
        String::new(),
    ]);
    println!(
        "{}",
        pretty_table(
            &["Month", "Income", "Expense", "Balance", "Planned", "Status"],
            data
        )
    );
    Ok(())
}

fn trend(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let year = *sub.get_one::<i32>("year").unwrap();
    let metric = Metric::parse(sub.get_one::<String>("metric").unwrap())?;
    let min_points = sub
        .get_one::<usize>("min-points")
        .copied()
        .unwrap_or(DEFAULT_MIN_POINTS);
    let today = reference_date(sub)?;
    let thresholds = load_thresholds(conn)?;
    let result = trend_of(conn, &thresholds, year, metric, min_points, today)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &result)? {
        return Ok(());
    }
    match result.change_percent {
        Some(c) => println!(
            "{}: {} ({} over {} months)",
            year,
            result.direction.as_str(),
            fmt_pct(&c),
            result.points.len()
        ),
        None => println!(
            "{}: {} ({} months)",
            year,
            result.direction.as_str(),
            result.points.len()
        ),
    }
    Ok(())
}
