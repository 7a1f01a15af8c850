// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use budgetpulse::aggregation::{
    check_integrity, compute_group_summaries, compute_month_summary, compute_yearly_summary,
    monthly_series, source_summaries, Metric,
};
use budgetpulse::error::{IntegrityWarning, RecordRef};
use budgetpulse::models::{
    Budget, BudgetKind, BudgetMode, Category, Source, Transaction, TransactionKind,
};
use budgetpulse::period::{Period, PeriodPosition};
use budgetpulse::variance::HeatmapTier;
use chrono::NaiveDate;
use rust_decimal::Decimal;

fn d(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn cat(id: i64, name: &str, parent_id: Option<i64>) -> Category {
    Category {
        id,
        name: name.into(),
        parent_id,
    }
}

fn categories() -> Vec<Category> {
    vec![
        cat(1, "Housing", None),
        cat(2, "Rent", Some(1)),
        cat(3, "Utilities", Some(1)),
        cat(4, "Food", None),
        cat(5, "Groceries", Some(4)),
        cat(6, "Fun", None),
    ]
}

fn sources() -> Vec<Source> {
    vec![Source {
        id: 1,
        name: "Salary".into(),
    }]
}

fn tx(id: i64, kind: TransactionKind, value: &str, date: (i32, u32, u32)) -> Transaction {
    Transaction {
        id,
        kind,
        value: d(value),
        date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
        source_id: None,
        group_id: None,
        subgroup_id: None,
        payment_method: None,
        installments: None,
        installment_number: None,
        note: None,
    }
}

fn expense(id: i64, value: &str, date: (i32, u32, u32), group: i64, sub: Option<i64>) -> Transaction {
    Transaction {
        group_id: Some(group),
        subgroup_id: sub,
        ..tx(id, TransactionKind::Expense, value, date)
    }
}

fn earning(id: i64, value: &str, date: (i32, u32, u32), source: i64) -> Transaction {
    Transaction {
        source_id: Some(source),
        ..tx(id, TransactionKind::Earning, value, date)
    }
}

fn budget(id: i64, year: i32, month: u32, kind: BudgetKind, amount: &str) -> Budget {
    Budget {
        id,
        year,
        month,
        kind,
        source_id: None,
        group_id: None,
        subgroup_id: None,
        amount: d(amount),
        mode: BudgetMode::Unique,
        installments: None,
        installment_number: None,
        is_fixed_cost: false,
    }
}

fn expense_budget(id: i64, month: u32, group: i64, sub: Option<i64>, amount: &str) -> Budget {
    Budget {
        group_id: Some(group),
        subgroup_id: sub,
        ..budget(id, 2024, month, BudgetKind::Expense, amount)
    }
}

fn transactions() -> Vec<Transaction> {
    vec![
        earning(1, "5000", (2024, 3, 1), 1),
        expense(2, "1200", (2024, 3, 2), 1, Some(2)),
        expense(3, "150", (2024, 3, 5), 1, Some(3)),
        expense(4, "300", (2024, 3, 9), 4, None),
        expense(5, "200", (2024, 3, 20), 4, Some(5)),
        expense(6, "40", (2024, 3, 31), 99, None),
        expense(7, "99", (2024, 2, 14), 1, None),
    ]
}

fn budgets() -> Vec<Budget> {
    vec![
        Budget {
            source_id: Some(1),
            ..budget(10, 2024, 3, BudgetKind::Income, "5000")
        },
        expense_budget(11, 3, 1, Some(2), "1200"),
        expense_budget(12, 3, 4, None, "400"),
        expense_budget(13, 3, 6, None, "0"),
        expense_budget(14, 2, 1, None, "100"),
    ]
}

fn march() -> Period {
    Period::new(2024, 3).unwrap()
}

#[test]
fn month_summary_filters_and_sums_by_type() {
    let s = compute_month_summary(&transactions(), &budgets(), march());
    assert_eq!(s.total_income, d("5000"));
    assert_eq!(s.total_expense, d("1890"));
    assert_eq!(s.budgeted_income, d("5000"));
    assert_eq!(s.budgeted_expense, d("1600"));
    assert_eq!(s.net_balance, d("3110"));
}

#[test]
fn month_summary_of_empty_month_is_zero() {
    let s = compute_month_summary(&transactions(), &budgets(), Period::new(2024, 7).unwrap());
    assert_eq!(s, Default::default());
}

#[test]
fn group_summaries_roll_subgroups_into_groups() {
    let groups = compute_group_summaries(&transactions(), &budgets(), &categories(), march(), false);
    let names: Vec<&str> = groups.iter().map(|g| g.group_name.as_str()).collect();
    assert_eq!(names, ["Housing", "Food", "Fun", "Uncategorized"]);

    let housing = &groups[0];
    assert_eq!(housing.group_id, Some(1));
    assert_eq!(housing.actual, d("1350"));
    assert_eq!(housing.budgeted, d("1200"));
    assert_eq!(housing.remaining, d("-150"));
    assert_eq!(housing.percentage, d("112.5"));
    assert!(housing.subgroups.is_empty());

    let food = &groups[1];
    assert_eq!(food.actual, d("500"));
    assert_eq!(food.percentage, d("125"));

    let fun = &groups[2];
    assert_eq!(fun.actual, Decimal::ZERO);
    assert_eq!(fun.percentage, Decimal::ZERO);

    let uncategorized = &groups[3];
    assert_eq!(uncategorized.group_id, None);
    assert_eq!(uncategorized.actual, d("40"));
    assert_eq!(uncategorized.percentage, Decimal::ZERO);
}

#[test]
fn group_summaries_nest_subgroup_detail_on_request() {
    let groups = compute_group_summaries(&transactions(), &budgets(), &categories(), march(), true);
    let housing = &groups[0];
    assert_eq!(housing.subgroups.len(), 2);
    let rent = &housing.subgroups[0];
    assert_eq!(rent.subgroup_name, "Rent");
    assert_eq!(rent.budgeted, d("1200"));
    assert_eq!(rent.actual, d("1200"));
    assert_eq!(rent.percentage, d("100"));
    let utilities = &housing.subgroups[1];
    assert_eq!(utilities.actual, d("150"));
    assert_eq!(utilities.percentage, Decimal::ZERO);

    // the 300 booked on Food directly stays out of Groceries
    let food = &groups[1];
    assert_eq!(food.subgroups.len(), 1);
    assert_eq!(food.subgroups[0].actual, d("200"));
}

#[test]
fn groups_without_records_are_omitted() {
    let groups = compute_group_summaries(&transactions(), &budgets(), &categories(), Period::new(2024, 2).unwrap(), false);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].group_name, "Housing");
    assert_eq!(groups[0].actual, d("99"));
}

#[test]
fn non_positive_budgets_never_produce_non_finite_percentages() {
    let txs = vec![expense(1, "10", (2024, 3, 3), 6, None)];
    for amount in ["0", "-50"] {
        let groups = compute_group_summaries(&txs, &[expense_budget(1, 3, 6, None, amount)], &categories(), march(), false);
        assert_eq!(groups[0].percentage, Decimal::ZERO);
    }
}

#[test]
fn subgroup_parent_wins_over_conflicting_group() {
    let txs = vec![expense(1, "80", (2024, 3, 3), 4, Some(2))];
    let groups = compute_group_summaries(&txs, &[], &categories(), march(), true);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].group_name, "Housing");
    assert_eq!(groups[0].subgroups[0].subgroup_name, "Rent");

    let warnings = check_integrity(&txs, &[], &categories(), &sources());
    assert_eq!(
        warnings,
        [IntegrityWarning::SubgroupParentMismatch {
            record: RecordRef::Transaction(1),
            group_id: 4,
            subgroup_id: 2,
            actual_parent: 1,
        }]
    );
}

#[test]
fn deep_chains_collapse_and_cycles_are_uncategorized() {
    let mut cats = categories();
    cats.push(cat(7, "Electricity", Some(3)));
    cats.push(cat(8, "Loop A", Some(9)));
    cats.push(cat(9, "Loop B", Some(8)));
    let txs = vec![
        expense(1, "60", (2024, 3, 3), 1, Some(7)),
        expense(2, "15", (2024, 3, 4), 8, None),
    ];
    let groups = compute_group_summaries(&txs, &[], &cats, march(), true);
    assert_eq!(groups[0].group_name, "Housing");
    assert_eq!(groups[0].actual, d("60"));
    assert_eq!(groups[0].subgroups[0].subgroup_id, 7);
    assert_eq!(groups[1].group_id, None);
    assert_eq!(groups[1].actual, d("15"));

    let warnings = check_integrity(&[], &[], &cats, &[]);
    assert!(warnings.contains(&IntegrityWarning::NestedTooDeep {
        record: RecordRef::Category(7),
        root: 1,
    }));
    assert!(warnings.contains(&IntegrityWarning::BrokenParentChain {
        record: RecordRef::Category(8),
    }));
    assert!(warnings.contains(&IntegrityWarning::BrokenParentChain {
        record: RecordRef::Category(9),
    }));
}

#[test]
fn non_positive_transactions_are_skipped() {
    let txs = vec![
        expense(1, "0", (2024, 3, 3), 1, None),
        expense(2, "-20", (2024, 3, 3), 1, None),
        expense(3, "20", (2024, 3, 3), 1, None),
    ];
    let s = compute_month_summary(&txs, &[], march());
    assert_eq!(s.total_expense, d("20"));
    let warnings = check_integrity(&txs, &[], &categories(), &sources());
    assert_eq!(warnings.len(), 2);
}

#[test]
fn source_summaries_match_income_side() {
    let mut txs = transactions();
    txs.push(tx(20, TransactionKind::Earning, "75", (2024, 3, 12)));
    let rows = source_summaries(&txs, &budgets(), &sources(), march());
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].source_name, "Salary");
    assert_eq!(rows[0].budgeted, d("5000"));
    assert_eq!(rows[0].actual, d("5000"));
    assert_eq!(rows[0].percentage, d("100"));
    assert_eq!(rows[1].source_id, None);
    assert_eq!(rows[1].actual, d("75"));
}

#[test]
fn yearly_totals_are_the_sum_of_months() {
    let txs = transactions();
    let bs = budgets();
    let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
    let year = compute_yearly_summary(&txs, &bs, &categories(), 2024, today);
    assert_eq!(year.months.len(), 12);

    let mut income = Decimal::ZERO;
    let mut expense_total = Decimal::ZERO;
    for p in Period::months_of(2024) {
        let s = compute_month_summary(&txs, &bs, p);
        income += s.total_income;
        expense_total += s.total_expense;
    }
    assert_eq!(year.totals.total_income, income);
    assert_eq!(year.totals.total_expense, expense_total);
    assert_eq!(year.totals.budgeted_expense, d("1700"));
    assert_eq!(year.totals.net_balance, d("3011"));
}

#[test]
fn yearly_months_carry_position_and_heatmap() {
    let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
    let year = compute_yearly_summary(&transactions(), &budgets(), &categories(), 2024, today);

    let feb = &year.months[1];
    assert_eq!(feb.position, PeriodPosition::Past);
    assert!(!feb.is_future);
    // -99 actual against a -100 plan: no positive target, negative outcome
    assert_eq!(feb.status, HeatmapTier::Danger);

    let mar = &year.months[2];
    assert_eq!(mar.position, PeriodPosition::Current);
    assert!(!mar.is_future);
    // 3110 of a planned 3400
    assert_eq!(mar.status, HeatmapTier::Good);

    assert!(year.months[3..].iter().all(|m| m.is_future));
    assert_eq!(year.months[0].status, HeatmapTier::Good);
}

#[test]
fn monthly_series_skips_future_months_unless_asked() {
    let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
    let year = compute_yearly_summary(&transactions(), &budgets(), &categories(), 2024, today);
    assert_eq!(
        monthly_series(&year, Metric::Expense, false),
        [Decimal::ZERO, d("99"), d("1890")]
    );
    assert_eq!(monthly_series(&year, Metric::Income, true).len(), 12);
    assert!(Metric::parse("bogus").is_err());
}

#[test]
fn integrity_check_reports_missing_references() {
    let txs = vec![
        tx(1, TransactionKind::Earning, "10", (2024, 3, 1)),
        earning(2, "10", (2024, 3, 1), 42),
        tx(3, TransactionKind::Expense, "10", (2024, 3, 1)),
    ];
    let bs = vec![budget(4, 2024, 3, BudgetKind::Expense, "10")];
    let warnings = check_integrity(&txs, &bs, &categories(), &sources());
    assert_eq!(
        warnings,
        [
            IntegrityWarning::MissingSource {
                record: RecordRef::Transaction(1)
            },
            IntegrityWarning::UnknownSource {
                record: RecordRef::Transaction(2),
                source_id: 42
            },
            IntegrityWarning::MissingGroup {
                record: RecordRef::Transaction(3)
            },
            IntegrityWarning::MissingGroup {
                record: RecordRef::Budget(4)
            },
        ]
    );
}

#[test]
fn tiny_budget_does_not_panic_the_group_rollup() {
    let txs = vec![expense(1, "1000", (2024, 3, 3), 6, None)];
    let tiny = Budget {
        amount: Decimal::new(1, 28),
        ..expense_budget(1, 3, 6, None, "1")
    };
    let groups = compute_group_summaries(&txs, &[tiny], &categories(), march(), false);
    assert_eq!(groups[0].percentage, Decimal::MAX);
    assert_eq!(groups[0].actual, d("1000"));
}
