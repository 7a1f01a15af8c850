// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::{EngineError, EngineResult};
use crate::models::{
    Budget, BudgetKind, BudgetMode, Category, Fingerprint, NewBudget, NewTransaction, Source,
    Transaction, TransactionKind,
};
use crate::period::Period;
use crate::store::BudgetStore;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::types::Type;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row, TransactionBehavior};
use rust_decimal::Decimal;
use std::fs;
use std::path::{Path, PathBuf};

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "Budgetpulse", "budgetpulse"));

pub const DB_ENV: &str = "BUDGETPULSE_DB";

pub fn db_path() -> Result<PathBuf> {
    if let Some(p) = std::env::var_os(DB_ENV) {
        return Ok(PathBuf::from(p));
    }
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("budgetpulse.sqlite"))
}

pub fn open_or_init() -> Result<Connection> {
    open_at(&db_path()?)
}

pub fn open_at(path: &Path) -> Result<Connection> {
    let conn =
        Connection::open(path).with_context(|| format!("Open DB at {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS settings(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS categories(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        parent_id INTEGER,
        FOREIGN KEY(parent_id) REFERENCES categories(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS sources(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE
    );

    CREATE TABLE IF NOT EXISTS transactions(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        type TEXT NOT NULL CHECK(type IN ('earning','expense')),
        value TEXT NOT NULL,
        date TEXT NOT NULL,
        source_id INTEGER,
        group_id INTEGER,
        subgroup_id INTEGER,
        payment_method TEXT,
        installments INTEGER,
        installment_number INTEGER,
        note TEXT,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        FOREIGN KEY(source_id) REFERENCES sources(id) ON DELETE SET NULL,
        FOREIGN KEY(group_id) REFERENCES categories(id) ON DELETE SET NULL,
        FOREIGN KEY(subgroup_id) REFERENCES categories(id) ON DELETE SET NULL
    );
    CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(date);

    CREATE TABLE IF NOT EXISTS budgets(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        year INTEGER NOT NULL,
        month INTEGER NOT NULL CHECK(month BETWEEN 1 AND 12),
        type TEXT NOT NULL CHECK(type IN ('income','expense')),
        source_id INTEGER,
        group_id INTEGER,
        subgroup_id INTEGER,
        amount TEXT NOT NULL,
        mode TEXT NOT NULL CHECK(mode IN ('unique','recurring','installment')),
        installments INTEGER,
        installment_number INTEGER,
        is_fixed_cost INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        FOREIGN KEY(source_id) REFERENCES sources(id) ON DELETE CASCADE,
        FOREIGN KEY(group_id) REFERENCES categories(id) ON DELETE CASCADE,
        FOREIGN KEY(subgroup_id) REFERENCES categories(id) ON DELETE CASCADE
    );
    CREATE INDEX IF NOT EXISTS idx_budgets_period ON budgets(year, month);
    -- one unique-or-recurring record per definition and month
    DROP INDEX IF EXISTS idx_budgets_recurring_definition;
    CREATE UNIQUE INDEX IF NOT EXISTS idx_budgets_definition
        ON budgets(year, month, type, IFNULL(source_id, 0), IFNULL(group_id, 0), IFNULL(subgroup_id, 0))
        WHERE mode <> 'installment';

    CREATE TABLE IF NOT EXISTS budget_suppressions(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        year INTEGER NOT NULL,
        month INTEGER NOT NULL,
        fingerprint TEXT NOT NULL,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        UNIQUE(year, month, fingerprint)
    );
    "#,
    )?;
    Ok(())
}

const TRANSACTION_COLUMNS: &str = "id, type, value, date, source_id, group_id, subgroup_id, \
     payment_method, installments, installment_number, note";
const BUDGET_COLUMNS: &str = "id, year, month, type, source_id, group_id, subgroup_id, amount, \
     mode, installments, installment_number, is_fixed_cost";

fn text_at<T>(r: &Row<'_>, idx: usize, parse: impl Fn(&str) -> Result<T>) -> rusqlite::Result<T> {
    let s: String = r.get(idx)?;
    parse(&s).map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into()))
}

fn decimal_at(r: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    text_at(r, idx, |s| {
        s.parse::<Decimal>()
            .with_context(|| format!("Invalid amount '{}'", s))
    })
}

fn transaction_from_row(r: &Row<'_>) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        id: r.get(0)?,
        kind: text_at(r, 1, TransactionKind::parse)?,
        value: decimal_at(r, 2)?,
        date: r.get(3)?,
        source_id: r.get(4)?,
        group_id: r.get(5)?,
        subgroup_id: r.get(6)?,
        payment_method: r.get(7)?,
        installments: r.get(8)?,
        installment_number: r.get(9)?,
        note: r.get(10)?,
    })
}

fn budget_from_row(r: &Row<'_>) -> rusqlite::Result<Budget> {
    Ok(Budget {
        id: r.get(0)?,
        year: r.get(1)?,
        month: r.get(2)?,
        kind: text_at(r, 3, BudgetKind::parse)?,
        source_id: r.get(4)?,
        group_id: r.get(5)?,
        subgroup_id: r.get(6)?,
        amount: decimal_at(r, 7)?,
        mode: text_at(r, 8, BudgetMode::parse)?,
        installments: r.get(9)?,
        installment_number: r.get(10)?,
        is_fixed_cost: r.get(11)?,
    })
}

pub fn load_categories(conn: &Connection) -> rusqlite::Result<Vec<Category>> {
    let mut stmt = conn.prepare("SELECT id, name, parent_id FROM categories ORDER BY id")?;
    let rows = stmt.query_map([], |r| {
        Ok(Category {
            id: r.get(0)?,
            name: r.get(1)?,
            parent_id: r.get(2)?,
        })
    })?;
    rows.collect()
}

pub fn load_sources(conn: &Connection) -> rusqlite::Result<Vec<Source>> {
    let mut stmt = conn.prepare("SELECT id, name FROM sources ORDER BY id")?;
    let rows = stmt.query_map([], |r| {
        Ok(Source {
            id: r.get(0)?,
            name: r.get(1)?,
        })
    })?;
    rows.collect()
}

pub fn load_transactions(conn: &Connection) -> rusqlite::Result<Vec<Transaction>> {
    let sql = format!(
        "SELECT {} FROM transactions ORDER BY date, id",
        TRANSACTION_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], transaction_from_row)?;
    rows.collect()
}

pub fn load_budgets(conn: &Connection) -> rusqlite::Result<Vec<Budget>> {
    let sql = format!(
        "SELECT {} FROM budgets ORDER BY year, month, id",
        BUDGET_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], budget_from_row)?;
    rows.collect()
}

pub fn budgets_in(conn: &Connection, period: Period) -> rusqlite::Result<Vec<Budget>> {
    let sql = format!(
        "SELECT {} FROM budgets WHERE year=?1 AND month=?2 ORDER BY id",
        BUDGET_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![period.year(), period.month()], budget_from_row)?;
    rows.collect()
}

/// Latest month strictly before `period` that holds a recurring budget.
pub fn latest_recurring_before(conn: &Connection, period: Period) -> rusqlite::Result<Option<Period>> {
    let found: Option<(i32, u32)> = conn
        .query_row(
            "SELECT year, month FROM budgets
             WHERE mode='recurring' AND (year < ?1 OR (year = ?1 AND month < ?2))
             ORDER BY year DESC, month DESC LIMIT 1",
            params![period.year(), period.month()],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .optional()?;
    found
        .map(|(y, m)| Period::new(y, m))
        .transpose()
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

pub fn get_budget(conn: &Connection, id: i64) -> rusqlite::Result<Option<Budget>> {
    let sql = format!("SELECT {} FROM budgets WHERE id=?1", BUDGET_COLUMNS);
    conn.query_row(&sql, params![id], budget_from_row).optional()
}

pub fn insert_transaction(conn: &Connection, t: &NewTransaction) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO transactions(type, value, date, source_id, group_id, subgroup_id,
             payment_method, installments, installment_number, note)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            t.kind.as_str(),
            t.value.to_string(),
            t.date,
            t.source_id,
            t.group_id,
            t.subgroup_id,
            t.payment_method,
            t.installments,
            t.installment_number,
            t.note
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn insert_budget(conn: &Connection, b: &NewBudget) -> rusqlite::Result<Budget> {
    conn.execute(
        "INSERT INTO budgets(year, month, type, source_id, group_id, subgroup_id, amount,
             mode, installments, installment_number, is_fixed_cost)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            b.year,
            b.month,
            b.kind.as_str(),
            b.source_id,
            b.group_id,
            b.subgroup_id,
            b.amount.to_string(),
            b.mode.as_str(),
            b.installments,
            b.installment_number,
            b.is_fixed_cost
        ],
    )?;
    Ok(b.clone().into_budget(conn.last_insert_rowid()))
}

/// The month's unique or recurring record for `fingerprint`, if any.
/// Installment records are separate commitments and never match.
pub fn find_definition(
    conn: &Connection,
    period: Period,
    fingerprint: Option<Fingerprint>,
) -> rusqlite::Result<Option<Budget>> {
    Ok(budgets_in(conn, period)?
        .into_iter()
        .find(|x| x.mode != BudgetMode::Installment && x.fingerprint() == fingerprint))
}

/// Overwrites amount, mode and fixed-cost flag of the month's record for the
/// same definition, whichever mode it had, inserting when there is none.
/// Installment budgets are always inserted.
pub fn upsert_budget(conn: &Connection, b: &NewBudget) -> rusqlite::Result<Budget> {
    if b.mode != BudgetMode::Installment {
        let period = Period::new(b.year, b.month)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
        if let Some(found) = find_definition(conn, period, b.fingerprint())? {
            conn.execute(
                "UPDATE budgets SET amount=?1, mode=?2, is_fixed_cost=?3 WHERE id=?4",
                params![b.amount.to_string(), b.mode.as_str(), b.is_fixed_cost, found.id],
            )?;
            return Ok(b.clone().into_budget(found.id));
        }
    }
    insert_budget(conn, b)
}

/// Deletes a budget. With `suppress`, records that its definition was removed
/// from that month on purpose so propagation does not bring it back.
pub fn delete_budget(conn: &Connection, id: i64, suppress: bool) -> Result<Option<Budget>> {
    let Some(b) = get_budget(conn, id)? else {
        return Ok(None);
    };
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM budgets WHERE id=?1", params![id])?;
    if suppress {
        if let Some(fp) = b.fingerprint() {
            tx.execute(
                "INSERT OR IGNORE INTO budget_suppressions(year, month, fingerprint) VALUES (?1, ?2, ?3)",
                params![b.year, b.month, fp.to_string()],
            )?;
        }
    }
    tx.commit()?;
    Ok(Some(b))
}

/// [`BudgetStore`] over a SQLite connection.
#[derive(Debug)]
pub struct SqliteStore<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        SqliteStore { conn }
    }
}

impl BudgetStore for SqliteStore<'_> {
    fn budgets_in(&self, period: Period) -> EngineResult<Vec<Budget>> {
        Ok(budgets_in(self.conn, period)?)
    }

    fn is_suppressed(&self, period: Period, fingerprint: &Fingerprint) -> EngineResult<bool> {
        let hit: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM budget_suppressions WHERE year=?1 AND month=?2 AND fingerprint=?3",
                params![period.year(), period.month(), fingerprint.to_string()],
                |r| r.get(0),
            )
            .optional()?;
        Ok(hit.is_some())
    }

    fn insert_if_absent(&self, budget: &NewBudget) -> EngineResult<Option<Budget>> {
        let period = Period::new(budget.year, budget.month)?;
        let fp = budget.fingerprint();
        // IMMEDIATE takes the write lock before the re-check
        let tx = rusqlite::Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if budgets_in(&tx, period)?.iter().any(|b| b.fingerprint() == fp) {
            return Ok(None);
        }
        match insert_budget(&tx, budget) {
            Ok(created) => {
                tx.commit()?;
                Ok(Some(created))
            }
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                Ok(None)
            }
            Err(e) => Err(EngineError::from(e)),
        }
    }
}
