//! SQLite persistence layer.
//!
//! RULE: Only store/ talks to the database.
//! Engines read through the traits in source.rs; they never execute SQL.

use crate::{error::ScoringResult, scoring::Conclusion};
use rusqlite::{types::Type, Connection};

mod assessment;
mod catalog;
mod custom_standard;

pub struct AssessmentStore {
    conn: Connection,
}

impl AssessmentStore {
    pub fn open(path: &str) -> ScoringResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        log::debug!("store: opened {path}");
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> ScoringResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> ScoringResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_catalog.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/002_participants.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/003_assessments.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/004_custom_standards.sql"))?;
        Ok(())
    }

    /// Run `f` inside one transaction; used by bulk imports.
    pub fn in_transaction<T>(
        &self,
        f: impl FnOnce(&Self) -> ScoringResult<T>,
    ) -> ScoringResult<T> {
        self.conn.execute_batch("BEGIN")?;
        match f(self) {
            Ok(value) => {
                self.conn.execute_batch("COMMIT")?;
                Ok(value)
            }
            Err(e) => {
                let _ = self.conn.execute_batch("ROLLBACK");
                Err(e)
            }
        }
    }
}

/// Read a conclusion label column, rejecting unknown labels.
fn conclusion_column(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Conclusion> {
    let label: String = row.get(idx)?;
    Conclusion::from_label(&label).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("unknown conclusion label '{label}'").into(),
        )
    })
}

/// `IN (?, ?, ...)` placeholder list for `n` parameters.
fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}
