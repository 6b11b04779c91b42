//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! The desk facade calls store methods; it never executes SQL directly.

use crate::error::DeskResult;
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

mod analytics;
mod cancellation;
mod customer;

pub struct DeskStore {
    conn: Connection,
}

impl DeskStore {
    pub fn open(path: &str) -> DeskResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        log::debug!("Opened desk store at {path}");
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> DeskResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> DeskResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_churn_desk.sql"))?;
        Ok(())
    }
}

// ── Query row types ──────────────────────────────────────────────────────────

/// Cancellations logged in one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyChurnPoint {
    /// `YYYY-MM`.
    pub month: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentReasonCount {
    pub reason: String,
    pub count: i64,
}

/// Reason mix within one customer segment ("Unknown" when unset).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentReasons {
    pub segment: String,
    pub reasons: Vec<SegmentReasonCount>,
}

fn collect_strings(row: &Row<'_>) -> rusqlite::Result<String> {
    row.get(0)
}
