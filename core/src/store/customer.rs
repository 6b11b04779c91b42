use super::DeskStore;
use crate::{
    error::DeskResult,
    record::{CustomerRecord, NewCustomer},
    types::CustomerId,
};
use rusqlite::{params, OptionalExtension, Row};

const CUSTOMER_COLUMNS: &str =
    "id, name, email, segment, agent_type, subscription_start_date, source_campaign";

fn customer_from_row(row: &Row<'_>) -> rusqlite::Result<CustomerRecord> {
    Ok(CustomerRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        segment: row.get(3)?,
        agent_type: row.get(4)?,
        subscription_start_date: row.get(5)?,
        source_campaign: row.get(6)?,
    })
}

impl DeskStore {
    // ── Customer ──────────────────────────────────────────────────

    pub fn insert_customer(&self, c: &NewCustomer) -> DeskResult<CustomerId> {
        self.conn.execute(
            "INSERT INTO customer (
                name, email, segment, agent_type, subscription_start_date, source_campaign
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                &c.name,
                &c.email,
                &c.segment,
                &c.agent_type,
                &c.subscription_start_date,
                &c.source_campaign,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_customer(&self, id: CustomerId) -> DeskResult<Option<CustomerRecord>> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customer WHERE id = ?1");
        self.conn
            .query_row(&sql, params![id], customer_from_row)
            .optional()
            .map_err(Into::into)
    }

    /// Emails are unique without regard to case.
    pub fn customer_by_email(&self, email: &str) -> DeskResult<Option<CustomerRecord>> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customer WHERE LOWER(email) = LOWER(?1)");
        self.conn
            .query_row(&sql, params![email], customer_from_row)
            .optional()
            .map_err(Into::into)
    }

    /// All customers ordered by name (id breaks ties).
    pub fn all_customers(&self) -> DeskResult<Vec<CustomerRecord>> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customer ORDER BY name ASC, id ASC");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], customer_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// All customers in insertion order.
    pub fn customers_by_id(&self) -> DeskResult<Vec<CustomerRecord>> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customer ORDER BY id ASC");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], customer_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn customer_count(&self) -> DeskResult<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM customer", [], |row| row.get(0))
            .map_err(Into::into)
    }
}
