use super::DeskStore;
use crate::{
    error::DeskResult,
    filter::{CancellationFilter, SavedStatus},
    record::{CancellationDraft, CancellationPatch, CancellationRecord, UsageCounters},
    types::CancellationId,
};
use rusqlite::{params, params_from_iter, types::Value, OptionalExtension, Row};

const BASE_SELECT: &str = "
    SELECT can.id, can.customer_id, cust.name, cust.email, cust.segment,
           cust.subscription_start_date, cust.source_campaign,
           can.cancellation_date, can.primary_reason, can.secondary_notes,
           can.usage_downloads, can.usage_posts, can.usage_logins, can.usage_minutes,
           can.days_on_platform, can.closer_name,
           can.saved_flag, can.saved_by, can.save_reason, can.save_notes,
           can.ticket_url, can.churn_amount, can.saved_revenue, can.agent_plan,
           can.funds_disputed
    FROM cancellation can
    JOIN customer cust ON cust.id = can.customer_id";

const NEWEST_FIRST: &str = "ORDER BY can.cancellation_date DESC, can.id DESC";

fn cancellation_from_row(row: &Row<'_>) -> rusqlite::Result<CancellationRecord> {
    Ok(CancellationRecord {
        id: row.get(0)?,
        customer_id: row.get(1)?,
        customer_name: row.get(2)?,
        email: row.get(3)?,
        segment: row.get(4)?,
        subscription_start_date: row.get(5)?,
        source_campaign: row.get(6)?,
        cancellation_date: row.get(7)?,
        primary_reason: row.get(8)?,
        secondary_notes: row.get(9)?,
        usage: UsageCounters {
            downloads: row.get(10)?,
            posts: row.get(11)?,
            logins: row.get(12)?,
            minutes: row.get(13)?,
        },
        days_on_platform: row.get(14)?,
        closer_name: row.get(15)?,
        saved_flag: row.get::<_, i32>(16)? != 0,
        saved_by: row.get(17)?,
        save_reason: row.get(18)?,
        save_notes: row.get(19)?,
        ticket_url: row.get(20)?,
        churn_amount: row.get(21)?,
        saved_revenue: row.get(22)?,
        agent_plan: row.get(23)?,
        funds_disputed: row.get::<_, i32>(24)? != 0,
    })
}

/// Escape LIKE wildcards so `%` and `_` in a search match themselves.
fn escape_like(text: &str) -> String {
    text.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

/// Build the WHERE clause for a filter. The reason is expected to be
/// normalized already.
fn filter_clause(filter: &CancellationFilter) -> (String, Vec<Value>) {
    let mut clauses: Vec<String> = Vec::new();
    let mut values: Vec<Value> = Vec::new();

    let mut push = |sql: &str, value: Value, clauses: &mut Vec<String>| {
        values.push(value);
        clauses.push(sql.replace("?", &format!("?{}", values.len())));
    };

    if let Some(start) = &filter.start_date {
        push("substr(can.cancellation_date, 1, 10) >= ?", Value::Text(start.clone()), &mut clauses);
    }
    if let Some(end) = &filter.end_date {
        push("substr(can.cancellation_date, 1, 10) <= ?", Value::Text(end.clone()), &mut clauses);
    }
    if let Some(closer) = &filter.closer {
        push("can.closer_name = ?", Value::Text(closer.clone()), &mut clauses);
    }
    if let Some(segment) = &filter.segment {
        push("cust.segment = ?", Value::Text(segment.clone()), &mut clauses);
    }
    if let Some(reason) = &filter.reason {
        push("can.primary_reason = ?", Value::Text(reason.clone()), &mut clauses);
    }
    if let Some(query) = &filter.query {
        let pattern = format!("%{}%", escape_like(&query.trim().to_lowercase()));
        push(
            "(LOWER(cust.name) LIKE ? ESCAPE '\\' OR LOWER(cust.email) LIKE ? ESCAPE '\\'
              OR LOWER(can.primary_reason) LIKE ? ESCAPE '\\'
              OR LOWER(can.closer_name) LIKE ? ESCAPE '\\')",
            Value::Text(pattern),
            &mut clauses,
        );
    }

    match filter.saved {
        SavedStatus::Any => {}
        SavedStatus::Saved => clauses.push("can.saved_flag = 1".into()),
        SavedStatus::Lost => clauses.push("can.saved_flag = 0".into()),
    }

    let clause = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };
    (clause, values)
}

impl DeskStore {
    // ── Cancellation ──────────────────────────────────────────────

    pub fn insert_cancellation(&self, c: &CancellationDraft) -> DeskResult<CancellationId> {
        self.conn.execute(
            "INSERT INTO cancellation (
                customer_id, cancellation_date, primary_reason, secondary_notes,
                usage_downloads, usage_posts, usage_logins, usage_minutes,
                days_on_platform, closer_name,
                saved_flag, saved_by, save_reason, save_notes,
                ticket_url, churn_amount, saved_revenue, agent_plan, funds_disputed
            ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16,?17,?18,?19)",
            params![
                c.customer_id,
                &c.cancellation_date,
                &c.primary_reason,
                &c.secondary_notes,
                c.usage.downloads,
                c.usage.posts,
                c.usage.logins,
                c.usage.minutes,
                c.days_on_platform,
                &c.closer_name,
                if c.saved_flag { 1i32 } else { 0i32 },
                &c.saved_by,
                &c.save_reason,
                &c.save_notes,
                &c.ticket_url,
                c.churn_amount,
                c.saved_revenue,
                &c.agent_plan,
                if c.funds_disputed { 1i32 } else { 0i32 },
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_cancellation(&self, id: CancellationId) -> DeskResult<Option<CancellationRecord>> {
        let sql = format!("{BASE_SELECT} WHERE can.id = ?1");
        self.conn
            .query_row(&sql, params![id], cancellation_from_row)
            .optional()
            .map_err(Into::into)
    }

    /// Cancellations matching `filter`, newest first.
    pub fn list_cancellations(
        &self,
        filter: &CancellationFilter,
    ) -> DeskResult<Vec<CancellationRecord>> {
        let (clause, values) = filter_clause(filter);
        let sql = format!("{BASE_SELECT} {clause} {NEWEST_FIRST}");
        log::debug!("list_cancellations: {clause}");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), cancellation_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Apply the set fields of `patch`. With `clear_save_details` the
    /// saved-by / reason / notes columns are nulled in the same statement.
    /// Returns the number of rows touched (0 for an unknown id).
    pub fn apply_cancellation_patch(
        &self,
        id: CancellationId,
        patch: &CancellationPatch,
        clear_save_details: bool,
    ) -> DeskResult<usize> {
        let mut sets: Vec<String> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        let mut set = |column: &str, value: Value| {
            values.push(value);
            sets.push(format!("{column} = ?{}", values.len()));
        };

        let text = |v: &Option<String>| v.clone().map(Value::Text);
        let flag = |b: bool| Value::Integer(if b { 1 } else { 0 });

        if let Some(v) = text(&patch.primary_reason) {
            set("primary_reason", v);
        }
        if let Some(v) = text(&patch.secondary_notes) {
            set("secondary_notes", v);
        }
        if let Some(v) = text(&patch.closer_name) {
            set("closer_name", v);
        }
        if let Some(saved) = patch.saved_flag {
            set("saved_flag", flag(saved));
        }
        if clear_save_details {
            set("saved_by", Value::Null);
            set("save_reason", Value::Null);
            set("save_notes", Value::Null);
        } else {
            if let Some(v) = text(&patch.saved_by) {
                set("saved_by", v);
            }
            if let Some(v) = text(&patch.save_reason) {
                set("save_reason", v);
            }
            if let Some(v) = text(&patch.save_notes) {
                set("save_notes", v);
            }
        }
        if let Some(v) = text(&patch.ticket_url) {
            set("ticket_url", v);
        }
        if let Some(v) = patch.churn_amount {
            set("churn_amount", Value::Real(v));
        }
        if let Some(v) = patch.saved_revenue {
            set("saved_revenue", Value::Real(v));
        }
        if let Some(v) = text(&patch.agent_plan) {
            set("agent_plan", v);
        }
        if let Some(disputed) = patch.funds_disputed {
            set("funds_disputed", flag(disputed));
        }

        if sets.is_empty() {
            return Ok(0);
        }

        values.push(Value::Integer(id));
        let sql = format!(
            "UPDATE cancellation SET {} WHERE id = ?{}",
            sets.join(", "),
            values.len()
        );
        let touched = self.conn.execute(&sql, params_from_iter(values.iter()))?;
        Ok(touched)
    }

    pub fn cancellation_count(&self) -> DeskResult<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM cancellation", [], |row| row.get(0))
            .map_err(Into::into)
    }
}
