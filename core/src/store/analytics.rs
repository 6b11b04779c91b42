use super::{collect_strings, DeskStore, MonthlyChurnPoint, SegmentReasonCount, SegmentReasons};
use crate::{error::DeskResult, types::UNKNOWN_LABEL};

impl DeskStore {
    // ── Trends ─────────────────────────────────────────────────

    /// Cancellation counts per `YYYY-MM`, ascending. Rows whose date does
    /// not parse are left out.
    pub fn monthly_churn(&self) -> DeskResult<Vec<MonthlyChurnPoint>> {
        let mut stmt = self.conn.prepare(
            "SELECT strftime('%Y-%m', substr(cancellation_date, 1, 10)) AS month,
                    COUNT(*)
             FROM cancellation
             WHERE strftime('%Y-%m', substr(cancellation_date, 1, 10)) IS NOT NULL
             GROUP BY month
             ORDER BY month ASC",
        )?;
        let points = stmt
            .query_map([], |row| {
                Ok(MonthlyChurnPoint {
                    month: row.get(0)?,
                    count: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(points)
    }

    /// Reason mix per customer segment. Segments are alphabetical with
    /// "Unknown" grouped like any other label; reasons are most frequent first.
    pub fn reasons_by_segment(&self) -> DeskResult<Vec<SegmentReasons>> {
        let mut stmt = self.conn.prepare(
            "SELECT COALESCE(cust.segment, ?1) AS segment_label,
                    can.primary_reason,
                    COUNT(*) AS n
             FROM cancellation can
             JOIN customer cust ON cust.id = can.customer_id
             GROUP BY segment_label, can.primary_reason
             ORDER BY segment_label ASC, n DESC, can.primary_reason ASC",
        )?;
        let rows = stmt
            .query_map([UNKNOWN_LABEL], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    SegmentReasonCount {
                        reason: row.get(1)?,
                        count: row.get(2)?,
                    },
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut grouped: Vec<SegmentReasons> = Vec::new();
        for (segment, reason) in rows {
            match grouped.last_mut() {
                Some(last) if last.segment == segment => last.reasons.push(reason),
                _ => grouped.push(SegmentReasons {
                    segment,
                    reasons: vec![reason],
                }),
            }
        }
        Ok(grouped)
    }

    // ── Metadata ───────────────────────────────────────────────

    pub fn distinct_segments(&self) -> DeskResult<Vec<String>> {
        self.distinct_text(
            "SELECT DISTINCT segment FROM customer
             WHERE segment IS NOT NULL AND TRIM(segment) != ''
             ORDER BY segment",
        )
    }

    pub fn distinct_reasons(&self) -> DeskResult<Vec<String>> {
        self.distinct_text(
            "SELECT DISTINCT primary_reason FROM cancellation
             WHERE TRIM(primary_reason) != ''
             ORDER BY primary_reason",
        )
    }

    pub fn distinct_campaigns(&self) -> DeskResult<Vec<String>> {
        self.distinct_text(
            "SELECT DISTINCT source_campaign FROM customer
             WHERE source_campaign IS NOT NULL AND TRIM(source_campaign) != ''
             ORDER BY source_campaign",
        )
    }

    pub fn distinct_agent_types(&self) -> DeskResult<Vec<String>> {
        self.distinct_text(
            "SELECT DISTINCT agent_type FROM customer
             WHERE agent_type IS NOT NULL AND TRIM(agent_type) != ''
             ORDER BY agent_type",
        )
    }

    fn distinct_text(&self, sql: &str) -> DeskResult<Vec<String>> {
        let mut stmt = self.conn.prepare(sql)?;
        let values = stmt
            .query_map([], collect_strings)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(values)
    }
}
