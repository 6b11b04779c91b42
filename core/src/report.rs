//! Export rendering: flat CSV rows and the monthly report document.
//!
//! Everything here is derived from records, the churn summary, and the
//! insight list. No figures are computed independently.

use crate::{
    aggregator::ChurnSummary,
    insights::format_percent,
    record::CancellationRecord,
};
use chrono::{DateTime, Utc};
use std::fmt::Write;

pub const CANCELLATIONS_CSV_FILENAME: &str = "cancellations.csv";
pub const SAVED_CASES_CSV_FILENAME: &str = "saved-cases.csv";
pub const MONTHLY_REPORT_FILENAME: &str = "monthly-report.txt";

const CANCELLATION_HEADERS: [&str; 12] = [
    "id",
    "customer",
    "email",
    "segment",
    "closer",
    "cancellation_date",
    "primary_reason",
    "saved",
    "churn_amount",
    "saved_revenue",
    "funds_disputed",
    "ticket_url",
];

const SAVED_CASE_HEADERS: [&str; 8] = [
    "id",
    "customer",
    "closer",
    "saved_by",
    "save_reason",
    "save_notes",
    "saved_revenue",
    "cancellation_date",
];

fn yes_no(flag: bool) -> Option<String> {
    Some(if flag { "Yes" } else { "No" }.to_string())
}

fn escape_cell(value: Option<&str>) -> String {
    match value {
        None => String::new(),
        Some(v) => format!("\"{}\"", v.replace('"', "\"\"")),
    }
}

/// Encode rows as CSV: a bare header line, then every present cell quoted
/// with embedded quotes doubled and absent cells left empty. Returns `None`
/// for an empty row set.
pub fn to_csv(headers: &[&str], rows: &[Vec<Option<String>>]) -> Option<String> {
    if rows.is_empty() {
        return None;
    }
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(headers.join(","));
    for row in rows {
        let cells: Vec<String> = row.iter().map(|c| escape_cell(c.as_deref())).collect();
        lines.push(cells.join(","));
    }
    Some(lines.join("\n"))
}

pub fn cancellations_csv(records: &[CancellationRecord]) -> Option<String> {
    let rows: Vec<Vec<Option<String>>> = records
        .iter()
        .map(|r| {
            vec![
                Some(r.id.to_string()),
                Some(r.customer_name.clone()),
                Some(r.email.clone()),
                r.segment.clone(),
                r.closer_name.clone(),
                Some(r.cancellation_date.clone()),
                Some(r.primary_reason.clone()),
                yes_no(r.saved_flag),
                r.churn_amount.map(|v| format!("{v:.2}")),
                r.saved_revenue.map(|v| format!("{v:.2}")),
                yes_no(r.funds_disputed),
                r.ticket_url.clone(),
            ]
        })
        .collect();
    to_csv(&CANCELLATION_HEADERS, &rows)
}

/// Saved cases only; unsaved records in `records` are skipped.
pub fn saved_cases_csv(records: &[CancellationRecord]) -> Option<String> {
    let rows: Vec<Vec<Option<String>>> = records
        .iter()
        .filter(|r| r.saved_flag)
        .map(|r| {
            vec![
                Some(r.id.to_string()),
                Some(r.customer_name.clone()),
                r.closer_name.clone(),
                r.saved_by.clone(),
                r.save_reason.clone(),
                r.save_notes.clone(),
                r.saved_revenue.map(|v| format!("{v:.2}")),
                Some(r.cancellation_date.clone()),
            ]
        })
        .collect();
    to_csv(&SAVED_CASE_HEADERS, &rows)
}

/// Plain-text monthly report: key metrics, reason breakdown, closer
/// performance, and numbered insights.
pub fn monthly_report(
    summary: &ChurnSummary,
    insights: &[String],
    generated_at: DateTime<Utc>,
) -> String {
    let mut doc = String::new();
    let underline = |title: &str| format!("{title}\n{}", "-".repeat(title.len()));

    // Writing into a String cannot fail.
    let _ = writeln!(doc, "Monthly Churn Report");
    let _ = writeln!(doc, "====================");
    let _ = writeln!(doc, "Generated: {}", generated_at.format("%Y-%m-%d %H:%M UTC"));
    let _ = writeln!(doc);

    let _ = writeln!(doc, "{}", underline("Key Metrics"));
    let _ = writeln!(doc, "Total cancellations: {}", summary.total_cancellations);
    let _ = writeln!(doc, "Total saved cases: {}", summary.total_saved);
    let _ = writeln!(doc, "Save rate: {}", format_percent(summary.save_rate));
    let _ = writeln!(doc, "Avg days on platform: {}", summary.avg_days_on_platform);
    let _ = writeln!(doc);

    let _ = writeln!(doc, "{}", underline("Reason Breakdown"));
    for reason in &summary.reason_counts {
        let _ = writeln!(doc, "{}: {} cancellations", reason.reason, reason.count);
    }
    let _ = writeln!(doc);

    let _ = writeln!(doc, "{}", underline("Closer Performance"));
    for closer in &summary.closers {
        let _ = writeln!(
            doc,
            "{}: {} saves / {} cancels (Save rate {})",
            closer.name,
            closer.saves,
            closer.losses,
            format_percent(closer.save_rate)
        );
    }
    let _ = writeln!(doc);

    let _ = writeln!(doc, "{}", underline("Insights"));
    for (idx, insight) in insights.iter().enumerate() {
        let _ = writeln!(doc, "{}. {insight}", idx + 1);
    }
    doc
}
