//! Customer and cancellation records, intake payloads, and tenure derivation.

use crate::types::{CancellationId, CustomerId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub id: CustomerId,
    pub name: String,
    pub email: String,
    pub segment: Option<String>,
    pub agent_type: Option<String>,
    pub subscription_start_date: Option<String>,
    pub source_campaign: Option<String>,
}

/// Payload for creating a customer profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NewCustomer {
    pub name: String,
    pub email: String,
    pub segment: Option<String>,
    pub agent_type: Option<String>,
    pub subscription_start_date: Option<String>,
    pub source_campaign: Option<String>,
}

/// A stored cancellation joined with the fields of its customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancellationRecord {
    pub id: CancellationId,
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub email: String,
    pub segment: Option<String>,
    pub subscription_start_date: Option<String>,
    pub source_campaign: Option<String>,
    pub cancellation_date: String,
    pub primary_reason: String,
    pub secondary_notes: Option<String>,
    pub usage: UsageCounters,
    pub days_on_platform: Option<i64>,
    pub closer_name: Option<String>,
    pub saved_flag: bool,
    pub saved_by: Option<String>,
    pub save_reason: Option<String>,
    pub save_notes: Option<String>,
    pub ticket_url: Option<String>,
    pub churn_amount: Option<f64>,
    pub saved_revenue: Option<f64>,
    pub agent_plan: Option<String>,
    pub funds_disputed: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsageCounters {
    pub downloads: i64,
    pub posts: i64,
    pub logins: i64,
    pub minutes: i64,
}

impl UsageCounters {
    pub fn is_non_negative(&self) -> bool {
        self.downloads >= 0 && self.posts >= 0 && self.logins >= 0 && self.minutes >= 0
    }
}

/// Intake payload as submitted. Required fields are optional here so
/// that missing values can be reported instead of failing to parse.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NewCancellation {
    pub customer_id: Option<CustomerId>,
    pub cancellation_date: Option<String>,
    pub primary_reason: Option<String>,
    pub secondary_notes: Option<String>,
    pub usage: UsageCounters,
    pub closer_name: Option<String>,
    pub saved_flag: bool,
    pub saved_by: Option<String>,
    pub save_reason: Option<String>,
    pub save_notes: Option<String>,
    pub ticket_url: Option<String>,
    pub churn_amount: Option<f64>,
    pub saved_revenue: Option<f64>,
    pub agent_plan: Option<String>,
    pub funds_disputed: bool,
}

/// A validated, normalized cancellation ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct CancellationDraft {
    pub customer_id: CustomerId,
    pub cancellation_date: String,
    pub primary_reason: String,
    pub secondary_notes: Option<String>,
    pub usage: UsageCounters,
    pub days_on_platform: Option<i64>,
    pub closer_name: Option<String>,
    pub saved_flag: bool,
    pub saved_by: Option<String>,
    pub save_reason: Option<String>,
    pub save_notes: Option<String>,
    pub ticket_url: Option<String>,
    pub churn_amount: Option<f64>,
    pub saved_revenue: Option<f64>,
    pub agent_plan: Option<String>,
    pub funds_disputed: bool,
}

/// Partial update of an existing cancellation. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CancellationPatch {
    pub primary_reason: Option<String>,
    pub secondary_notes: Option<String>,
    pub closer_name: Option<String>,
    pub saved_flag: Option<bool>,
    pub saved_by: Option<String>,
    pub save_reason: Option<String>,
    pub save_notes: Option<String>,
    pub ticket_url: Option<String>,
    pub churn_amount: Option<f64>,
    pub saved_revenue: Option<f64>,
    pub agent_plan: Option<String>,
    pub funds_disputed: Option<bool>,
}

impl CancellationPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn touches_save_details(&self) -> bool {
        self.saved_by.is_some() || self.save_reason.is_some() || self.save_notes.is_some()
    }
}

/// Parse an ISO calendar date. A trailing time component
/// (`2025-01-03T10:00:00Z`, `2025-01-03 10:00`) is ignored.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    let day_part = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(day_part, "%Y-%m-%d").ok()
}

/// Whole days between subscription start and cancellation, floored at 0.
/// Absent when either date is missing or unparseable.
pub fn days_on_platform(subscription_start: Option<&str>, cancellation_date: &str) -> Option<i64> {
    let start = parse_date(subscription_start?)?;
    let end = parse_date(cancellation_date)?;
    Some((end - start).num_days().max(0))
}

/// Trim optional text, treating blank strings as absent.
pub(crate) fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tenure_counts_whole_days() {
        assert_eq!(days_on_platform(Some("2024-10-15"), "2025-01-03"), Some(80));
        assert_eq!(days_on_platform(Some("2025-01-01"), "2025-01-08"), Some(7));
        assert_eq!(days_on_platform(Some("2025-01-01"), "2025-01-01"), Some(0));
    }

    #[test]
    fn tenure_is_floored_at_zero() {
        assert_eq!(days_on_platform(Some("2025-03-01"), "2025-02-01"), Some(0));
    }

    #[test]
    fn tenure_is_absent_for_missing_or_invalid_dates() {
        assert_eq!(days_on_platform(None, "2025-02-01"), None);
        assert_eq!(days_on_platform(Some(""), "2025-02-01"), None);
        assert_eq!(days_on_platform(Some("2025-02-30"), "2025-03-01"), None);
        assert_eq!(days_on_platform(Some("2025-01-01"), "yesterday"), None);
    }

    #[test]
    fn time_suffix_is_ignored() {
        assert_eq!(
            days_on_platform(Some("2025-01-01T23:59:00Z"), "2025-01-02 00:01"),
            Some(1)
        );
    }

    #[test]
    fn empty_patch_is_detected() {
        assert!(CancellationPatch::default().is_empty());
        let patch = CancellationPatch {
            funds_disputed: Some(true),
            ..Default::default()
        };
        assert!(!patch.is_empty());
        assert!(!patch.touches_save_details());
    }
}
