//! Aggregation over a cancellation snapshot.
//!
//! Produces the exact counts and rates every read surface and the insight
//! engine work from. All ratios define x/0 as 0.

use crate::{
    config::DeskConfig,
    record::{CancellationRecord, CustomerRecord},
    types::{CustomerId, UNKNOWN_LABEL},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ── Public types ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasonCount {
    pub reason: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloserSummary {
    pub name:      String,
    pub saves:     u64,
    pub losses:    u64,
    pub total:     u64,
    pub save_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignSummary {
    pub campaign:      String,
    /// Customers acquired through the campaign.
    pub customers:     u64,
    pub cancellations: u64,
    pub churn_rate:    f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChurnSummary {
    pub total_cancellations:  u64,
    pub total_saved:          u64,
    pub save_rate:            f64,
    pub avg_days_on_platform: i64,
    /// Most frequent reasons, label order on ties.
    pub top_reasons:          Vec<ReasonCount>,
    /// Every reason with its count, in label order.
    pub reason_counts:        Vec<ReasonCount>,
    pub early_churn_count:    u64,
    /// One entry per roster closer, in roster order.
    pub closers:              Vec<CloserSummary>,
    /// Campaign cohorts in label order.
    pub campaigns:            Vec<CampaignSummary>,
}

/// `numerator / denominator`, or 0 when the denominator is 0.
pub fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

// ── Aggregation ──────────────────────────────────────────────────────────────

/// Summarize `records` against the customer population and the configured
/// closer roster.
///
/// `customers` defines the campaign cohorts: each campaign's customer count
/// covers every customer acquired through it, whether or not they appear
/// in `records`.
pub fn summarize(
    records: &[CancellationRecord],
    customers: &[CustomerRecord],
    config: &DeskConfig,
) -> ChurnSummary {
    let total = records.len() as u64;
    let saved = records.iter().filter(|r| r.saved_flag).count() as u64;

    let tenures: Vec<i64> = records.iter().filter_map(|r| r.days_on_platform).collect();
    let avg_days_on_platform = if tenures.is_empty() {
        0
    } else {
        (tenures.iter().sum::<i64>() as f64 / tenures.len() as f64).round() as i64
    };

    let early_churn_count = tenures
        .iter()
        .filter(|&&days| days <= config.early_churn_days)
        .count() as u64;

    let reason_counts = count_reasons(records);
    let top_reasons = top_n(&reason_counts, config.top_reason_count);

    ChurnSummary {
        total_cancellations: total,
        total_saved: saved,
        save_rate: ratio(saved, total),
        avg_days_on_platform,
        top_reasons,
        reason_counts,
        early_churn_count,
        closers: closer_stats(records, &config.closers),
        campaigns: campaign_stats(records, customers),
    }
}

fn count_reasons(records: &[CancellationRecord]) -> Vec<ReasonCount> {
    let mut counts: Vec<ReasonCount> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for record in records {
        match index.get(record.primary_reason.as_str()) {
            Some(&i) => counts[i].count += 1,
            None => {
                index.insert(&record.primary_reason, counts.len());
                counts.push(ReasonCount {
                    reason: record.primary_reason.clone(),
                    count: 1,
                });
            }
        }
    }
    // Byte order, the same as SQLite's default collation for GROUP BY.
    counts.sort_by(|a, b| a.reason.cmp(&b.reason));
    counts
}

/// Highest counts first. `sort_by` is stable, so equal counts keep
/// label order.
fn top_n(counts: &[ReasonCount], n: usize) -> Vec<ReasonCount> {
    let mut sorted = counts.to_vec();
    sorted.sort_by(|a, b| b.count.cmp(&a.count));
    sorted.truncate(n);
    sorted
}

/// Stats for every roster closer. Records handled by someone off the
/// roster, or by nobody, are not attributed.
pub fn closer_stats(records: &[CancellationRecord], roster: &[String]) -> Vec<CloserSummary> {
    roster
        .iter()
        .map(|name| {
            let handled = records
                .iter()
                .filter(|r| r.closer_name.as_deref() == Some(name.as_str()));
            let (total, saves) = handled.fold((0u64, 0u64), |(total, saves), r| {
                (total + 1, saves + u64::from(r.saved_flag))
            });
            CloserSummary {
                name: name.clone(),
                saves,
                losses: total - saves,
                total,
                save_rate: ratio(saves, total),
            }
        })
        .collect()
}

/// Campaign cohorts sorted by label; an absent campaign is grouped under
/// "Unknown".
pub fn campaign_stats(
    records: &[CancellationRecord],
    customers: &[CustomerRecord],
) -> Vec<CampaignSummary> {
    let label = |campaign: &Option<String>| -> String {
        campaign
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(UNKNOWN_LABEL)
            .to_string()
    };

    let mut summaries: Vec<CampaignSummary> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut campaign_of: HashMap<CustomerId, usize> = HashMap::new();

    let mut slot = |name: String, summaries: &mut Vec<CampaignSummary>| -> usize {
        *index.entry(name.clone()).or_insert_with(|| {
            summaries.push(CampaignSummary {
                campaign: name,
                customers: 0,
                cancellations: 0,
                churn_rate: 0.0,
            });
            summaries.len() - 1
        })
    };

    for customer in customers {
        let i = slot(label(&customer.source_campaign), &mut summaries);
        summaries[i].customers += 1;
        campaign_of.insert(customer.id, i);
    }

    for record in records {
        let i = match campaign_of.get(&record.customer_id) {
            Some(&i) => i,
            None => slot(label(&record.source_campaign), &mut summaries),
        };
        summaries[i].cancellations += 1;
    }

    for summary in &mut summaries {
        summary.churn_rate = ratio(summary.cancellations, summary.customers);
    }
    summaries.sort_by(|a, b| a.campaign.cmp(&b.campaign));
    summaries
}
