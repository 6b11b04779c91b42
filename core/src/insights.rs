//! Insight rule engine: turns a churn summary into ordered observations.
//!
//! Rules run in a fixed order and each contributes at most one message,
//! except closer coaching, which contributes one message per flagged closer:
//!   1. No data          (short-circuits everything else)
//!   2. Top reason       (content-strategy OR primary-driver, never both)
//!   3. Onboarding gap   (early churn share)
//!   4. Closer coaching  (per closer, roster order)
//!   5. Campaign quality (highest churn-rate campaign only)
//!   6. Retention program (overall save rate)
//!   7. Balanced         (only when nothing above fired)
//!
//! Thresholds are fixed policy, not configuration.

use crate::{
    aggregator::{CampaignSummary, ChurnSummary, CloserSummary, ReasonCount},
    types::CONTENT_NOT_RELEVANT,
};

pub const CONTENT_SHARE_THRESHOLD: f64 = 0.25;
pub const PRIMARY_DRIVER_SHARE_THRESHOLD: f64 = 0.20;
pub const EARLY_CHURN_SHARE_THRESHOLD: f64 = 0.40;
/// A closer is flagged when more than this far below the team mean.
pub const COACHING_GAP: f64 = 0.15;
pub const CAMPAIGN_CHURN_THRESHOLD: f64 = 0.20;
pub const RETENTION_SAVE_RATE_THRESHOLD: f64 = 0.20;

pub const NO_DATA_MESSAGE: &str =
    "No churn data yet. Keep capturing cancellation calls to unlock insights.";
pub const BALANCED_MESSAGE: &str =
    "Churn mix looks balanced. Continue monitoring weekly to catch new trends early.";

/// Render a 0..1 ratio as a percentage with one decimal, e.g. `23.4%`.
pub fn format_percent(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

/// Evaluate every rule against `summary`.
pub fn generate_insights(summary: &ChurnSummary) -> Vec<String> {
    let total = summary.total_cancellations;
    if total == 0 {
        return vec![NO_DATA_MESSAGE.to_string()];
    }

    let mut insights = Vec::new();
    insights.extend(top_reason_insight(&summary.reason_counts, total));
    insights.extend(onboarding_insight(summary.early_churn_count, total));
    insights.extend(coaching_insights(&summary.closers));
    insights.extend(campaign_insight(&summary.campaigns));
    insights.extend(retention_insight(summary.save_rate));

    if insights.is_empty() {
        insights.push(BALANCED_MESSAGE.to_string());
    }
    insights
}

/// The most frequent reason; the earliest label wins on ties.
fn top_reason(reason_counts: &[ReasonCount]) -> Option<&ReasonCount> {
    reason_counts.iter().fold(None, |best: Option<&ReasonCount>, candidate| match best {
        Some(b) if b.count >= candidate.count => Some(b),
        _ => Some(candidate),
    })
}

fn top_reason_insight(reason_counts: &[ReasonCount], total: u64) -> Option<String> {
    let top = top_reason(reason_counts)?;
    let share = top.count as f64 / total as f64;

    if top.reason == CONTENT_NOT_RELEVANT && share > CONTENT_SHARE_THRESHOLD {
        Some(format!(
            "Content strategy misalignment: {} of churn cites \"{CONTENT_NOT_RELEVANT}\". \
             Partner with marketing to refresh content packs for that segment.",
            format_percent(share)
        ))
    } else if share > PRIMARY_DRIVER_SHARE_THRESHOLD {
        Some(format!(
            "Primary churn driver: {} of lost accounts cite \"{}\". \
             Prioritize fixes and enablement materials around this reason.",
            format_percent(share),
            top.reason
        ))
    } else {
        None
    }
}

fn onboarding_insight(early_churn_count: u64, total: u64) -> Option<String> {
    let share = early_churn_count as f64 / total as f64;
    (share > EARLY_CHURN_SHARE_THRESHOLD).then(|| {
        format!(
            "Onboarding gap: {} of churn happens within the first week. \
             Tighten welcome journeys, customer success touchpoints, and in-app walkthroughs.",
            format_percent(share)
        )
    })
}

/// Mean save rate over closers who handled at least one call.
pub fn team_save_rate(closers: &[CloserSummary]) -> f64 {
    let active: Vec<f64> = closers
        .iter()
        .filter(|c| c.total > 0)
        .map(|c| c.save_rate)
        .collect();
    if active.is_empty() {
        0.0
    } else {
        active.iter().sum::<f64>() / active.len() as f64
    }
}

fn coaching_insights(closers: &[CloserSummary]) -> Vec<String> {
    let mean = team_save_rate(closers);
    closers
        .iter()
        .filter(|c| c.total > 0 && c.save_rate + COACHING_GAP < mean)
        .map(|c| {
            format!(
                "Closer coaching: {} is saving {} of calls vs the team average {}. \
                 Schedule a shadow session and a refresher.",
                c.name,
                format_percent(c.save_rate),
                format_percent(mean)
            )
        })
        .collect()
}

/// The campaign with the highest nonzero churn rate; the earliest label wins
/// on ties.
fn highest_churn_campaign(campaigns: &[CampaignSummary]) -> Option<&CampaignSummary> {
    campaigns
        .iter()
        .filter(|c| c.churn_rate > 0.0)
        .fold(None, |best: Option<&CampaignSummary>, candidate| match best {
            Some(b) if b.churn_rate >= candidate.churn_rate => Some(b),
            _ => Some(candidate),
        })
}

fn campaign_insight(campaigns: &[CampaignSummary]) -> Option<String> {
    let highest = highest_churn_campaign(campaigns)?;
    (highest.churn_rate > CAMPAIGN_CHURN_THRESHOLD).then(|| {
        format!(
            "Campaign quality check: {} is driving {} churn of its cohort. \
             Review targeting, messaging, and follow-up journeys.",
            highest.campaign,
            format_percent(highest.churn_rate)
        )
    })
}

fn retention_insight(save_rate: f64) -> Option<String> {
    (save_rate < RETENTION_SAVE_RATE_THRESHOLD).then(|| {
        format!(
            "Retention program opportunity: overall save rate is {}. \
             Consider refreshed offers or enablement assets.",
            format_percent(save_rate)
        )
    })
}
