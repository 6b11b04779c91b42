//! The desk facade: every read, write, export, and metadata operation.
//!
//! RULES:
//!   - Reasons are normalized before they are stored or used as filters.
//!   - Tenure is derived at intake from the customer's subscription start.
//!   - Save details exist only on saved cancellations.
//!   - Summaries and exports are computed from one store snapshot per call.

use crate::{
    aggregator::{self, CampaignSummary, ChurnSummary, CloserSummary, ReasonCount},
    config::DeskConfig,
    error::{DeskError, DeskResult},
    filter::CancellationFilter,
    insights::generate_insights,
    reason::normalize_reason,
    record::{
        days_on_platform, non_blank, CancellationDraft, CancellationPatch, CancellationRecord,
        CustomerRecord, NewCancellation, NewCustomer,
    },
    report,
    store::{DeskStore, MonthlyChurnPoint, SegmentReasons},
    types::{CancellationId, CustomerId},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Payload types ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverviewTotals {
    pub total_cancellations:  u64,
    pub total_saved:          u64,
    pub save_rate:            f64,
    pub avg_days_on_platform: i64,
    pub top_reasons:          Vec<ReasonCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overview {
    pub totals:   OverviewTotals,
    pub insights: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasonStats {
    pub overall:    Vec<ReasonCount>,
    pub by_segment: Vec<SegmentReasons>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeskMetadata {
    pub closers:     Vec<String>,
    pub segments:    Vec<String>,
    pub reasons:     Vec<String>,
    pub campaigns:   Vec<String>,
    pub agent_types: Vec<String>,
    pub agent_plans: Vec<String>,
}

/// A rendered export ready to hand to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportDocument {
    pub filename:     String,
    pub content_type: String,
    pub body:         String,
}

// ── Desk ─────────────────────────────────────────────────────────────────────

pub struct ChurnDesk {
    config: DeskConfig,
    store:  DeskStore,
}

impl ChurnDesk {
    /// Wrap an already-migrated store.
    pub fn new(config: DeskConfig, store: DeskStore) -> Self {
        Self { config, store }
    }

    /// Migrated in-memory desk with the built-in configuration.
    pub fn build_test() -> DeskResult<Self> {
        Self::build_test_with(DeskConfig::default())
    }

    pub fn build_test_with(config: DeskConfig) -> DeskResult<Self> {
        let store = DeskStore::in_memory()?;
        store.migrate()?;
        Ok(Self::new(config, store))
    }

    pub fn config(&self) -> &DeskConfig {
        &self.config
    }

    pub fn store(&self) -> &DeskStore {
        &self.store
    }

    pub fn normalize_reason(&self, raw: Option<&str>) -> String {
        normalize_reason(raw, &self.config.reason_aliases)
    }

    // ── Customers ──────────────────────────────────────────────

    pub fn list_customers(&self) -> DeskResult<Vec<CustomerRecord>> {
        logged("list customers", self.store.all_customers())
    }

    pub fn create_customer(&self, new: NewCustomer) -> DeskResult<CustomerRecord> {
        let name = non_blank(Some(new.name.as_str()));
        let email = non_blank(Some(new.email.as_str()));
        let (name, email) = match (name, email) {
            (Some(n), Some(e)) => (n, e),
            _ => return Err(rejected(DeskError::validation("name and email are required."))),
        };

        if logged("lookup customer", self.store.customer_by_email(&email))?.is_some() {
            return Err(rejected(DeskError::validation(format!(
                "A customer with email {email} already exists."
            ))));
        }

        let clean = NewCustomer {
            name,
            email,
            segment: non_blank(new.segment.as_deref()),
            agent_type: non_blank(new.agent_type.as_deref()),
            subscription_start_date: non_blank(new.subscription_start_date.as_deref()),
            source_campaign: non_blank(new.source_campaign.as_deref()),
        };
        let id = logged("create customer", self.store.insert_customer(&clean))?;
        log::info!("Created customer {id} ({})", clean.email);
        self.require_customer(id)
    }

    fn require_customer(&self, id: CustomerId) -> DeskResult<CustomerRecord> {
        logged("read customer", self.store.get_customer(id))?
            .ok_or(DeskError::NotFound { entity: "Customer", id })
    }

    // ── Cancellations ──────────────────────────────────────────

    pub fn list_cancellations(
        &self,
        filter: &CancellationFilter,
    ) -> DeskResult<Vec<CancellationRecord>> {
        let filter = self.normalized_filter(filter);
        logged("list cancellations", self.store.list_cancellations(&filter))
    }

    pub fn get_cancellation(&self, id: CancellationId) -> DeskResult<CancellationRecord> {
        logged("read cancellation", self.store.get_cancellation(id))?
            .ok_or(DeskError::NotFound { entity: "Cancellation", id })
    }

    /// Validate, normalize, and store an intake submission, then return the
    /// record as read back from the store.
    pub fn create_cancellation(&self, new: NewCancellation) -> DeskResult<CancellationRecord> {
        let draft = self.draft_cancellation(new).map_err(rejected)?;
        let id = logged("create cancellation", self.store.insert_cancellation(&draft))?;
        log::info!(
            "Logged cancellation {id} for customer {} ({})",
            draft.customer_id,
            draft.primary_reason
        );
        self.get_cancellation(id)
    }

    fn draft_cancellation(&self, new: NewCancellation) -> DeskResult<CancellationDraft> {
        let cancellation_date = non_blank(new.cancellation_date.as_deref());
        let reason_given = non_blank(new.primary_reason.as_deref()).is_some();
        let (customer_id, cancellation_date) = match (new.customer_id, cancellation_date) {
            (Some(c), Some(d)) if reason_given => (c, d),
            _ => {
                return Err(DeskError::validation(
                    "customer_id, cancellation_date, and primary_reason are required.",
                ))
            }
        };

        if !new.usage.is_non_negative() {
            return Err(DeskError::validation("usage counters cannot be negative."));
        }

        let customer = self.require_customer(customer_id)?;
        let saved_flag = new.saved_flag;

        Ok(CancellationDraft {
            customer_id,
            days_on_platform: days_on_platform(
                customer.subscription_start_date.as_deref(),
                &cancellation_date,
            ),
            cancellation_date,
            primary_reason: self.normalize_reason(new.primary_reason.as_deref()),
            secondary_notes: non_blank(new.secondary_notes.as_deref()),
            usage: new.usage,
            closer_name: non_blank(new.closer_name.as_deref()),
            saved_flag,
            saved_by: non_blank(new.saved_by.as_deref()).filter(|_| saved_flag),
            save_reason: non_blank(new.save_reason.as_deref()).filter(|_| saved_flag),
            save_notes: non_blank(new.save_notes.as_deref()).filter(|_| saved_flag),
            ticket_url: non_blank(new.ticket_url.as_deref()),
            churn_amount: new.churn_amount,
            saved_revenue: new.saved_revenue,
            agent_plan: non_blank(new.agent_plan.as_deref()),
            funds_disputed: new.funds_disputed,
        })
    }

    /// Apply a partial patch and return the re-read record.
    ///
    /// Unsetting the saved flag clears the save details. Save details sent
    /// for a record that stays unsaved are rejected.
    pub fn update_cancellation(
        &self,
        id: CancellationId,
        patch: CancellationPatch,
    ) -> DeskResult<CancellationRecord> {
        if patch.is_empty() {
            return Err(rejected(DeskError::validation("No fields to update.")));
        }
        let current = self.get_cancellation(id).map_err(rejected)?;

        let saved_after = patch.saved_flag.unwrap_or(current.saved_flag);
        if !saved_after && patch.touches_save_details() {
            return Err(rejected(DeskError::validation(
                "Save details require saved_flag to be true.",
            )));
        }
        let clear_save_details = current.saved_flag && !saved_after;

        let mut patch = patch;
        if patch.primary_reason.is_some() {
            patch.primary_reason = Some(self.normalize_reason(patch.primary_reason.as_deref()));
        }

        logged(
            "update cancellation",
            self.store.apply_cancellation_patch(id, &patch, clear_save_details),
        )?;
        log::info!("Updated cancellation {id}");
        self.get_cancellation(id)
    }

    pub fn saved_cases(&self) -> DeskResult<Vec<CancellationRecord>> {
        self.list_cancellations(&CancellationFilter::saved_only())
    }

    // ── Analytics ──────────────────────────────────────────────

    /// Aggregate the cancellations matching `filter`.
    pub fn summary(&self, filter: &CancellationFilter) -> DeskResult<ChurnSummary> {
        let records = self.list_cancellations(filter)?;
        let customers = logged("load customers", self.store.customers_by_id())?;
        Ok(aggregator::summarize(&records, &customers, &self.config))
    }

    pub fn overview(&self, filter: &CancellationFilter) -> DeskResult<Overview> {
        let summary = self.summary(filter)?;
        let insights = generate_insights(&summary);
        Ok(Overview {
            totals: OverviewTotals {
                total_cancellations: summary.total_cancellations,
                total_saved: summary.total_saved,
                save_rate: summary.save_rate,
                avg_days_on_platform: summary.avg_days_on_platform,
                top_reasons: summary.top_reasons,
            },
            insights,
        })
    }

    pub fn insights(&self, filter: &CancellationFilter) -> DeskResult<Vec<String>> {
        Ok(generate_insights(&self.summary(filter)?))
    }

    pub fn reason_stats(&self) -> DeskResult<ReasonStats> {
        let summary = self.summary(&CancellationFilter::default())?;
        let by_segment = logged("reasons by segment", self.store.reasons_by_segment())?;
        Ok(ReasonStats {
            overall: summary.reason_counts,
            by_segment,
        })
    }

    pub fn closer_stats(&self) -> DeskResult<Vec<CloserSummary>> {
        Ok(self.summary(&CancellationFilter::default())?.closers)
    }

    pub fn campaign_stats(&self) -> DeskResult<Vec<CampaignSummary>> {
        Ok(self.summary(&CancellationFilter::default())?.campaigns)
    }

    pub fn monthly_churn(&self) -> DeskResult<Vec<MonthlyChurnPoint>> {
        logged("monthly churn", self.store.monthly_churn())
    }

    // ── Exports ────────────────────────────────────────────────

    /// All cancellations as CSV, or `None` when there are none.
    pub fn export_cancellations_csv(&self) -> DeskResult<Option<ExportDocument>> {
        let records = self.list_cancellations(&CancellationFilter::default())?;
        Ok(report::cancellations_csv(&records)
            .map(|body| csv_document(report::CANCELLATIONS_CSV_FILENAME, body)))
    }

    /// Saved cases as CSV, or `None` when there are none.
    pub fn export_saved_cases_csv(&self) -> DeskResult<Option<ExportDocument>> {
        let records = self.saved_cases()?;
        Ok(report::saved_cases_csv(&records)
            .map(|body| csv_document(report::SAVED_CASES_CSV_FILENAME, body)))
    }

    pub fn monthly_report(&self, generated_at: DateTime<Utc>) -> DeskResult<ExportDocument> {
        let summary = self.summary(&CancellationFilter::default())?;
        let insights = generate_insights(&summary);
        Ok(ExportDocument {
            filename: report::MONTHLY_REPORT_FILENAME.to_string(),
            content_type: "text/plain".to_string(),
            body: report::monthly_report(&summary, &insights, generated_at),
        })
    }

    // ── Metadata ───────────────────────────────────────────────

    pub fn metadata(&self) -> DeskResult<DeskMetadata> {
        let mut agent_types = self.config.agent_types.clone();
        for observed in logged("agent types", self.store.distinct_agent_types())? {
            if !agent_types.contains(&observed) {
                agent_types.push(observed);
            }
        }

        Ok(DeskMetadata {
            closers: self.config.closers.clone(),
            segments: logged("segments", self.store.distinct_segments())?,
            reasons: logged("reasons", self.store.distinct_reasons())?,
            campaigns: logged("campaigns", self.store.distinct_campaigns())?,
            agent_types,
            agent_plans: self.config.agent_plans.clone(),
        })
    }

    fn normalized_filter(&self, filter: &CancellationFilter) -> CancellationFilter {
        CancellationFilter {
            start_date: non_blank(filter.start_date.as_deref()),
            end_date: non_blank(filter.end_date.as_deref()),
            closer: non_blank(filter.closer.as_deref()),
            segment: non_blank(filter.segment.as_deref()),
            reason: non_blank(filter.reason.as_deref())
                .map(|r| self.normalize_reason(Some(r.as_str()))),
            saved: filter.saved,
            query: non_blank(filter.query.as_deref()),
        }
    }
}

fn csv_document(filename: &str, body: String) -> ExportDocument {
    ExportDocument {
        filename: filename.to_string(),
        content_type: "text/csv".to_string(),
        body,
    }
}

/// Log store failures before they propagate. Client errors pass through.
fn logged<T>(operation: &str, result: DeskResult<T>) -> DeskResult<T> {
    result.map_err(|e| {
        if !e.is_client_error() {
            log::error!("Failed to {operation}: {e}");
        }
        e
    })
}

/// Log a rejected request at warn level and pass the error on.
fn rejected(e: DeskError) -> DeskError {
    if e.is_client_error() {
        log::warn!("Rejected request: {e}");
    }
    e
}
