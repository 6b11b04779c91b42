//! Line-oriented request protocol for the desk.
//!
//! One JSON object per request, tagged by `"type"`. Every request yields
//! exactly one response envelope: `{"ok": payload}` or
//! `{"error": {"kind", "message"}}`.

use crate::{
    desk::ChurnDesk,
    error::{DeskError, DeskResult},
    filter::CancellationFilter,
    record::{CancellationPatch, NewCancellation, NewCustomer},
    types::CancellationId,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeskRequest {
    Health,
    ListCancellations {
        #[serde(default)]
        filter: CancellationFilter,
    },
    GetCancellation {
        id: CancellationId,
    },
    CreateCancellation {
        cancellation: NewCancellation,
    },
    UpdateCancellation {
        id: CancellationId,
        patch: CancellationPatch,
    },
    ListCustomers,
    CreateCustomer {
        customer: NewCustomer,
    },
    Overview {
        #[serde(default)]
        filter: CancellationFilter,
    },
    Insights {
        #[serde(default)]
        filter: CancellationFilter,
    },
    ReasonStats,
    CloserStats,
    CampaignStats,
    SavedCases,
    MonthlyChurn,
    ExportCancellations,
    ExportSavedCases,
    MonthlyReport,
    Metadata,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub kind:    String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeskResponse {
    Ok(Value),
    Error(ErrorBody),
}

impl DeskResponse {
    pub fn from_result(result: DeskResult<Value>) -> Self {
        match result {
            Ok(payload) => Self::Ok(payload),
            Err(e) => Self::Error(ErrorBody {
                kind: e.kind().to_string(),
                message: e.to_string(),
            }),
        }
    }

    /// Response for a line that could not be parsed as a request.
    pub fn malformed(e: &serde_json::Error) -> Self {
        Self::Error(ErrorBody {
            kind: "validation".to_string(),
            message: format!("Malformed request: {e}"),
        })
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }
}

impl ChurnDesk {
    /// Dispatch one request. `Quit` is a transport concern and is answered
    /// like `Health`.
    pub fn handle(&self, request: DeskRequest) -> DeskResult<Value> {
        log::debug!("Handling {request:?}");
        let payload = match request {
            DeskRequest::Health | DeskRequest::Quit => json!({ "status": "ok" }),
            DeskRequest::ListCancellations { filter } => {
                serde_json::to_value(self.list_cancellations(&filter)?)?
            }
            DeskRequest::GetCancellation { id } => {
                serde_json::to_value(self.get_cancellation(id)?)?
            }
            DeskRequest::CreateCancellation { cancellation } => {
                serde_json::to_value(self.create_cancellation(cancellation)?)?
            }
            DeskRequest::UpdateCancellation { id, patch } => {
                serde_json::to_value(self.update_cancellation(id, patch)?)?
            }
            DeskRequest::ListCustomers => serde_json::to_value(self.list_customers()?)?,
            DeskRequest::CreateCustomer { customer } => {
                serde_json::to_value(self.create_customer(customer)?)?
            }
            DeskRequest::Overview { filter } => serde_json::to_value(self.overview(&filter)?)?,
            DeskRequest::Insights { filter } => serde_json::to_value(self.insights(&filter)?)?,
            DeskRequest::ReasonStats => serde_json::to_value(self.reason_stats()?)?,
            DeskRequest::CloserStats => serde_json::to_value(self.closer_stats()?)?,
            DeskRequest::CampaignStats => serde_json::to_value(self.campaign_stats()?)?,
            DeskRequest::SavedCases => serde_json::to_value(self.saved_cases()?)?,
            DeskRequest::MonthlyChurn => serde_json::to_value(self.monthly_churn()?)?,
            // An empty export is a null payload: nothing to download.
            DeskRequest::ExportCancellations => {
                serde_json::to_value(self.export_cancellations_csv()?)?
            }
            DeskRequest::ExportSavedCases => serde_json::to_value(self.export_saved_cases_csv()?)?,
            DeskRequest::MonthlyReport => serde_json::to_value(self.monthly_report(Utc::now())?)?,
            DeskRequest::Metadata => serde_json::to_value(self.metadata()?)?,
        };
        Ok(payload)
    }

    /// Parse and dispatch one request line.
    pub fn respond_to_line(&self, line: &str) -> DeskResponse {
        match serde_json::from_str::<DeskRequest>(line) {
            Ok(request) => DeskResponse::from_result(self.handle(request)),
            Err(e) => {
                log::warn!("Malformed request line: {e}");
                DeskResponse::malformed(&e)
            }
        }
    }
}

impl From<DeskError> for DeskResponse {
    fn from(e: DeskError) -> Self {
        Self::from_result(Err(e))
    }
}
