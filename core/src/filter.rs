//! Read filters for cancellation listings and summaries.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Saved-status tri-state. Deserializes through `FromStr`, so `"true"` and
/// `"false"` work alongside the variant names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum SavedStatus {
    #[default]
    Any,
    Saved,
    Lost,
}

impl FromStr for SavedStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "all" | "any" => Ok(Self::Any),
            "saved" | "true" => Ok(Self::Saved),
            "lost" | "false" => Ok(Self::Lost),
            other => Err(format!("unknown saved status '{other}'")),
        }
    }
}

impl TryFrom<String> for SavedStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CancellationFilter {
    /// Inclusive lower bound on cancellation date (ISO).
    pub start_date: Option<String>,
    /// Inclusive upper bound on cancellation date (ISO).
    pub end_date: Option<String>,
    pub closer: Option<String>,
    pub segment: Option<String>,
    /// Reason as typed; normalized before it reaches SQL.
    pub reason: Option<String>,
    pub saved: SavedStatus,
    /// Case-insensitive substring over customer name, email, reason and closer.
    pub query: Option<String>,
}

impl CancellationFilter {
    pub fn is_unfiltered(&self) -> bool {
        *self == Self::default()
    }

    pub fn saved_only() -> Self {
        Self {
            saved: SavedStatus::Saved,
            ..Self::default()
        }
    }
}
