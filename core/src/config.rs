use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Case-insensitive alias table mapping free-text reasons to canonical labels.
/// Keys are stored lowercased; lookups must pass a trimmed, lowercased key.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(from = "HashMap<String, String>", into = "HashMap<String, String>")]
pub struct ReasonAliases {
    table: HashMap<String, String>,
}

impl ReasonAliases {
    pub fn lookup(&self, lowercase_key: &str) -> Option<&str> {
        self.table.get(lowercase_key).map(String::as_str)
    }

    /// Distinct canonical labels, sorted.
    #[cfg(test)]
    pub fn canonical_labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = self.table.values().cloned().collect();
        labels.sort();
        labels.dedup();
        labels
    }
}

impl From<HashMap<String, String>> for ReasonAliases {
    fn from(raw: HashMap<String, String>) -> Self {
        let table = raw
            .into_iter()
            .map(|(alias, canonical)| (alias.trim().to_lowercase(), canonical))
            .collect();
        Self { table }
    }
}

impl From<ReasonAliases> for HashMap<String, String> {
    fn from(aliases: ReasonAliases) -> Self {
        aliases.table
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for ReasonAliases {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        iter.into_iter()
            .map(|(a, c)| (a.to_string(), c.to_string()))
            .collect::<HashMap<_, _>>()
            .into()
    }
}

fn default_early_churn_days() -> i64 {
    7
}

fn default_top_reason_count() -> usize {
    3
}

/// Static desk configuration. Loaded once at startup and passed by
/// reference; nothing mutates it afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeskConfig {
    /// Fixed closer roster, in display order.
    pub closers: Vec<String>,
    pub reason_aliases: ReasonAliases,
    #[serde(default)]
    pub agent_types: Vec<String>,
    #[serde(default)]
    pub agent_plans: Vec<String>,
    /// Tenure (days, inclusive) at or below which a cancellation counts as early churn.
    #[serde(default = "default_early_churn_days")]
    pub early_churn_days: i64,
    #[serde(default = "default_top_reason_count")]
    pub top_reason_count: usize,
}

impl DeskConfig {
    /// Load from `{data_dir}/desk/desk_config.json`.
    /// Without a data directory, use DeskConfig::default().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/desk/desk_config.json");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: DeskConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Invalid desk config {path}: {e}"))?;
        if config.closers.is_empty() {
            anyhow::bail!("Desk config {path} lists no closers");
        }
        Ok(config)
    }

    /// Config with a small roster, used by tests that need exact closer sets.
    pub fn with_closers(closers: &[&str]) -> Self {
        Self {
            closers: closers.iter().map(|c| c.to_string()).collect(),
            ..Self::default()
        }
    }
}

impl Default for DeskConfig {
    fn default() -> Self {
        let closers = [
            "Ava Liang",
            "Diego Morales",
            "Priya Shah",
            "Marcus Lee",
            "Hannah Cho",
            "Noah Patel",
        ];

        let reason_aliases: ReasonAliases = [
            ("content", "Content not relevant"),
            ("content not relevant", "Content not relevant"),
            ("content irrelevant", "Content not relevant"),
            ("not enough content", "Content not relevant"),
            ("not getting results", "Not getting results"),
            ("no results", "Not getting results"),
            ("lead quality", "Lead quality concerns"),
            ("too expensive", "Pricing objection"),
            ("price", "Pricing objection"),
            ("price too high", "Pricing objection"),
            ("no time", "No time to focus"),
            ("too busy", "No time to focus"),
            ("switched platforms", "Switched to competitor"),
            ("competitor", "Switched to competitor"),
            ("other", "Other"),
        ]
        .into_iter()
        .collect();

        let agent_types = ["Realtor", "Mortgage Broker", "Insurance Advisor", "Financial Advisor"];

        let agent_plans = [
            "Basic Monthly",
            "Basic Yearly",
            "Premium Monthly",
            "Premium 6 Month",
            "Premium Yearly",
            "Platinum 6 Month",
            "Platinum Yearly",
            "Diamond 6 Month",
            "Diamond Yearly",
        ];

        Self {
            closers: closers.iter().map(|s| s.to_string()).collect(),
            reason_aliases,
            agent_types: agent_types.iter().map(|s| s.to_string()).collect(),
            agent_plans: agent_plans.iter().map(|s| s.to_string()).collect(),
            early_churn_days: default_early_churn_days(),
            top_reason_count: default_top_reason_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_keys_are_lowercased_on_load() {
        let json = r#"{
            "closers": ["Ava Liang"],
            "reason_aliases": { "  Too Expensive ": "Pricing objection" }
        }"#;
        let config: DeskConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.reason_aliases.lookup("too expensive"), Some("Pricing objection"));
        assert_eq!(config.early_churn_days, 7);
        assert_eq!(config.top_reason_count, 3);
    }

    #[test]
    fn bundled_config_matches_builtin_defaults() {
        let data_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/../data");
        let loaded = DeskConfig::load(data_dir).unwrap();
        let builtin = DeskConfig::default();
        assert_eq!(loaded.closers, builtin.closers);
        assert_eq!(loaded.reason_aliases, builtin.reason_aliases);
        assert_eq!(loaded.agent_plans, builtin.agent_plans);
    }

    #[test]
    fn missing_config_file_is_reported() {
        let err = DeskConfig::load("/nonexistent-desk-dir").unwrap_err();
        assert!(err.to_string().contains("Cannot read"), "{err}");
    }
}
