//! Reason normalization: free-text cancellation reasons → canonical labels.
//!
//! Applied before a reason is stored and before it is used as a filter, so
//! grouping always happens on canonical labels.

use crate::{config::ReasonAliases, types::OTHER_REASON};

/// Map raw reason text to its canonical label.
///
/// Alias hits return the canonical label. Unknown but non-empty input is
/// returned trimmed with its original casing. Empty or absent input becomes
/// "Other". Never fails.
pub fn normalize_reason(raw: Option<&str>, aliases: &ReasonAliases) -> String {
    let trimmed = raw.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        return OTHER_REASON.to_string();
    }

    match aliases.lookup(&trimmed.to_lowercase()) {
        Some(canonical) => canonical.to_string(),
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DeskConfig;

    fn aliases() -> ReasonAliases {
        DeskConfig::default().reason_aliases
    }

    #[test]
    fn empty_and_absent_input_fall_back_to_other() {
        let aliases = aliases();
        assert_eq!(normalize_reason(Some(""), &aliases), "Other");
        assert_eq!(normalize_reason(Some("   \t"), &aliases), "Other");
        assert_eq!(normalize_reason(None, &aliases), "Other");
    }

    #[test]
    fn alias_lookup_ignores_case_and_padding() {
        let aliases = aliases();
        assert_eq!(normalize_reason(Some("PRICE"), &aliases), "Pricing objection");
        assert_eq!(normalize_reason(Some("  Too Busy "), &aliases), "No time to focus");
        assert_eq!(normalize_reason(Some("content"), &aliases), "Content not relevant");
    }

    #[test]
    fn unknown_reason_keeps_original_casing() {
        let aliases = aliases();
        assert_eq!(
            normalize_reason(Some("  Broker Mandated Switch "), &aliases),
            "Broker Mandated Switch"
        );
    }

    #[test]
    fn canonical_labels_are_fixed_points() {
        let aliases = aliases();
        for label in aliases.canonical_labels() {
            assert_eq!(normalize_reason(Some(&label), &aliases), label);
        }
    }
}
