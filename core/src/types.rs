//! Shared primitive types used across the desk.

/// Row identifier of a customer.
pub type CustomerId = i64;

/// Row identifier of a logged cancellation.
pub type CancellationId = i64;

/// Label used whenever a grouping key (segment, campaign) is absent.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Canonical fallback reason for empty input.
pub const OTHER_REASON: &str = "Other";

/// Canonical label the content-strategy insight keys on.
pub const CONTENT_NOT_RELEVANT: &str = "Content not relevant";
