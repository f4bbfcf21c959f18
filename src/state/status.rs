//! Terminal status definitions for store scans
//!
//! This module defines the mutually exclusive outcome classifications a store
//! can end a scan with. Every store receives exactly one of these.

use std::fmt;

/// The terminal outcome of one store's scan
///
/// Statuses are assigned by the store scanner, except `Timeout`, which only
/// the scheduler assigns when a scan task exceeds its wall-clock ceiling.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScanStatus {
    /// The input row normalized to an empty domain and was never scanned
    Skipped,

    /// The storefront refused or failed to serve content; carries the HTTP
    /// status code or transport error tag that stopped the scan
    Blocked(String),

    /// The store was reachable but shows no subscription capability
    NoSubscription,

    /// A provider signature was matched somewhere, but no enrolled catalog
    /// item could be confirmed (typically the product API is walled off)
    AppDetectedNoProductApi,

    /// At least one catalog item with a selling plan was confirmed
    Found,

    /// The scan task was abandoned by the scheduler
    Timeout,
}

impl ScanStatus {
    /// Builds a `Blocked` status from a fetch status label
    pub fn blocked(tag: impl Into<String>) -> Self {
        Self::Blocked(tag.into())
    }

    /// Returns true if the store counts as having subscription commerce
    ///
    /// Both confirmed products and signature-only detections count; this is
    /// the filter behind the subscription-store report views.
    pub fn has_subscription_signal(&self) -> bool {
        matches!(self, Self::Found | Self::AppDetectedNoProductApi)
    }

    /// Returns true if the storefront blocked the scan
    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked(_))
    }

    /// Returns true if the store was never actually scanned
    pub fn is_unscanned(&self) -> bool {
        matches!(self, Self::Skipped | Self::Timeout)
    }

    /// Converts the status to its report label
    ///
    /// This is the string written to `Status` columns in shard artifacts.
    pub fn label(&self) -> String {
        match self {
            Self::Skipped => "skipped".to_string(),
            Self::Blocked(tag) => format!("blocked_{}", tag),
            Self::NoSubscription => "no_subscription".to_string(),
            Self::AppDetectedNoProductApi => "app_detected_no_product_api".to_string(),
            Self::Found => "found".to_string(),
            Self::Timeout => "timeout".to_string(),
        }
    }

    /// Parses a status from its report label
    ///
    /// Returns None if the string doesn't match any known status.
    pub fn from_label(s: &str) -> Option<Self> {
        match s {
            "skipped" => Some(Self::Skipped),
            "no_subscription" => Some(Self::NoSubscription),
            "app_detected_no_product_api" => Some(Self::AppDetectedNoProductApi),
            "found" => Some(Self::Found),
            "timeout" => Some(Self::Timeout),
            other => other
                .strip_prefix("blocked_")
                .map(|tag| Self::Blocked(tag.to_string())),
        }
    }
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_subscription_signal() {
        assert!(ScanStatus::Found.has_subscription_signal());
        assert!(ScanStatus::AppDetectedNoProductApi.has_subscription_signal());

        assert!(!ScanStatus::Skipped.has_subscription_signal());
        assert!(!ScanStatus::NoSubscription.has_subscription_signal());
        assert!(!ScanStatus::Blocked("403".to_string()).has_subscription_signal());
        assert!(!ScanStatus::Timeout.has_subscription_signal());
    }

    #[test]
    fn test_is_blocked() {
        assert!(ScanStatus::Blocked("429".to_string()).is_blocked());
        assert!(ScanStatus::Blocked("timeout".to_string()).is_blocked());

        assert!(!ScanStatus::Found.is_blocked());
        assert!(!ScanStatus::Timeout.is_blocked());
    }

    #[test]
    fn test_is_unscanned() {
        assert!(ScanStatus::Skipped.is_unscanned());
        assert!(ScanStatus::Timeout.is_unscanned());

        assert!(!ScanStatus::NoSubscription.is_unscanned());
        assert!(!ScanStatus::Blocked("500".to_string()).is_unscanned());
    }

    #[test]
    fn test_label() {
        assert_eq!(ScanStatus::Skipped.label(), "skipped");
        assert_eq!(ScanStatus::Blocked("403".to_string()).label(), "blocked_403");
        assert_eq!(
            ScanStatus::Blocked("timeout".to_string()).label(),
            "blocked_timeout"
        );
        assert_eq!(ScanStatus::NoSubscription.label(), "no_subscription");
        assert_eq!(
            ScanStatus::AppDetectedNoProductApi.label(),
            "app_detected_no_product_api"
        );
        assert_eq!(ScanStatus::Found.label(), "found");
        assert_eq!(ScanStatus::Timeout.label(), "timeout");
    }

    #[test]
    fn test_from_label() {
        assert_eq!(ScanStatus::from_label("skipped"), Some(ScanStatus::Skipped));
        assert_eq!(
            ScanStatus::from_label("blocked_403"),
            Some(ScanStatus::Blocked("403".to_string()))
        );
        assert_eq!(
            ScanStatus::from_label("blocked_json_error"),
            Some(ScanStatus::Blocked("json_error".to_string()))
        );
        assert_eq!(
            ScanStatus::from_label("no_subscription"),
            Some(ScanStatus::NoSubscription)
        );
        assert_eq!(
            ScanStatus::from_label("app_detected_no_product_api"),
            Some(ScanStatus::AppDetectedNoProductApi)
        );
        assert_eq!(ScanStatus::from_label("found"), Some(ScanStatus::Found));
        assert_eq!(ScanStatus::from_label("timeout"), Some(ScanStatus::Timeout));
        assert_eq!(ScanStatus::from_label("invalid"), None);
        assert_eq!(ScanStatus::from_label(""), None);
    }

    #[test]
    fn test_roundtrip_label() {
        let statuses = vec![
            ScanStatus::Skipped,
            ScanStatus::Blocked("500".to_string()),
            ScanStatus::Blocked("connect".to_string()),
            ScanStatus::NoSubscription,
            ScanStatus::AppDetectedNoProductApi,
            ScanStatus::Found,
            ScanStatus::Timeout,
        ];
        for status in statuses {
            let label = status.label();
            let parsed = ScanStatus::from_label(&label);
            assert_eq!(Some(status), parsed, "Failed roundtrip for {}", label);
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", ScanStatus::Found), "found");
        assert_eq!(
            format!("{}", ScanStatus::Blocked("429".to_string())),
            "blocked_429"
        );
        assert_eq!(format!("{}", ScanStatus::Timeout), "timeout");
    }
}
