//! Provider matching against page content
//!
//! The matcher is the polymorphism seam of the detection layer: anything that
//! can turn a page body into a list of provider names plugs into the scanner.
//! The shipped implementation is a case-insensitive keyword matcher over the
//! flat signature table; richer matchers (DOM-attribute walks, structured
//! data) can replace it behind the same contract.

use crate::signatures::table::{SignatureTable, GENERIC_PROVIDER};
use std::sync::Arc;

/// Classifies one page body into the providers detectable on it
pub trait ProviderMatcher: Send + Sync {
    /// Returns detected provider names in table order
    ///
    /// The generic fallback bucket must not appear alongside named
    /// providers: a page that matches both reports only the named ones.
    fn providers_in(&self, body: &str) -> Vec<String>;
}

/// Baseline matcher: case-insensitive substring search of fingerprint tokens
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    table: Arc<SignatureTable>,
}

impl KeywordMatcher {
    pub fn new(table: Arc<SignatureTable>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &SignatureTable {
        &self.table
    }
}

impl ProviderMatcher for KeywordMatcher {
    fn providers_in(&self, body: &str) -> Vec<String> {
        if body.is_empty() {
            return Vec::new();
        }
        let body_lower = body.to_lowercase();

        let mut detected: Vec<String> = Vec::new();
        for provider in self.table.providers() {
            // Any single token hit detects the provider
            if provider
                .tokens
                .iter()
                .any(|token| !token.is_empty() && body_lower.contains(token.as_str()))
            {
                detected.push(provider.name.clone());
            }
        }

        // Page-level generic suppression
        if detected.iter().any(|name| name != GENERIC_PROVIDER) {
            detected.retain(|name| name != GENERIC_PROVIDER);
        }
        detected
    }
}
