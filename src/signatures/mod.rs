//! Signature module for provider detection
//!
//! This module provides the provider fingerprint table and the matcher that
//! classifies page bodies against it.
//!
//! # Components
//!
//! - `SignatureTable`: Ordered provider → token table, built-in or from TOML
//! - `ProviderMatcher`: The detection contract the scanner works against
//! - `KeywordMatcher`: Baseline case-insensitive substring implementation

mod matcher;
mod table;

// Re-export main types
pub use matcher::{KeywordMatcher, ProviderMatcher};
pub use table::{ProviderSignature, SignatureTable, GENERIC_PROVIDER};
