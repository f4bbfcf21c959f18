//! State module for scan outcomes
//!
//! This module provides the terminal record types a store scan produces.
//!
//! # Components
//!
//! - `ScanStatus`: The mutually exclusive terminal classification of one store
//! - `StoreResult`: The full per-store record handed from scheduler to writer
//! - `ProviderHits`: Provider detections accumulated with page attribution

mod result;
mod status;

// Re-export main types
pub use result::{ProviderHits, ProviderPages, StoreResult, SubscriptionProduct};
pub use status::ScanStatus;
