//! Store roster handling
//!
//! Components:
//! - `input`: Roster CSV loading and address column detection
//! - `domain`: Raw address normalization to bare domains
//! - `shard`: Deterministic roster partitioning across worker shards

mod domain;
mod input;
mod shard;

// Re-export main types
pub use domain::normalize_domain;
pub use input::{load_roster, url_column, URL_COLUMN_TOKENS};
pub use shard::{partition, shard_bounds, Shard};
