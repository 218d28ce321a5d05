//!
//! Utility module for the wallet UI bridge.
//!
//! Re-exports formatting helpers used by the sync status aggregator and the pages.
/// Formatting helpers for display
pub mod index;

pub use index::{format_amount, format_duration, format_time_ago, percent};
