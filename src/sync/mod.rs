//! Sync status
//!
//! - `status`: the [`SyncStatus`] aggregate a page reads during redraw, plus the ordered
//!   [`SyncStep`]s of a sync.
//! - `aggregator`: [`SyncStatusAggregator`], the notification handler that keeps it current.

/// Folding sync notifications into a status value
pub mod aggregator;
/// Sync status value types
pub mod status;

pub use aggregator::{SyncStatusAggregator, SyncStatusHandle};
pub use status::*;
