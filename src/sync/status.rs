use crate::utils::{format_duration, format_time_ago};

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Number of ordered steps a full sync goes through.
pub const TOTAL_SYNC_STEPS: u8 = 4;

/// Sync steps in the order the library runs them
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SyncStep {
    FetchCFilters = 1,
    FetchHeaders = 2,
    DiscoverAddresses = 3,
    RescanHeaders = 4,
}

impl SyncStep {
    /// 1-based position of the step.
    pub fn ordinal(&self) -> u8 {
        *self as u8
    }

    pub fn name(&self) -> &'static str {
        match self {
            SyncStep::FetchCFilters => "Fetching block filters",
            SyncStep::FetchHeaders => "Fetching block headers",
            SyncStep::DiscoverAddresses => "Discovering used addresses",
            SyncStep::RescanHeaders => "Scanning blocks",
        }
    }
}

/// Progress of a user-initiated block rescan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RescanStatus {
    pub wallet_id: i32,
    pub progress_percent: u8,
    pub current_height: i32,
    pub remaining_time: Duration,
}

/// Folded view of every sync notification a page has seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStatus {
    pub is_syncing: bool,
    pub is_synced: bool,
    pub is_connected: bool,
    pub connected_peers: i32,
    pub best_block_height: i32,
    pub best_block_time: Option<DateTime<Utc>>,
    pub current_stage: Option<SyncStep>,
    /// Always within `0..=100`.
    pub stage_progress_percent: u8,
    pub remaining_time: Duration,
    pub completed_steps: u8,
    /// Headers left to download, recorded during [`SyncStep::FetchHeaders`].
    pub headers_to_fetch: i32,
    pub fetched_headers: i32,
    pub rescan: Option<RescanStatus>,
}

impl SyncStatus {
    /// Label such as `2m` for the estimated time left.
    pub fn remaining_time_label(&self) -> String {
        format_duration(self.remaining_time)
    }

    /// `Step 2/4` style label, or `None` outside an active step.
    pub fn step_label(&self) -> Option<String> {
        self.current_stage
            .filter(|_| self.is_syncing)
            .map(|step| format!("Step {}/{}", step.ordinal(), TOTAL_SYNC_STEPS))
    }

    /// How far a wallet at `wallet_height` is through the headers being fetched, in `0.0..=1.0`.
    pub fn wallet_header_ratio(&self, wallet_height: i32) -> f64 {
        let target = i64::from(self.best_block_height) + i64::from(self.headers_to_fetch);
        if target <= 0 {
            return 0.0;
        }
        (f64::from(wallet_height.max(0)) / target as f64).clamp(0.0, 1.0)
    }

    /// Age of the best block relative to `now`, e.g. `3m ago`.
    pub fn best_block_age_label(&self, now: DateTime<Utc>) -> Option<String> {
        self.best_block_time
            .map(|time| format_time_ago(now.timestamp(), time.timestamp()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steps_are_ranked() {
        assert!(SyncStep::FetchCFilters < SyncStep::FetchHeaders);
        assert!(SyncStep::FetchHeaders < SyncStep::DiscoverAddresses);
        assert!(SyncStep::DiscoverAddresses < SyncStep::RescanHeaders);
        assert_eq!(SyncStep::RescanHeaders.ordinal(), TOTAL_SYNC_STEPS);
    }

    #[test]
    fn test_wallet_header_ratio() {
        let status = SyncStatus {
            best_block_height: 600,
            headers_to_fetch: 400,
            ..Default::default()
        };
        assert_eq!(status.wallet_header_ratio(500), 0.5);
        assert_eq!(status.wallet_header_ratio(2_000), 1.0);
        assert_eq!(SyncStatus::default().wallet_header_ratio(10), 0.0);

        let extreme = SyncStatus {
            best_block_height: i32::MAX,
            headers_to_fetch: i32::MAX,
            ..Default::default()
        };
        assert_eq!(extreme.wallet_header_ratio(i32::MAX), 0.5);
    }

    #[test]
    fn test_step_label_only_while_syncing() {
        let mut status = SyncStatus {
            current_stage: Some(SyncStep::DiscoverAddresses),
            ..Default::default()
        };
        assert_eq!(status.step_label(), None);
        status.is_syncing = true;
        assert_eq!(status.step_label().as_deref(), Some("Step 3/4"));
    }
}
