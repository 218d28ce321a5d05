//! Types exchanged with the wallet library through its listener callbacks

use serde::{Deserialize, Serialize};

/// Overall sync progress shared by every stage-specific report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralSyncProgress {
    /// Overall progress in percent as reported by the library (not clamped).
    #[serde(rename = "totalSyncProgress")]
    pub total_sync_progress: i32,
    /// Estimated seconds until the whole sync completes.
    #[serde(rename = "totalTimeRemainingSeconds")]
    pub total_time_remaining_seconds: i64,
}

/// Progress while fetching compact filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CFiltersFetchProgressReport {
    #[serde(flatten)]
    pub general: GeneralSyncProgress,
    #[serde(rename = "totalCFiltersToFetch")]
    pub total_cfilters_to_fetch: i32,
    #[serde(rename = "currentCFilterHeight")]
    pub current_cfilter_height: i32,
    #[serde(rename = "cFiltersFetchProgress")]
    pub cfilters_fetch_progress: i32,
}

/// Progress while fetching block headers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadersFetchProgressReport {
    #[serde(flatten)]
    pub general: GeneralSyncProgress,
    /// Number of headers the library still has to download in this session.
    #[serde(rename = "totalHeadersToFetch")]
    pub total_headers_to_fetch: i32,
    #[serde(rename = "fetchedHeadersCount")]
    pub fetched_headers_count: i32,
    /// Unix timestamp of the most recently fetched header.
    #[serde(rename = "currentHeaderTimestamp")]
    pub current_header_timestamp: i64,
    #[serde(rename = "headersFetchProgress")]
    pub headers_fetch_progress: i32,
}

/// Progress while discovering used addresses of one wallet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressDiscoveryProgressReport {
    #[serde(flatten)]
    pub general: GeneralSyncProgress,
    #[serde(rename = "walletId")]
    pub wallet_id: i32,
    #[serde(rename = "addressDiscoveryProgress")]
    pub address_discovery_progress: i32,
}

/// Progress while rescanning headers for wallet transactions.
///
/// The same report shape is used for the sync rescan stage and for
/// user-initiated block rescans.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadersRescanProgressReport {
    #[serde(flatten)]
    pub general: GeneralSyncProgress,
    #[serde(rename = "walletId")]
    pub wallet_id: i32,
    #[serde(rename = "totalHeadersToScan")]
    pub total_headers_to_scan: i32,
    #[serde(rename = "currentRescanHeight")]
    pub current_rescan_height: i32,
    #[serde(rename = "rescanProgress")]
    pub rescan_progress: i32,
    #[serde(rename = "rescanTimeRemaining")]
    pub rescan_time_remaining: i64,
}

/// A governance proposal as reported by the politeia listener.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: i32,
    pub token: String,
    pub category: i32,
    pub name: String,
    pub username: String,
    #[serde(rename = "voteStatus")]
    pub vote_status: i32,
    pub timestamp: i64,
}

/// A wallet transaction decoded from the JSON passed to `on_transaction`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "walletID")]
    pub wallet_id: i32,
    pub hash: String,
    #[serde(rename = "type", default)]
    pub tx_type: String,
    #[serde(default)]
    pub direction: i32,
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    pub fee: i64,
    #[serde(rename = "blockHeight", default = "unmined_height")]
    pub block_height: i32,
    #[serde(default)]
    pub timestamp: i64,
}

fn unmined_height() -> i32 {
    -1
}

impl Transaction {
    /// Whether the transaction has been included in a block yet.
    pub fn is_mined(&self) -> bool {
        self.block_height >= 0
    }
}

/// Best block as returned by the library's synchronous accessor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInfo {
    pub height: i32,
    /// Unix timestamp of the block.
    pub timestamp: i64,
}

/// Errors returned by the wallet library
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LibraryError {
    #[error("Wallet is locked")]
    Locked,

    #[error("Listener already registered: {0}")]
    DuplicateListener(String),

    #[error("Wallet not found: {0}")]
    WalletNotFound(i32),

    #[error("Library error: {0}")]
    Other(String),
}
