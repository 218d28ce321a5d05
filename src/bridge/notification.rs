//! Typed notifications produced from wallet library callbacks.
//!
//! Every callback the library invokes becomes exactly one [`Notification`]. Each value carries
//! everything a consumer needs, so no consumer has to call back into the library to interpret it.
//!
//! Ordering contract: within one [`NotificationDomain`] notifications arrive in the order the
//! library invoked the callbacks. Across domains there is no ordering guarantee; a consumer that
//! listens to several domains sees whichever arrived last, and must not rely on, for example, a
//! block notification arriving after the sync notification that preceded it in the library.

use crate::library::{
    AddressDiscoveryProgressReport, CFiltersFetchProgressReport, HeadersFetchProgressReport,
    HeadersRescanProgressReport, Proposal, Transaction,
};

use serde::{Deserialize, Serialize};
use std::fmt;

/// The listener interfaces a page can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NotificationDomain {
    SyncProgress,
    BlocksRescan,
    Proposal,
    AccountMixer,
    TxAndBlock,
}

impl NotificationDomain {
    /// All domains in registration order.
    pub fn all() -> &'static [NotificationDomain] {
        &[
            NotificationDomain::SyncProgress,
            NotificationDomain::BlocksRescan,
            NotificationDomain::Proposal,
            NotificationDomain::AccountMixer,
            NotificationDomain::TxAndBlock,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            NotificationDomain::SyncProgress => "sync progress",
            NotificationDomain::BlocksRescan => "blocks rescan",
            NotificationDomain::Proposal => "proposal",
            NotificationDomain::AccountMixer => "account mixer",
            NotificationDomain::TxAndBlock => "tx and block",
        }
    }
}

impl fmt::Display for NotificationDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Stage reported by a sync progress callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncStage {
    Started,
    PeersConnected,
    CFiltersFetchProgress,
    HeadersFetchProgress,
    AddressDiscoveryProgress,
    HeadersRescanProgress,
    Completed,
    Canceled,
}

/// Stage-specific payload of a [`SyncStatusUpdate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProgressReport {
    CFiltersFetch(CFiltersFetchProgressReport),
    HeadersFetch(HeadersFetchProgressReport),
    AddressDiscovery(AddressDiscoveryProgressReport),
    HeadersRescan(HeadersRescanProgressReport),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStatusUpdate {
    pub stage: SyncStage,
    /// Only meaningful for [`SyncStage::PeersConnected`].
    pub connected_peers: i32,
    /// Absent for stages that carry no report.
    pub progress_report: Option<ProgressReport>,
}

impl SyncStatusUpdate {
    /// An update for a stage that carries neither a peer count nor a report.
    pub fn stage(stage: SyncStage) -> Self {
        Self {
            stage,
            connected_peers: 0,
            progress_report: None,
        }
    }

    pub fn peers(connected_peers: i32) -> Self {
        Self {
            stage: SyncStage::PeersConnected,
            connected_peers,
            progress_report: None,
        }
    }

    /// An update carrying a progress report; the stage is derived from the report kind.
    pub fn progress(report: ProgressReport) -> Self {
        let stage = match &report {
            ProgressReport::CFiltersFetch(_) => SyncStage::CFiltersFetchProgress,
            ProgressReport::HeadersFetch(_) => SyncStage::HeadersFetchProgress,
            ProgressReport::AddressDiscovery(_) => SyncStage::AddressDiscoveryProgress,
            ProgressReport::HeadersRescan(_) => SyncStage::HeadersRescanProgress,
        };
        Self {
            stage,
            connected_peers: 0,
            progress_report: Some(report),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RescanStage {
    Started,
    Progress,
    Ended,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RescanUpdate {
    pub stage: RescanStage,
    pub wallet_id: i32,
    /// Present only for [`RescanStage::Progress`].
    pub progress_report: Option<HeadersRescanProgressReport>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalStatus {
    Synced,
    NewProposalFound,
    VoteStarted,
    VoteFinished,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalUpdate {
    pub status: ProposalStatus,
    /// Absent when `status` is [`ProposalStatus::Synced`].
    pub proposal: Option<Proposal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MixerRunStatus {
    Started,
    Ended,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountMixerUpdate {
    pub wallet_id: i32,
    pub run_status: MixerRunStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxOrBlockKind {
    NewTx,
    BlockAttached,
    TxConfirmed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOrBlockNotification {
    pub kind: TxOrBlockKind,
    pub wallet_id: i32,
    /// Set for [`TxOrBlockKind::NewTx`].
    pub transaction: Option<Transaction>,
    /// Set for [`TxOrBlockKind::BlockAttached`] and [`TxOrBlockKind::TxConfirmed`].
    pub block_height: Option<i32>,
    /// Set for [`TxOrBlockKind::TxConfirmed`].
    pub hash: Option<String>,
}

/// One event delivered to a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Notification {
    SyncStatus(SyncStatusUpdate),
    Rescan(RescanUpdate),
    Proposal(ProposalUpdate),
    AccountMixer(AccountMixerUpdate),
    TxOrBlock(TxOrBlockNotification),
}

impl Notification {
    pub fn domain(&self) -> NotificationDomain {
        match self {
            Notification::SyncStatus(_) => NotificationDomain::SyncProgress,
            Notification::Rescan(_) => NotificationDomain::BlocksRescan,
            Notification::Proposal(_) => NotificationDomain::Proposal,
            Notification::AccountMixer(_) => NotificationDomain::AccountMixer,
            Notification::TxOrBlock(_) => NotificationDomain::TxAndBlock,
        }
    }
}
