//! Pages that consume the notification bridge.

/// Sync progress and recent activity
pub mod overview;
/// Governance proposals
pub mod proposals;

pub use overview::{OVERVIEW_PAGE_ID, OverviewPage, RecentTransactions};
pub use proposals::{PROPOSALS_PAGE_ID, ProposalDetailsModal, ProposalList, ProposalsPage};
