//! Wallet library collaborator
//!
//! The wallet library owns synchronization, key management and transaction construction. This
//! module describes the surface the UI bridge consumes from it: one listener trait per
//! notification domain, registration pairs keyed by a subscriber id, and the synchronous
//! accessors read after a sync finishes.
//!
//! Listener callbacks are invoked on threads owned by the library. Implementations must return
//! quickly and must never call back into the library from inside a callback.

/// In-process implementation used by the demo binary and tests
pub mod memory;
/// Payload types carried by listener callbacks
mod types;

pub use memory::InMemoryWallet;
pub use types::*;

use std::sync::Arc;

/// Sync progress callbacks.
pub trait SyncProgressListener: Send + Sync {
	fn on_sync_started(&self, was_restarted: bool);
	fn on_peer_connected_or_disconnected(&self, num_peers: i32);
	fn on_cfilters_fetch_progress(&self, report: &CFiltersFetchProgressReport);
	fn on_headers_fetch_progress(&self, report: &HeadersFetchProgressReport);
	fn on_address_discovery_progress(&self, report: &AddressDiscoveryProgressReport);
	fn on_headers_rescan_progress(&self, report: &HeadersRescanProgressReport);
	fn on_sync_completed(&self);
	fn on_sync_canceled(&self, will_restart: bool);
	fn on_sync_ended_with_error(&self, err: &LibraryError);
	fn debug(&self, info: &str);
}

/// Block rescan callbacks.
pub trait BlocksRescanProgressListener: Send + Sync {
	fn on_blocks_rescan_started(&self, wallet_id: i32);
	fn on_blocks_rescan_progress(&self, report: &HeadersRescanProgressReport);
	fn on_blocks_rescan_ended(&self, wallet_id: i32, err: Option<&LibraryError>);
}

/// Governance proposal callbacks.
pub trait ProposalNotificationListener: Send + Sync {
	fn on_proposals_synced(&self);
	fn on_new_proposal(&self, proposal: &Proposal);
	fn on_proposal_vote_started(&self, proposal: &Proposal);
	fn on_proposal_vote_finished(&self, proposal: &Proposal);
}

/// Account mixer callbacks.
pub trait AccountMixerNotificationListener: Send + Sync {
	fn on_account_mixer_started(&self, wallet_id: i32);
	fn on_account_mixer_ended(&self, wallet_id: i32);
}

/// Transaction and block callbacks.
pub trait TxAndBlockNotificationListener: Send + Sync {
	/// `transaction` is the JSON encoding of a [`Transaction`].
	fn on_transaction(&self, transaction: &str);
	fn on_block_attached(&self, wallet_id: i32, block_height: i32);
	fn on_transaction_confirmed(&self, wallet_id: i32, hash: &str, block_height: i32);
}

/// Synchronous state accessors, safe for concurrent reads.
pub trait SyncStateSource: Send + Sync {
	fn is_synced(&self) -> Result<bool, LibraryError>;
	fn is_connected_to_network(&self) -> Result<bool, LibraryError>;
	fn best_block(&self) -> Result<BlockInfo, LibraryError>;
}

/// Listener registration surface of the wallet library.
///
/// Each `add_*` call is keyed by `id`. Registering an id that is already present replaces the
/// previous listener in the library; callers track their own registrations so each is removed
/// exactly once.
pub trait WalletLibrary: SyncStateSource {
	fn add_sync_progress_listener(
		&self,
		listener: Arc<dyn SyncProgressListener>,
		id: &str,
	) -> Result<(), LibraryError>;
	fn remove_sync_progress_listener(&self, id: &str);

	fn add_blocks_rescan_progress_listener(
		&self,
		listener: Arc<dyn BlocksRescanProgressListener>,
		id: &str,
	) -> Result<(), LibraryError>;
	fn remove_blocks_rescan_progress_listener(&self, id: &str);

	fn add_proposal_notification_listener(
		&self,
		listener: Arc<dyn ProposalNotificationListener>,
		id: &str,
	) -> Result<(), LibraryError>;
	fn remove_proposal_notification_listener(&self, id: &str);

	fn add_account_mixer_notification_listener(
		&self,
		listener: Arc<dyn AccountMixerNotificationListener>,
		id: &str,
	) -> Result<(), LibraryError>;
	fn remove_account_mixer_notification_listener(&self, id: &str);

	fn add_tx_and_block_notification_listener(
		&self,
		listener: Arc<dyn TxAndBlockNotificationListener>,
		id: &str,
	) -> Result<(), LibraryError>;
	fn remove_tx_and_block_notification_listener(&self, id: &str);
}
