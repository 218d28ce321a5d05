//! In-process wallet library.
//!
//! `InMemoryWallet` keeps listener registrations in memory and exposes `emit_*` methods that fan a
//! callback out to every registered listener, the way the real library does from its own sync
//! threads. Sync state returned by the accessors is set directly by the caller. It backs the demo
//! binary and the test suites.

use super::types::*;
use super::{
	AccountMixerNotificationListener, BlocksRescanProgressListener, ProposalNotificationListener,
	SyncProgressListener, SyncStateSource, TxAndBlockNotificationListener, WalletLibrary,
};
use crate::bridge::NotificationDomain;

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
	mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Listeners of one domain keyed by subscriber id.
struct Registry<L: ?Sized> {
	listeners: Mutex<HashMap<String, Arc<L>>>,
	total_adds: Mutex<usize>,
}

impl<L: ?Sized> Registry<L> {
	fn new() -> Self {
		Self {
			listeners: Mutex::new(HashMap::new()),
			total_adds: Mutex::new(0),
		}
	}

	fn add(&self, id: &str, listener: Arc<L>) {
		// Duplicate ids replace silently.
		lock(&self.listeners).insert(id.to_string(), listener);
		*lock(&self.total_adds) += 1;
	}

	fn remove(&self, id: &str) {
		lock(&self.listeners).remove(id);
	}

	/// Clones the listeners out so callbacks run without holding the lock.
	fn snapshot(&self) -> Vec<Arc<L>> {
		lock(&self.listeners).values().cloned().collect()
	}

	fn ids(&self) -> Vec<String> {
		let mut ids: Vec<String> = lock(&self.listeners).keys().cloned().collect();
		ids.sort();
		ids
	}

	fn total_adds(&self) -> usize {
		*lock(&self.total_adds)
	}
}

#[derive(Debug, Clone, Copy, Default)]
struct ChainState {
	synced: bool,
	connected: bool,
	best_block: BlockInfo,
	locked: bool,
}

/// Wallet library that lives entirely in process memory
pub struct InMemoryWallet {
	sync: Registry<dyn SyncProgressListener>,
	rescan: Registry<dyn BlocksRescanProgressListener>,
	proposal: Registry<dyn ProposalNotificationListener>,
	mixer: Registry<dyn AccountMixerNotificationListener>,
	tx_block: Registry<dyn TxAndBlockNotificationListener>,
	rejected: Mutex<HashSet<NotificationDomain>>,
	state: Mutex<ChainState>,
}

impl Default for InMemoryWallet {
	fn default() -> Self {
		Self::new()
	}
}

impl InMemoryWallet {
	pub fn new() -> Self {
		Self {
			sync: Registry::new(),
			rescan: Registry::new(),
			proposal: Registry::new(),
			mixer: Registry::new(),
			tx_block: Registry::new(),
			rejected: Mutex::new(HashSet::new()),
			state: Mutex::new(ChainState::default()),
		}
	}

	pub fn set_synced(&self, synced: bool) {
		lock(&self.state).synced = synced;
	}

	pub fn set_connected(&self, connected: bool) {
		lock(&self.state).connected = connected;
	}

	pub fn set_best_block(&self, best_block: BlockInfo) {
		lock(&self.state).best_block = best_block;
	}

	/// While locked every synchronous accessor fails with [`LibraryError::Locked`].
	pub fn set_locked(&self, locked: bool) {
		lock(&self.state).locked = locked;
	}

	/// Makes every later registration for `domain` fail.
	pub fn reject_registrations(&self, domain: NotificationDomain) {
		lock(&self.rejected).insert(domain);
	}

	/// Subscriber ids currently registered for `domain`, sorted.
	pub fn listener_ids(&self, domain: NotificationDomain) -> Vec<String> {
		match domain {
			NotificationDomain::SyncProgress => self.sync.ids(),
			NotificationDomain::BlocksRescan => self.rescan.ids(),
			NotificationDomain::Proposal => self.proposal.ids(),
			NotificationDomain::AccountMixer => self.mixer.ids(),
			NotificationDomain::TxAndBlock => self.tx_block.ids(),
		}
	}

	/// Number of successful `add_*` calls ever made for `domain`.
	pub fn total_registrations(&self, domain: NotificationDomain) -> usize {
		match domain {
			NotificationDomain::SyncProgress => self.sync.total_adds(),
			NotificationDomain::BlocksRescan => self.rescan.total_adds(),
			NotificationDomain::Proposal => self.proposal.total_adds(),
			NotificationDomain::AccountMixer => self.mixer.total_adds(),
			NotificationDomain::TxAndBlock => self.tx_block.total_adds(),
		}
	}

	fn check_rejected(&self, domain: NotificationDomain, id: &str) -> Result<(), LibraryError> {
		if lock(&self.rejected).contains(&domain) {
			return Err(LibraryError::DuplicateListener(id.to_string()));
		}
		debug!("Registering {} listener {}", domain, id);
		Ok(())
	}

	pub fn emit_sync_started(&self, was_restarted: bool) {
		for listener in self.sync.snapshot() {
			listener.on_sync_started(was_restarted);
		}
	}

	pub fn emit_peers_changed(&self, num_peers: i32) {
		for listener in self.sync.snapshot() {
			listener.on_peer_connected_or_disconnected(num_peers);
		}
	}

	pub fn emit_cfilters_fetch_progress(&self, report: &CFiltersFetchProgressReport) {
		for listener in self.sync.snapshot() {
			listener.on_cfilters_fetch_progress(report);
		}
	}

	pub fn emit_headers_fetch_progress(&self, report: &HeadersFetchProgressReport) {
		for listener in self.sync.snapshot() {
			listener.on_headers_fetch_progress(report);
		}
	}

	pub fn emit_address_discovery_progress(&self, report: &AddressDiscoveryProgressReport) {
		for listener in self.sync.snapshot() {
			listener.on_address_discovery_progress(report);
		}
	}

	pub fn emit_headers_rescan_progress(&self, report: &HeadersRescanProgressReport) {
		for listener in self.sync.snapshot() {
			listener.on_headers_rescan_progress(report);
		}
	}

	/// Marks the chain synced and connected before notifying, as the real library does.
	pub fn emit_sync_completed(&self) {
		{
			let mut state = lock(&self.state);
			state.synced = true;
			state.connected = true;
		}
		for listener in self.sync.snapshot() {
			listener.on_sync_completed();
		}
	}

	pub fn emit_sync_canceled(&self, will_restart: bool) {
		lock(&self.state).synced = false;
		for listener in self.sync.snapshot() {
			listener.on_sync_canceled(will_restart);
		}
	}

	pub fn emit_sync_ended_with_error(&self, err: &LibraryError) {
		for listener in self.sync.snapshot() {
			listener.on_sync_ended_with_error(err);
		}
	}

	pub fn emit_blocks_rescan_started(&self, wallet_id: i32) {
		for listener in self.rescan.snapshot() {
			listener.on_blocks_rescan_started(wallet_id);
		}
	}

	pub fn emit_blocks_rescan_progress(&self, report: &HeadersRescanProgressReport) {
		for listener in self.rescan.snapshot() {
			listener.on_blocks_rescan_progress(report);
		}
	}

	pub fn emit_blocks_rescan_ended(&self, wallet_id: i32, err: Option<&LibraryError>) {
		for listener in self.rescan.snapshot() {
			listener.on_blocks_rescan_ended(wallet_id, err);
		}
	}

	pub fn emit_proposals_synced(&self) {
		for listener in self.proposal.snapshot() {
			listener.on_proposals_synced();
		}
	}

	pub fn emit_new_proposal(&self, proposal: &Proposal) {
		for listener in self.proposal.snapshot() {
			listener.on_new_proposal(proposal);
		}
	}

	pub fn emit_proposal_vote_started(&self, proposal: &Proposal) {
		for listener in self.proposal.snapshot() {
			listener.on_proposal_vote_started(proposal);
		}
	}

	pub fn emit_proposal_vote_finished(&self, proposal: &Proposal) {
		for listener in self.proposal.snapshot() {
			listener.on_proposal_vote_finished(proposal);
		}
	}

	pub fn emit_account_mixer_started(&self, wallet_id: i32) {
		for listener in self.mixer.snapshot() {
			listener.on_account_mixer_started(wallet_id);
		}
	}

	pub fn emit_account_mixer_ended(&self, wallet_id: i32) {
		for listener in self.mixer.snapshot() {
			listener.on_account_mixer_ended(wallet_id);
		}
	}

	pub fn emit_transaction(&self, transaction_json: &str) {
		for listener in self.tx_block.snapshot() {
			listener.on_transaction(transaction_json);
		}
	}

	/// Advances the best block before notifying.
	pub fn emit_block_attached(&self, wallet_id: i32, block_height: i32, timestamp: i64) {
		{
			let mut state = lock(&self.state);
			if block_height > state.best_block.height {
				state.best_block = BlockInfo {
					height: block_height,
					timestamp,
				};
			}
		}
		for listener in self.tx_block.snapshot() {
			listener.on_block_attached(wallet_id, block_height);
		}
	}

	pub fn emit_transaction_confirmed(&self, wallet_id: i32, hash: &str, block_height: i32) {
		for listener in self.tx_block.snapshot() {
			listener.on_transaction_confirmed(wallet_id, hash, block_height);
		}
	}
}

impl SyncStateSource for InMemoryWallet {
	fn is_synced(&self) -> Result<bool, LibraryError> {
		let state = lock(&self.state);
		if state.locked {
			return Err(LibraryError::Locked);
		}
		Ok(state.synced)
	}

	fn is_connected_to_network(&self) -> Result<bool, LibraryError> {
		let state = lock(&self.state);
		if state.locked {
			return Err(LibraryError::Locked);
		}
		Ok(state.connected)
	}

	fn best_block(&self) -> Result<BlockInfo, LibraryError> {
		let state = lock(&self.state);
		if state.locked {
			return Err(LibraryError::Locked);
		}
		Ok(state.best_block)
	}
}

impl WalletLibrary for InMemoryWallet {
	fn add_sync_progress_listener(
		&self,
		listener: Arc<dyn SyncProgressListener>,
		id: &str,
	) -> Result<(), LibraryError> {
		self.check_rejected(NotificationDomain::SyncProgress, id)?;
		self.sync.add(id, listener);
		Ok(())
	}

	fn remove_sync_progress_listener(&self, id: &str) {
		self.sync.remove(id);
	}

	fn add_blocks_rescan_progress_listener(
		&self,
		listener: Arc<dyn BlocksRescanProgressListener>,
		id: &str,
	) -> Result<(), LibraryError> {
		self.check_rejected(NotificationDomain::BlocksRescan, id)?;
		self.rescan.add(id, listener);
		Ok(())
	}

	fn remove_blocks_rescan_progress_listener(&self, id: &str) {
		self.rescan.remove(id);
	}

	fn add_proposal_notification_listener(
		&self,
		listener: Arc<dyn ProposalNotificationListener>,
		id: &str,
	) -> Result<(), LibraryError> {
		self.check_rejected(NotificationDomain::Proposal, id)?;
		self.proposal.add(id, listener);
		Ok(())
	}

	fn remove_proposal_notification_listener(&self, id: &str) {
		self.proposal.remove(id);
	}

	fn add_account_mixer_notification_listener(
		&self,
		listener: Arc<dyn AccountMixerNotificationListener>,
		id: &str,
	) -> Result<(), LibraryError> {
		self.check_rejected(NotificationDomain::AccountMixer, id)?;
		self.mixer.add(id, listener);
		Ok(())
	}

	fn remove_account_mixer_notification_listener(&self, id: &str) {
		self.mixer.remove(id);
	}

	fn add_tx_and_block_notification_listener(
		&self,
		listener: Arc<dyn TxAndBlockNotificationListener>,
		id: &str,
	) -> Result<(), LibraryError> {
		self.check_rejected(NotificationDomain::TxAndBlock, id)?;
		self.tx_block.add(id, listener);
		Ok(())
	}

	fn remove_tx_and_block_notification_listener(&self, id: &str) {
		self.tx_block.remove(id);
	}
}
