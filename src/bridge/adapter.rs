//! Event adapter between wallet library callbacks and a page's notification channel.
//!
//! A single [`EventAdapter`] implements every listener trait the library defines. The page decides
//! which domains the adapter gets registered for; the adapter itself only translates each callback
//! into one [`Notification`] and enqueues it. Callbacks run on library threads, so nothing here
//! panics, touches UI state or propagates an error back into the library.

use crate::bridge::{
	AccountMixerUpdate, BridgeError, MixerRunStatus, Notification, NotificationSender,
	ProgressReport, ProposalStatus, ProposalUpdate, RescanStage, RescanUpdate, SyncStage,
	SyncStatusUpdate, TxOrBlockKind, TxOrBlockNotification,
};
use crate::library::{
	AccountMixerNotificationListener, AddressDiscoveryProgressReport,
	BlocksRescanProgressListener, CFiltersFetchProgressReport, HeadersFetchProgressReport,
	HeadersRescanProgressReport, LibraryError, Proposal, ProposalNotificationListener,
	SyncProgressListener, Transaction, TxAndBlockNotificationListener,
};

use tracing::{debug, warn};

/// Translates library callbacks into notifications for one subscriber
#[derive(Debug, Clone)]
pub struct EventAdapter {
	subscriber_id: String,
	sender: NotificationSender,
}

impl EventAdapter {
	pub fn new(subscriber_id: impl Into<String>, sender: NotificationSender) -> Self {
		Self {
			subscriber_id: subscriber_id.into(),
			sender,
		}
	}

	fn emit(&self, notification: Notification) {
		let domain = notification.domain();
		match self.sender.send(notification) {
			Ok(()) => {}
			Err(BridgeError::ChannelClosed) => {
				debug!(
					"[{}] Dropping {} notification, page is closed",
					self.subscriber_id, domain
				);
			}
			Err(e) => {
				warn!(
					"[{}] Dropping {} notification: {}",
					self.subscriber_id, domain, e
				);
			}
		}
	}

	fn emit_sync(&self, update: SyncStatusUpdate) {
		self.emit(Notification::SyncStatus(update));
	}

	fn emit_proposal(&self, status: ProposalStatus, proposal: Option<&Proposal>) {
		self.emit(Notification::Proposal(ProposalUpdate {
			status,
			proposal: proposal.cloned(),
		}));
	}
}

/// Decode the JSON the library passes to `on_transaction`.
pub fn parse_transaction(json: &str) -> Result<Transaction, BridgeError> {
	let transaction: Transaction = serde_json::from_str(json)?;
	if transaction.hash.is_empty() {
		return Err(BridgeError::Payload("transaction without hash".to_string()));
	}
	Ok(transaction)
}

/// Check that a transaction hash is hex encoded.
pub fn validate_hash(hash: &str) -> Result<(), BridgeError> {
	let bytes = hex::decode(hash)
		.map_err(|e| BridgeError::Payload(format!("invalid transaction hash {}: {}", hash, e)))?;
	if bytes.is_empty() {
		return Err(BridgeError::Payload("empty transaction hash".to_string()));
	}
	Ok(())
}

impl SyncProgressListener for EventAdapter {
	fn on_sync_started(&self, _was_restarted: bool) {
		self.emit_sync(SyncStatusUpdate::stage(SyncStage::Started));
	}

	fn on_peer_connected_or_disconnected(&self, num_peers: i32) {
		self.emit_sync(SyncStatusUpdate::peers(num_peers));
	}

	fn on_cfilters_fetch_progress(&self, report: &CFiltersFetchProgressReport) {
		self.emit_sync(SyncStatusUpdate::progress(ProgressReport::CFiltersFetch(
			report.clone(),
		)));
	}

	fn on_headers_fetch_progress(&self, report: &HeadersFetchProgressReport) {
		self.emit_sync(SyncStatusUpdate::progress(ProgressReport::HeadersFetch(
			report.clone(),
		)));
	}

	fn on_address_discovery_progress(&self, report: &AddressDiscoveryProgressReport) {
		self.emit_sync(SyncStatusUpdate::progress(
			ProgressReport::AddressDiscovery(report.clone()),
		));
	}

	fn on_headers_rescan_progress(&self, report: &HeadersRescanProgressReport) {
		self.emit_sync(SyncStatusUpdate::progress(ProgressReport::HeadersRescan(
			report.clone(),
		)));
	}

	fn on_sync_completed(&self) {
		self.emit_sync(SyncStatusUpdate::stage(SyncStage::Completed));
	}

	fn on_sync_canceled(&self, _will_restart: bool) {
		self.emit_sync(SyncStatusUpdate::stage(SyncStage::Canceled));
	}

	fn on_sync_ended_with_error(&self, _err: &LibraryError) {}

	fn debug(&self, _info: &str) {}
}

impl BlocksRescanProgressListener for EventAdapter {
	fn on_blocks_rescan_started(&self, wallet_id: i32) {
		self.emit(Notification::Rescan(RescanUpdate {
			stage: RescanStage::Started,
			wallet_id,
			progress_report: None,
		}));
	}

	fn on_blocks_rescan_progress(&self, report: &HeadersRescanProgressReport) {
		self.emit(Notification::Rescan(RescanUpdate {
			stage: RescanStage::Progress,
			wallet_id: report.wallet_id,
			progress_report: Some(report.clone()),
		}));
	}

	fn on_blocks_rescan_ended(&self, wallet_id: i32, err: Option<&LibraryError>) {
		if let Some(err) = err {
			warn!("Rescan of wallet {} ended with error: {}", wallet_id, err);
		}
		self.emit(Notification::Rescan(RescanUpdate {
			stage: RescanStage::Ended,
			wallet_id,
			progress_report: None,
		}));
	}
}

impl ProposalNotificationListener for EventAdapter {
	fn on_proposals_synced(&self) {
		self.emit_proposal(ProposalStatus::Synced, None);
	}

	fn on_new_proposal(&self, proposal: &Proposal) {
		self.emit_proposal(ProposalStatus::NewProposalFound, Some(proposal));
	}

	fn on_proposal_vote_started(&self, proposal: &Proposal) {
		self.emit_proposal(ProposalStatus::VoteStarted, Some(proposal));
	}

	fn on_proposal_vote_finished(&self, proposal: &Proposal) {
		self.emit_proposal(ProposalStatus::VoteFinished, Some(proposal));
	}
}

impl AccountMixerNotificationListener for EventAdapter {
	fn on_account_mixer_started(&self, wallet_id: i32) {
		self.emit(Notification::AccountMixer(AccountMixerUpdate {
			wallet_id,
			run_status: MixerRunStatus::Started,
		}));
	}

	fn on_account_mixer_ended(&self, wallet_id: i32) {
		self.emit(Notification::AccountMixer(AccountMixerUpdate {
			wallet_id,
			run_status: MixerRunStatus::Ended,
		}));
	}
}

impl TxAndBlockNotificationListener for EventAdapter {
	fn on_transaction(&self, transaction: &str) {
		let transaction = match parse_transaction(transaction) {
			Ok(transaction) => transaction,
			Err(e) => {
				warn!(
					"[{}] Dropping malformed transaction notification: {}",
					self.subscriber_id, e
				);
				return;
			}
		};
		self.emit(Notification::TxOrBlock(TxOrBlockNotification {
			kind: TxOrBlockKind::NewTx,
			wallet_id: transaction.wallet_id,
			transaction: Some(transaction),
			block_height: None,
			hash: None,
		}));
	}

	fn on_block_attached(&self, wallet_id: i32, block_height: i32) {
		self.emit(Notification::TxOrBlock(TxOrBlockNotification {
			kind: TxOrBlockKind::BlockAttached,
			wallet_id,
			transaction: None,
			block_height: Some(block_height),
			hash: None,
		}));
	}

	fn on_transaction_confirmed(&self, wallet_id: i32, hash: &str, block_height: i32) {
		if let Err(e) = validate_hash(hash) {
			warn!(
				"[{}] Dropping confirmation for wallet {}: {}",
				self.subscriber_id, wallet_id, e
			);
			return;
		}
		self.emit(Notification::TxOrBlock(TxOrBlockNotification {
			kind: TxOrBlockKind::TxConfirmed,
			wallet_id,
			transaction: None,
			block_height: Some(block_height),
			hash: Some(hash.to_string()),
		}));
	}
}
