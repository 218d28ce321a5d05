//! Per-page listener lifecycle.
//!
//! [`PageListener`] is what a page embeds to receive notifications. On resume it creates a fresh
//! channel and adapter, registers the adapter for the page's domains under the page id, and spawns
//! the consumer task. On close it fires the closing signal once, deregisters exactly the domains
//! it registered, and lets the consumer task wind down.

use crate::bridge::{
	BridgeError, EventAdapter, NotificationDispatcher, NotificationDomain, NotificationReceiver,
	RedrawSignal, notification_channel,
};
use crate::config::BridgeConfig;
use crate::library::WalletLibrary;

use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Lifecycle of a page and of the listener it owns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
	Uninitialized,
	Resumed,
	Closed,
}

pub struct PageListener {
	subscriber_id: String,
	domains: Vec<NotificationDomain>,
	library: Arc<dyn WalletLibrary>,
	runtime: Handle,
	redraw: Arc<RedrawSignal>,
	channel_capacity: usize,

	state: LifecycleState,
	registered: BTreeSet<NotificationDomain>,
	closing: Option<oneshot::Sender<()>>,
	task: Option<JoinHandle<()>>,
	generation: u64,
	closing_fired: u64,
}

impl PageListener {
	pub fn new(
		subscriber_id: impl Into<String>,
		domains: &[NotificationDomain],
		library: Arc<dyn WalletLibrary>,
		runtime: Handle,
		redraw: Arc<RedrawSignal>,
		config: &BridgeConfig,
	) -> Self {
		let mut domains = domains.to_vec();
		domains.sort();
		domains.dedup();

		Self {
			subscriber_id: subscriber_id.into(),
			domains,
			library,
			runtime,
			redraw,
			channel_capacity: config.channel_capacity,
			state: LifecycleState::Uninitialized,
			registered: BTreeSet::new(),
			closing: None,
			task: None,
			generation: 0,
			closing_fired: 0,
		}
	}

	pub fn subscriber_id(&self) -> &str {
		&self.subscriber_id
	}

	pub fn state(&self) -> LifecycleState {
		self.state
	}

	pub fn is_listening(&self) -> bool {
		self.state == LifecycleState::Resumed
	}

	/// Domains the library accepted a registration for.
	pub fn registered_domains(&self) -> Vec<NotificationDomain> {
		self.registered.iter().copied().collect()
	}

	/// Number of consumer tasks started so far.
	pub fn generation(&self) -> u64 {
		self.generation
	}

	/// Number of times the closing signal fired.
	pub fn closing_fired(&self) -> u64 {
		self.closing_fired
	}

	/// Start listening, running `dispatcher` for every notification.
	///
	/// A no-op when already listening, so resuming a visible page never registers twice.
	/// Returns whether a new consumer task was started.
	pub fn start(&mut self, dispatcher: NotificationDispatcher) -> bool {
		if self.state == LifecycleState::Resumed {
			debug!("[{}] Already listening, skipping registration", self.subscriber_id);
			return false;
		}

		let (sender, receiver) = notification_channel(self.channel_capacity);
		let adapter = Arc::new(EventAdapter::new(self.subscriber_id.clone(), sender));

		for domain in self.domains.clone() {
			match self.register(domain, &adapter) {
				Ok(()) => {
					self.registered.insert(domain);
				}
				Err(e) => {
					error!("[{}] {}", self.subscriber_id, e);
				}
			}
		}

		let (closing_tx, closing_rx) = oneshot::channel();
		self.closing = Some(closing_tx);
		self.task = Some(self.runtime.spawn(consume(
			self.subscriber_id.clone(),
			receiver,
			closing_rx,
			dispatcher,
			self.redraw.clone(),
		)));
		self.generation += 1;
		self.state = LifecycleState::Resumed;

		info!(
			"[{}] Listening to {} domain(s), generation {}",
			self.subscriber_id,
			self.registered.len(),
			self.generation
		);
		true
	}

	/// Stop listening.
	///
	/// Fires the closing signal, deregisters every owned registration and returns the consumer
	/// task handle so callers may await its completion. Calling it again is harmless.
	pub fn stop(&mut self) -> Option<JoinHandle<()>> {
		if let Some(closing) = self.closing.take() {
			// The task may already be gone; either way it will not process anything further.
			let _ = closing.send(());
			self.closing_fired += 1;
		}

		for domain in std::mem::take(&mut self.registered) {
			self.deregister(domain);
		}

		if self.state == LifecycleState::Resumed {
			debug!("[{}] Stopped listening", self.subscriber_id);
			self.state = LifecycleState::Closed;
		}
		self.task.take()
	}

	fn register(
		&self,
		domain: NotificationDomain,
		adapter: &Arc<EventAdapter>,
	) -> Result<(), BridgeError> {
		let id = self.subscriber_id.as_str();
		let result = match domain {
			NotificationDomain::SyncProgress => self
				.library
				.add_sync_progress_listener(adapter.clone(), id),
			NotificationDomain::BlocksRescan => self
				.library
				.add_blocks_rescan_progress_listener(adapter.clone(), id),
			NotificationDomain::Proposal => self
				.library
				.add_proposal_notification_listener(adapter.clone(), id),
			NotificationDomain::AccountMixer => self
				.library
				.add_account_mixer_notification_listener(adapter.clone(), id),
			NotificationDomain::TxAndBlock => self
				.library
				.add_tx_and_block_notification_listener(adapter.clone(), id),
		};
		result.map_err(|source| BridgeError::Registration { domain, source })
	}

	fn deregister(&self, domain: NotificationDomain) {
		let id = self.subscriber_id.as_str();
		match domain {
			NotificationDomain::SyncProgress => self.library.remove_sync_progress_listener(id),
			NotificationDomain::BlocksRescan => {
				self.library.remove_blocks_rescan_progress_listener(id)
			}
			NotificationDomain::Proposal => self.library.remove_proposal_notification_listener(id),
			NotificationDomain::AccountMixer => {
				self.library.remove_account_mixer_notification_listener(id)
			}
			NotificationDomain::TxAndBlock => {
				self.library.remove_tx_and_block_notification_listener(id)
			}
		}
	}
}

impl Drop for PageListener {
	fn drop(&mut self) {
		if self.state == LifecycleState::Resumed {
			let _ = self.stop();
		}
	}
}

/// Consumer task body. Closing always wins over a pending notification.
async fn consume(
	subscriber_id: String,
	mut receiver: NotificationReceiver,
	mut closing: oneshot::Receiver<()>,
	mut dispatcher: NotificationDispatcher,
	redraw: Arc<RedrawSignal>,
) {
	loop {
		tokio::select! {
			biased;
			_ = &mut closing => {
				debug!(
					"[{}] Consumer closing, {} queued notification(s) dropped",
					subscriber_id,
					receiver.len()
				);
				break;
			}
			received = receiver.recv() => match received {
				Some(notification) => {
					dispatcher.dispatch(&notification).await;
					redraw.request();
				}
				None => {
					debug!("[{}] All adapters released, consumer exiting", subscriber_id);
					break;
				}
			}
		}
	}
}
