use crate::bridge::{
	BridgeError, Notification, NotificationDispatcher, NotificationDomain, NotificationHandler,
	PageListener, TxOrBlockKind,
};
use crate::library::Transaction;
use crate::page::{NavAction, Page, PageContext, UiInput};
use crate::pages::{PROPOSALS_PAGE_ID, ProposalsPage};
use crate::sync::{SyncStatus, SyncStatusAggregator, SyncStatusHandle, SyncStep};
use crate::utils::format_amount;

use chrono::Utc;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

pub const OVERVIEW_PAGE_ID: &str = "Overview";

/// Number of transactions kept for the recent activity list.
pub const RECENT_TRANSACTIONS: usize = 5;

/// Most recent transactions, newest first.
#[derive(Debug, Clone, Default)]
pub struct RecentTransactions {
	items: VecDeque<Transaction>,
}

impl RecentTransactions {
	pub fn items(&self) -> impl Iterator<Item = &Transaction> {
		self.items.iter()
	}

	pub fn len(&self) -> usize {
		self.items.len()
	}

	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	fn push(&mut self, transaction: Transaction) {
		self.items.retain(|t| t.hash != transaction.hash);
		self.items.push_front(transaction);
		self.items.truncate(RECENT_TRANSACTIONS);
	}

	fn confirm(&mut self, hash: &str, block_height: i32) -> bool {
		match self.items.iter_mut().find(|t| t.hash == hash) {
			Some(transaction) => {
				transaction.block_height = block_height;
				true
			}
			None => false,
		}
	}
}

/// Keeps [`RecentTransactions`] current from tx and block notifications.
pub struct RecentTransactionsHandler {
	recent: Arc<Mutex<RecentTransactions>>,
}

#[async_trait::async_trait]
impl NotificationHandler for RecentTransactionsHandler {
	async fn handle(&mut self, notification: &Notification) -> Result<(), BridgeError> {
		let Notification::TxOrBlock(update) = notification else {
			return Ok(());
		};
		let mut recent = self.recent.lock().unwrap_or_else(PoisonError::into_inner);

		match update.kind {
			TxOrBlockKind::NewTx => {
				if let Some(transaction) = &update.transaction {
					recent.push(transaction.clone());
				}
			}
			TxOrBlockKind::TxConfirmed => {
				if let (Some(hash), Some(height)) = (&update.hash, update.block_height) {
					if !recent.confirm(hash, height) {
						debug!("Confirmed transaction {} is not in the recent list", hash);
					}
				}
			}
			TxOrBlockKind::BlockAttached => {}
		}
		Ok(())
	}

	fn name(&self) -> &'static str {
		"RecentTransactionsHandler"
	}
}

/// Landing page: sync progress, best block and recent activity.
pub struct OverviewPage {
	context: PageContext,
	listener: PageListener,
	sync_status: Option<SyncStatusHandle>,
	recent: Arc<Mutex<RecentTransactions>>,
}

impl OverviewPage {
	pub fn new(context: PageContext) -> Self {
		let listener = context.listener(
			OVERVIEW_PAGE_ID,
			&[
				NotificationDomain::SyncProgress,
				NotificationDomain::BlocksRescan,
				NotificationDomain::TxAndBlock,
			],
		);
		Self {
			context,
			listener,
			sync_status: None,
			recent: Arc::new(Mutex::new(RecentTransactions::default())),
		}
	}

	pub fn listener(&self) -> &PageListener {
		&self.listener
	}

	/// Snapshot for drawing; `None` while the page is not resumed.
	pub fn sync_status(&self) -> Option<SyncStatus> {
		self.sync_status.as_ref().map(SyncStatusHandle::snapshot)
	}

	pub fn recent_transactions(&self) -> RecentTransactions {
		self.recent
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.clone()
	}
}

impl Page for OverviewPage {
	fn on_resume(&mut self) {
		if self.listener.is_listening() {
			return;
		}

		let aggregator = SyncStatusAggregator::seeded(self.context.library.clone());
		self.sync_status = Some(aggregator.handle());
		let dispatcher = NotificationDispatcher::new()
			.with_handler(aggregator)
			.with_handler(RecentTransactionsHandler {
				recent: self.recent.clone(),
			});
		self.listener.start(dispatcher);
	}

	fn handle(&mut self, input: &UiInput) -> Option<NavAction> {
		match input {
			UiInput::Activate(target) if target == PROPOSALS_PAGE_ID => {
				Some(NavAction::ChangeFragment {
					page: Box::new(ProposalsPage::new(self.context.clone())),
					id: PROPOSALS_PAGE_ID.to_string(),
				})
			}
			_ => None,
		}
	}

	fn render(&self) -> String {
		let Some(status) = self.sync_status() else {
			return String::new();
		};
		let sync = if status.is_syncing {
			let mut line = format!(
				"{} {}% ({} left)",
				status.step_label().unwrap_or_default(),
				status.stage_progress_percent,
				status.remaining_time_label()
			);
			if status.current_stage == Some(SyncStep::FetchHeaders) {
				let wallet_height = status.best_block_height.saturating_add(status.fetched_headers);
				line.push_str(&format!(
					", headers {:.0}%",
					status.wallet_header_ratio(wallet_height) * 100.0
				));
			}
			line
		} else if status.is_synced {
			"Synced".to_string()
		} else {
			"Not synced".to_string()
		};
		let block_age = status
			.best_block_age_label(Utc::now())
			.unwrap_or_else(|| "unknown".to_string());
		let latest = self
			.recent_transactions()
			.items()
			.next()
			.map(|tx| format!(", latest tx {} DCR", format_amount(tx.amount, 8)))
			.unwrap_or_default();
		format!(
			"{}, {} peer(s), best block {} ({}){}",
			sync, status.connected_peers, status.best_block_height, block_age, latest
		)
	}

	fn on_close(&mut self) {
		let _ = self.listener.stop();
		self.sync_status = None;
		self.recent = Arc::new(Mutex::new(RecentTransactions::default()));
	}
}
