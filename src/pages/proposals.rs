use crate::bridge::{
	BridgeError, Notification, NotificationDispatcher, NotificationDomain, NotificationHandler,
	PageListener, ProposalStatus,
};
use crate::library::Proposal;
use crate::page::{Modal, NavAction, Page, PageContext, UiInput};

use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};

pub const PROPOSALS_PAGE_ID: &str = "Proposals";

/// Proposals known to the page, newest first.
#[derive(Debug, Clone, Default)]
pub struct ProposalList {
	pub proposals: Vec<Proposal>,
	/// Set once the library reports the initial proposal sync finished.
	pub synced: bool,
}

impl ProposalList {
	fn upsert(&mut self, proposal: &Proposal) {
		match self.proposals.iter_mut().find(|p| p.token == proposal.token) {
			Some(existing) => *existing = proposal.clone(),
			None => self.proposals.insert(0, proposal.clone()),
		}
	}

	pub fn find(&self, token: &str) -> Option<&Proposal> {
		self.proposals.iter().find(|p| p.token == token)
	}
}

pub struct ProposalListHandler {
	list: Arc<Mutex<ProposalList>>,
}

#[async_trait::async_trait]
impl NotificationHandler for ProposalListHandler {
	async fn handle(&mut self, notification: &Notification) -> Result<(), BridgeError> {
		let Notification::Proposal(update) = notification else {
			return Ok(());
		};
		let mut list = self.list.lock().unwrap_or_else(PoisonError::into_inner);

		match (update.status, &update.proposal) {
			(ProposalStatus::Synced, _) => {
				list.synced = true;
				info!("Proposals synced, {} known", list.proposals.len());
			}
			(status, Some(proposal)) => {
				debug!("Proposal {} {:?}", proposal.token, status);
				list.upsert(proposal);
			}
			(status, None) => {
				return Err(BridgeError::Payload(format!(
					"{:?} update without a proposal",
					status
				)));
			}
		}
		Ok(())
	}

	fn name(&self) -> &'static str {
		"ProposalListHandler"
	}
}

/// Governance proposals with live updates.
pub struct ProposalsPage {
	listener: PageListener,
	list: Arc<Mutex<ProposalList>>,
}

impl ProposalsPage {
	pub fn new(context: PageContext) -> Self {
		Self {
			listener: context.listener(PROPOSALS_PAGE_ID, &[NotificationDomain::Proposal]),
			list: Arc::new(Mutex::new(ProposalList::default())),
		}
	}

	pub fn listener(&self) -> &PageListener {
		&self.listener
	}

	pub fn proposals(&self) -> ProposalList {
		self.list
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.clone()
	}
}

impl Page for ProposalsPage {
	fn on_resume(&mut self) {
		if self.listener.is_listening() {
			return;
		}
		let dispatcher = NotificationDispatcher::new().with_handler(ProposalListHandler {
			list: self.list.clone(),
		});
		self.listener.start(dispatcher);
	}

	fn handle(&mut self, input: &UiInput) -> Option<NavAction> {
		match input {
			UiInput::Back => Some(NavAction::PopFragment),
			UiInput::Activate(token) => {
				let list = self.proposals();
				let proposal = list.find(token)?;
				Some(NavAction::ShowModal(Box::new(ProposalDetailsModal::new(
					proposal,
				))))
			}
			UiInput::Frame => None,
		}
	}

	fn render(&self) -> String {
		let list = self.proposals();
		format!(
			"{} proposal(s){}",
			list.proposals.len(),
			if list.synced { ", synced" } else { "" }
		)
	}

	fn on_close(&mut self) {
		let _ = self.listener.stop();
		self.list = Arc::new(Mutex::new(ProposalList::default()));
	}
}

/// Read-only details of one proposal.
pub struct ProposalDetailsModal {
	id: String,
	pub title: String,
	pub author: String,
}

impl ProposalDetailsModal {
	pub fn new(proposal: &Proposal) -> Self {
		Self {
			id: format!("proposal-{}", proposal.token),
			title: proposal.name.clone(),
			author: proposal.username.clone(),
		}
	}
}

impl Modal for ProposalDetailsModal {
	fn id(&self) -> &str {
		&self.id
	}

	fn handle(&mut self, input: &UiInput) -> Option<NavAction> {
		match input {
			UiInput::Back => Some(NavAction::DismissModal),
			UiInput::Activate(target) if target == "close" => Some(NavAction::DismissModal),
			_ => None,
		}
	}

	fn on_dismiss(&mut self) {
		debug!("Closed details of {}", self.title);
	}
}
