//! Page lifecycle contract and navigation
//!
//! Every view implements [`Page`]: `on_resume` when it becomes visible, `handle` once per input
//! pass while visible, `on_close` when it is replaced. Listener registration belongs in
//! `on_resume` and deregistration in `on_close`, normally through an embedded
//! [`PageListener`](crate::bridge::PageListener). The [`Navigator`] is the only caller of these
//! hooks and guarantees a page is never resumed while another page occupies the slot.

/// Current page, return page and modal stack
pub mod navigator;

pub use crate::bridge::LifecycleState;
pub use navigator::{Frame, Navigator};

use crate::bridge::{NotificationDomain, PageListener, RedrawSignal};
use crate::config::BridgeConfig;
use crate::library::WalletLibrary;

use std::fmt;
use std::sync::Arc;
use tokio::runtime::Handle;

/// Input delivered to the top modal or the current page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiInput {
	/// A frame with no user event.
	Frame,
	/// Back button or escape.
	Back,
	/// A clickable identified by name was activated.
	Activate(String),
}

/// Navigation requested by a page or modal from `handle`
pub enum NavAction {
	ChangeFragment { page: Box<dyn Page>, id: String },
	PopFragment,
	SetReturnPage(String),
	ShowModal(Box<dyn Modal>),
	DismissModal,
}

impl fmt::Debug for NavAction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			NavAction::ChangeFragment { id, .. } => write!(f, "ChangeFragment({})", id),
			NavAction::PopFragment => f.write_str("PopFragment"),
			NavAction::SetReturnPage(id) => write!(f, "SetReturnPage({})", id),
			NavAction::ShowModal(modal) => write!(f, "ShowModal({})", modal.id()),
			NavAction::DismissModal => f.write_str("DismissModal"),
		}
	}
}

/// A navigable view.
///
/// Pages live on the UI thread. State written by a page's consumer task must be shared through
/// the page's own handles (e.g. [`SyncStatusHandle`](crate::sync::SyncStatusHandle)) and only
/// read here.
pub trait Page {
	/// Called each time the page becomes visible. Must tolerate being called while already
	/// resumed.
	fn on_resume(&mut self);

	/// Process one input pass.
	fn handle(&mut self, input: &UiInput) -> Option<NavAction>;

	/// Called when the page is replaced. The page may be resumed again later.
	fn on_close(&mut self);

	/// One-line text rendition of the page's live state.
	fn render(&self) -> String {
		String::new()
	}
}

/// An overlay drawn above the current page that sees input first
pub trait Modal {
	fn id(&self) -> &str;

	fn handle(&mut self, input: &UiInput) -> Option<NavAction>;

	/// Runs before control returns to whatever is beneath the modal.
	fn on_dismiss(&mut self);
}

/// Dependencies injected into every page
#[derive(Clone)]
pub struct PageContext {
	pub library: Arc<dyn WalletLibrary>,
	pub runtime: Handle,
	pub redraw: Arc<RedrawSignal>,
	pub config: BridgeConfig,
}

impl PageContext {
	pub fn new(
		library: Arc<dyn WalletLibrary>,
		runtime: Handle,
		redraw: Arc<RedrawSignal>,
		config: BridgeConfig,
	) -> Self {
		Self {
			library,
			runtime,
			redraw,
			config,
		}
	}

	/// Listener for a page subscribing to `domains` under `page_id`.
	pub fn listener(&self, page_id: &str, domains: &[NotificationDomain]) -> PageListener {
		PageListener::new(
			page_id,
			domains,
			self.library.clone(),
			self.runtime.clone(),
			self.redraw.clone(),
			&self.config,
		)
	}
}
