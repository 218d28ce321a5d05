//! Notification bridge
//!
//! This module turns wallet library callbacks, which fire on library-owned threads, into typed
//! notifications consumed by page-local tasks:
//!
//! - `notification`: the closed [`Notification`] union and its per-domain payloads.
//! - `adapter`: the single [`EventAdapter`] implementing every library listener trait.
//! - `channel`: the bounded per-page channel between adapters and the consumer task.
//! - `events`: handler trait and dispatcher run by the consumer task.
//! - `listener`: [`PageListener`], the registration and consumer lifecycle a page embeds.
//! - `redraw`: the cross-thread redraw request read by the UI loop.
//!
//! There are no global channels; every page builds its own channel on resume and injects the
//! sending half into its adapter.

/// Library listener adapter
pub mod adapter;
/// Bounded per-page channel
pub mod channel;
/// Handler trait and dispatcher
pub mod events;
/// Page listener lifecycle
pub mod listener;
/// Notification types
pub mod notification;
/// Redraw requests
pub mod redraw;
mod types;

pub use adapter::EventAdapter;
pub use channel::{NotificationReceiver, NotificationSender, notification_channel};
pub use events::{NotificationDispatcher, NotificationHandler};
pub use listener::{LifecycleState, PageListener};
pub use notification::*;
pub use redraw::RedrawSignal;
pub use types::BridgeError;
