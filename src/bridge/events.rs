//! Notification handling for page consumer tasks.
//!
//! A page's consumer task hands every notification it receives to a [`NotificationDispatcher`],
//! which fans it out to the handlers the page registered (the sync status aggregator, a
//! transaction list reloader, ...). Handlers run on the consumer task, never on the UI thread, and
//! write the page's live state that the UI thread reads on the next redraw.

use crate::bridge::{BridgeError, Notification};

/// Trait for handling notifications delivered to a page.
#[async_trait::async_trait]
pub trait NotificationHandler: Send {
    /// Handle one notification.
    ///
    /// Called in delivery order for every notification the page's channel yields.
    async fn handle(&mut self, notification: &Notification) -> Result<(), BridgeError>;

    /// Get the name of this handler for logging and diagnostics.
    fn name(&self) -> &'static str;
}

/// Dispatcher that runs every registered handler for each notification.
///
/// Handlers are called in registration order. Errors from one handler are logged and do not
/// prevent the others from running.
#[derive(Default)]
pub struct NotificationDispatcher {
    handlers: Vec<Box<dyn NotificationHandler>>,
}

impl NotificationDispatcher {
    /// Create a new, empty dispatcher.
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// Register a new handler.
    pub fn register_handler(&mut self, handler: Box<dyn NotificationHandler>) {
        self.handlers.push(handler);
    }

    /// Builder form of [`register_handler`](Self::register_handler).
    pub fn with_handler(mut self, handler: impl NotificationHandler + 'static) -> Self {
        self.register_handler(Box::new(handler));
        self
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Dispatch a notification to all registered handlers.
    pub async fn dispatch(&mut self, notification: &Notification) {
        for handler in &mut self.handlers {
            if let Err(e) = handler.handle(notification).await {
                tracing::error!(
                    "Handler {} failed to process {} notification: {}",
                    handler.name(),
                    notification.domain(),
                    e
                );
            }
        }
    }
}
