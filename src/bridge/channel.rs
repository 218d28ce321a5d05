//! Per-page notification channel.
//!
//! Each page owns one bounded channel. The sending half is handed to the [`EventAdapter`] that the
//! library calls from its own threads; the receiving half is drained by the page's consumer task.
//! When the consumer goes away the receiver is dropped, which wakes every sender blocked on a full
//! channel, so a library thread never waits on a page that no longer exists.
//!
//! A sender running inside an async runtime must not block its executor. When the channel is full
//! such a send goes to an overflow queue shared with the receiver instead. Once the overflow holds
//! anything, every later send queues behind it, and the receiver drains the channel before the
//! overflow, so delivery order matches send order and nothing is dropped.
//!
//! [`EventAdapter`]: crate::bridge::EventAdapter

use crate::bridge::{BridgeError, Notification};

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::debug;

/// Notifications that did not fit while the sender was inside a runtime.
#[derive(Debug, Default)]
struct Overflow {
    queue: Mutex<VecDeque<Notification>>,
    notify: Notify,
}

impl Overflow {
    fn lock(&self) -> MutexGuard<'_, VecDeque<Notification>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Create a channel buffering at most `capacity` notifications (at least one) before senders
/// wait or spill.
pub fn notification_channel(capacity: usize) -> (NotificationSender, NotificationReceiver) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    let overflow = Arc::new(Overflow::default());
    (
        NotificationSender {
            inner: sender,
            overflow: overflow.clone(),
        },
        NotificationReceiver {
            inner: receiver,
            overflow,
        },
    )
}

/// Producer side, cloned into adapters.
#[derive(Debug, Clone)]
pub struct NotificationSender {
    inner: mpsc::Sender<Notification>,
    overflow: Arc<Overflow>,
}

impl NotificationSender {
    /// Enqueue one notification.
    ///
    /// Tries a non-blocking send first. On a full channel, a caller outside any async runtime (a
    /// library thread) waits until the consumer frees a slot or is dropped. A caller inside a
    /// runtime spills into the overflow queue instead. Only a closed channel loses the
    /// notification.
    pub fn send(&self, notification: Notification) -> Result<(), BridgeError> {
        if self.inner.is_closed() {
            return Err(BridgeError::ChannelClosed);
        }

        let mut overflow = self.overflow.lock();
        if !overflow.is_empty() {
            overflow.push_back(notification);
            drop(overflow);
            self.overflow.notify.notify_one();
            return Ok(());
        }

        let notification = match self.inner.try_send(notification) {
            Ok(()) => return Ok(()),
            Err(TrySendError::Closed(_)) => return Err(BridgeError::ChannelClosed),
            Err(TrySendError::Full(notification)) => notification,
        };

        if tokio::runtime::Handle::try_current().is_ok() {
            debug!(
                "Channel full inside a runtime, queueing {} notification",
                notification.domain()
            );
            overflow.push_back(notification);
            drop(overflow);
            self.overflow.notify.notify_one();
            return Ok(());
        }

        drop(overflow);
        debug!(
            "Channel full, waiting for consumer ({})",
            notification.domain()
        );
        self.inner
            .blocking_send(notification)
            .map_err(|_| BridgeError::ChannelClosed)
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }
}

/// Consumer side, owned by exactly one task.
#[derive(Debug)]
pub struct NotificationReceiver {
    inner: mpsc::Receiver<Notification>,
    overflow: Arc<Overflow>,
}

impl NotificationReceiver {
    /// Next notification, or `None` once every sender is gone and nothing is left queued.
    pub async fn recv(&mut self) -> Option<Notification> {
        loop {
            if let Ok(notification) = self.inner.try_recv() {
                return Some(notification);
            }
            if let Some(notification) = self.overflow.lock().pop_front() {
                return Some(notification);
            }

            tokio::select! {
                received = self.inner.recv() => match received {
                    Some(notification) => return Some(notification),
                    None => return self.overflow.lock().pop_front(),
                },
                _ = self.overflow.notify.notified() => {}
            }
        }
    }

    /// Number of notifications waiting to be consumed.
    pub fn len(&self) -> usize {
        self.inner.len() + self.overflow.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{ProposalStatus, ProposalUpdate, SyncStage, SyncStatusUpdate};
    use crate::library::Proposal;

    fn started() -> Notification {
        Notification::SyncStatus(SyncStatusUpdate::stage(SyncStage::Started))
    }

    fn new_proposal(id: i32) -> Notification {
        Notification::Proposal(ProposalUpdate {
            status: ProposalStatus::NewProposalFound,
            proposal: Some(Proposal {
                id,
                ..Default::default()
            }),
        })
    }

    #[tokio::test]
    async fn test_full_channel_queues_inside_runtime() {
        let (sender, mut receiver) = notification_channel(1);
        for id in 1..=3 {
            sender.send(new_proposal(id)).expect("never dropped");
        }
        assert_eq!(receiver.len(), 3);

        // Space in the channel does not let a later send overtake the overflow.
        assert_eq!(receiver.recv().await, Some(new_proposal(1)));
        sender.send(new_proposal(4)).expect("never dropped");
        for id in 2..=4 {
            assert_eq!(receiver.recv().await, Some(new_proposal(id)));
        }
        assert!(receiver.is_empty());
    }

    #[tokio::test]
    async fn test_dropped_receiver_closes_channel() {
        let (sender, receiver) = notification_channel(4);
        drop(receiver);
        assert!(sender.is_closed());
        assert!(matches!(
            sender.send(started()),
            Err(BridgeError::ChannelClosed)
        ));
    }

    #[tokio::test]
    async fn test_overflow_drained_after_senders_drop() {
        let (sender, mut receiver) = notification_channel(1);
        sender.send(new_proposal(1)).expect("fits");
        sender.send(new_proposal(2)).expect("queued");
        drop(sender);

        assert_eq!(receiver.recv().await, Some(new_proposal(1)));
        assert_eq!(receiver.recv().await, Some(new_proposal(2)));
        assert_eq!(receiver.recv().await, None);
    }

    #[tokio::test]
    async fn test_library_thread_waits_for_free_slot() {
        let (sender, mut receiver) = notification_channel(1);
        let (done_tx, done_rx) = tokio::sync::oneshot::channel();

        std::thread::spawn(move || {
            let results: Vec<bool> = (0..3).map(|_| sender.send(started()).is_ok()).collect();
            let _ = done_tx.send(results);
        });

        for _ in 0..3 {
            assert_eq!(receiver.recv().await, Some(started()));
        }
        let results = done_rx.await.expect("producer thread finished");
        assert_eq!(results, vec![true, true, true]);
    }

    #[tokio::test]
    async fn test_sender_on_another_runtime_wakes_waiting_receiver() {
        let (sender, mut receiver) = notification_channel(1);

        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .build()
                .expect("library runtime");
            runtime.block_on(async {
                for id in 1..=3 {
                    sender.send(new_proposal(id)).expect("never dropped");
                }
            });
        });

        for id in 1..=3 {
            assert_eq!(receiver.recv().await, Some(new_proposal(id)));
        }
        assert_eq!(receiver.recv().await, None);
    }
}
