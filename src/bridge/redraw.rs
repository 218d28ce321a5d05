use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::Notify;

/// Cross-thread "please redraw" request.
///
/// Consumer tasks call [`request`](Self::request) after updating page state; the UI loop calls
/// [`take`](Self::take) once per frame. Requests made between two frames collapse into one.
#[derive(Debug, Default)]
pub struct RedrawSignal {
    pending: AtomicBool,
    requests: AtomicU64,
    notify: Notify,
}

impl RedrawSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        self.pending.store(true, Ordering::Release);
        self.notify.notify_one();
    }

    /// Whether a redraw was requested since the last call, clearing the request.
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    /// Wait until the next request.
    pub async fn requested(&self) {
        self.notify.notified().await;
    }

    /// Total requests since creation.
    pub fn request_count(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }
}
