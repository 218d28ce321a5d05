//! Sync status aggregation.
//!
//! `SyncStatusAggregator` folds the sync progress, rescan and block notifications a page receives
//! into one [`SyncStatus`] value. Each notification updates only the fields its stage owns; fields
//! belonging to other stages are left as they were. Stage notifications are applied in the order
//! received, even if that order looks wrong.
//!
//! `Completed` and `Canceled` carry no connectivity information, so the aggregator reads
//! `is_synced`, `is_connected_to_network` and the best block from the library at that point. The
//! library may not have settled its own state yet when the notification is handled.

use crate::bridge::{
    BridgeError, Notification, NotificationHandler, ProgressReport, RescanStage, RescanUpdate,
    SyncStage, SyncStatusUpdate, TxOrBlockKind, TxOrBlockNotification,
};
use crate::library::{BlockInfo, GeneralSyncProgress, LibraryError, SyncStateSource};
use crate::sync::{RescanStatus, SyncStatus, SyncStep, TOTAL_SYNC_STEPS};
use crate::utils::percent;

use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Read side of the aggregate, cloned into the page for redraws
#[derive(Debug, Clone, Default)]
pub struct SyncStatusHandle {
    inner: Arc<Mutex<SyncStatus>>,
}

impl SyncStatusHandle {
    /// Copy of the current aggregate.
    pub fn snapshot(&self) -> SyncStatus {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, SyncStatus> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Folds notifications into a [`SyncStatus`]
pub struct SyncStatusAggregator<S: SyncStateSource + ?Sized> {
    source: Arc<S>,
    status: SyncStatusHandle,
}

impl<S: SyncStateSource + ?Sized> SyncStatusAggregator<S> {
    /// Create an aggregator with an empty status.
    pub fn new(source: Arc<S>) -> Self {
        Self {
            source,
            status: SyncStatusHandle::default(),
        }
    }

    /// Create an aggregator seeded from the library's current state, as a page does on resume.
    pub fn seeded(source: Arc<S>) -> Self {
        let aggregator = Self::new(source);
        let reading = aggregator.read_chain_state();
        apply_chain_state(&mut aggregator.status.lock(), reading);
        aggregator
    }

    pub fn handle(&self) -> SyncStatusHandle {
        self.status.clone()
    }

    pub fn snapshot(&self) -> SyncStatus {
        self.status.snapshot()
    }

    pub fn apply_sync_update(&self, update: &SyncStatusUpdate) {
        // Library accessors run before the status lock is taken so redraws never wait on them.
        let reading = matches!(update.stage, SyncStage::Completed | SyncStage::Canceled)
            .then(|| self.read_chain_state());
        let mut status = self.status.lock();

        match update.stage {
            SyncStage::Started => {
                status.is_syncing = true;
                status.is_synced = false;
                status.completed_steps = 0;
                debug!("Sync started");
            }
            SyncStage::PeersConnected => {
                status.connected_peers = update.connected_peers;
                debug!("Connected peers: {}", update.connected_peers);
            }
            SyncStage::CFiltersFetchProgress
            | SyncStage::HeadersFetchProgress
            | SyncStage::AddressDiscoveryProgress
            | SyncStage::HeadersRescanProgress => match &update.progress_report {
                Some(report) => Self::apply_progress(&mut status, update.stage, report),
                None => warn!("{:?} notification without a progress report", update.stage),
            },
            SyncStage::Completed | SyncStage::Canceled => {
                status.is_syncing = false;
                if update.stage == SyncStage::Completed {
                    status.completed_steps = TOTAL_SYNC_STEPS;
                }
                if let Some(reading) = reading {
                    apply_chain_state(&mut status, reading);
                }
                info!(
                    "Sync {}: synced={}, connected={}, best block {}",
                    if update.stage == SyncStage::Completed {
                        "completed"
                    } else {
                        "canceled"
                    },
                    status.is_synced,
                    status.is_connected,
                    status.best_block_height
                );
            }
        }
    }

    fn apply_progress(status: &mut SyncStatus, stage: SyncStage, report: &ProgressReport) {
        let (step, general) = match (stage, report) {
            (SyncStage::CFiltersFetchProgress, ProgressReport::CFiltersFetch(r)) => {
                (SyncStep::FetchCFilters, &r.general)
            }
            (SyncStage::HeadersFetchProgress, ProgressReport::HeadersFetch(r)) => {
                status.headers_to_fetch = r.total_headers_to_fetch;
                status.fetched_headers = r.fetched_headers_count;
                (SyncStep::FetchHeaders, &r.general)
            }
            (SyncStage::AddressDiscoveryProgress, ProgressReport::AddressDiscovery(r)) => {
                (SyncStep::DiscoverAddresses, &r.general)
            }
            (SyncStage::HeadersRescanProgress, ProgressReport::HeadersRescan(r)) => {
                (SyncStep::RescanHeaders, &r.general)
            }
            (stage, report) => {
                warn!(
                    "Ignoring {:?} notification carrying a mismatched report: {:?}",
                    stage, report
                );
                return;
            }
        };

        Self::apply_general(status, step, general);
    }

    fn apply_general(status: &mut SyncStatus, step: SyncStep, general: &GeneralSyncProgress) {
        status.current_stage = Some(step);
        status.completed_steps = step.ordinal() - 1;
        status.stage_progress_percent = percent(general.total_sync_progress);
        status.remaining_time =
            Duration::from_secs(general.total_time_remaining_seconds.max(0) as u64);
    }

    pub fn apply_rescan_update(&self, update: &RescanUpdate) {
        let mut status = self.status.lock();

        match update.stage {
            RescanStage::Started => {
                status.rescan = Some(RescanStatus {
                    wallet_id: update.wallet_id,
                    progress_percent: 0,
                    current_height: 0,
                    remaining_time: Duration::ZERO,
                });
            }
            RescanStage::Progress => {
                let Some(report) = &update.progress_report else {
                    warn!("Rescan progress without a report for wallet {}", update.wallet_id);
                    return;
                };
                status.rescan = Some(RescanStatus {
                    wallet_id: update.wallet_id,
                    progress_percent: percent(report.rescan_progress),
                    current_height: report.current_rescan_height,
                    remaining_time: Duration::from_secs(report.rescan_time_remaining.max(0) as u64),
                });
            }
            RescanStage::Ended => {
                status.rescan = None;
                info!("Rescan of wallet {} ended", update.wallet_id);
            }
        }
    }

    /// Advance the best block on `BlockAttached`; other kinds do not touch sync state.
    pub fn apply_tx_or_block(&self, notification: &TxOrBlockNotification) {
        if notification.kind != TxOrBlockKind::BlockAttached {
            return;
        }
        let Some(height) = notification.block_height else {
            return;
        };

        let best_block = self.source.best_block();
        let mut status = self.status.lock();
        if height > status.best_block_height {
            status.best_block_height = height;
        }
        match best_block {
            Ok(block) if block.height >= status.best_block_height => {
                status.best_block_height = block.height;
                status.best_block_time = block_time(block.timestamp);
            }
            Ok(_) => {}
            Err(e) => debug!("Keeping previous best block time: {}", e),
        }
    }

    fn read_chain_state(&self) -> ChainReading {
        ChainReading {
            synced: self.source.is_synced(),
            connected: self.source.is_connected_to_network(),
            best_block: self.source.best_block(),
        }
    }
}

/// Library accessor results gathered before the status lock is taken.
struct ChainReading {
    synced: Result<bool, LibraryError>,
    connected: Result<bool, LibraryError>,
    best_block: Result<BlockInfo, LibraryError>,
}

/// Write a reading into `status`, keeping the previous value of any field whose accessor failed.
fn apply_chain_state(status: &mut SyncStatus, reading: ChainReading) {
    match reading.synced {
        Ok(synced) => status.is_synced = synced,
        Err(e) => warn!("Failed to read sync state, keeping previous value: {}", e),
    }
    match reading.connected {
        Ok(connected) => status.is_connected = connected,
        Err(e) => warn!("Failed to read connectivity, keeping previous value: {}", e),
    }
    match reading.best_block {
        Ok(block) => {
            status.best_block_height = block.height;
            status.best_block_time = block_time(block.timestamp);
        }
        Err(e) => warn!("Failed to read best block, keeping previous value: {}", e),
    }
}

fn block_time(timestamp: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(timestamp, 0)
}

#[async_trait::async_trait]
impl<S: SyncStateSource + ?Sized + 'static> NotificationHandler for SyncStatusAggregator<S> {
    async fn handle(&mut self, notification: &Notification) -> Result<(), BridgeError> {
        match notification {
            Notification::SyncStatus(update) => self.apply_sync_update(update),
            Notification::Rescan(update) => self.apply_rescan_update(update),
            Notification::TxOrBlock(update) => self.apply_tx_or_block(update),
            Notification::Proposal(_) | Notification::AccountMixer(_) => {}
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "SyncStatusAggregator"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::{
        AddressDiscoveryProgressReport, BlockInfo, HeadersFetchProgressReport,
        HeadersRescanProgressReport, InMemoryWallet,
    };

    fn headers_fetch(progress: i32, remaining_secs: i64) -> SyncStatusUpdate {
        SyncStatusUpdate::progress(ProgressReport::HeadersFetch(HeadersFetchProgressReport {
            general: GeneralSyncProgress {
                total_sync_progress: progress,
                total_time_remaining_seconds: remaining_secs,
            },
            total_headers_to_fetch: 400,
            fetched_headers_count: 160,
            ..Default::default()
        }))
    }

    fn discovery(progress: i32) -> SyncStatusUpdate {
        SyncStatusUpdate::progress(ProgressReport::AddressDiscovery(
            AddressDiscoveryProgressReport {
                general: GeneralSyncProgress {
                    total_sync_progress: progress,
                    total_time_remaining_seconds: 30,
                },
                wallet_id: 1,
                address_discovery_progress: progress,
            },
        ))
    }

    #[test]
    fn test_headers_fetch_then_completed() {
        let wallet = Arc::new(InMemoryWallet::new());
        let aggregator = SyncStatusAggregator::new(wallet.clone());

        aggregator.apply_sync_update(&SyncStatusUpdate::stage(SyncStage::Started));
        aggregator.apply_sync_update(&headers_fetch(40, 120));
        assert_eq!(aggregator.snapshot().remaining_time_label(), "2m");

        wallet.set_synced(true);
        wallet.set_connected(true);
        aggregator.apply_sync_update(&SyncStatusUpdate::stage(SyncStage::Completed));

        let status = aggregator.snapshot();
        assert!(!status.is_syncing);
        assert_eq!(status.current_stage, Some(SyncStep::FetchHeaders));
        assert_eq!(status.stage_progress_percent, 40);
        assert!(status.is_synced);
        assert!(status.is_connected);
        assert_eq!(status.headers_to_fetch, 400);
        assert_eq!(status.completed_steps, TOTAL_SYNC_STEPS);
    }

    #[test]
    fn test_peers_only_change_on_peer_notifications() {
        let wallet = Arc::new(InMemoryWallet::new());
        let aggregator = SyncStatusAggregator::new(wallet);

        aggregator.apply_sync_update(&SyncStatusUpdate::peers(5));
        let sequence = [
            SyncStatusUpdate::stage(SyncStage::Started),
            headers_fetch(10, 600),
            discovery(60),
            SyncStatusUpdate::stage(SyncStage::Canceled),
            SyncStatusUpdate::stage(SyncStage::Completed),
        ];
        for update in &sequence {
            aggregator.apply_sync_update(update);
            assert_eq!(aggregator.snapshot().connected_peers, 5);
        }

        aggregator.apply_sync_update(&SyncStatusUpdate::peers(2));
        assert_eq!(aggregator.snapshot().connected_peers, 2);
    }

    #[test]
    fn test_progress_percent_clamped() {
        let wallet = Arc::new(InMemoryWallet::new());
        let aggregator = SyncStatusAggregator::new(wallet);

        for progress in [-20, 0, 55, 100, 130, i32::MAX, i32::MIN] {
            aggregator.apply_sync_update(&headers_fetch(progress, -5));
            let status = aggregator.snapshot();
            assert!(status.stage_progress_percent <= 100);
            assert_eq!(status.remaining_time, Duration::ZERO);
        }
    }

    #[test]
    fn test_out_of_order_stages_applied_verbatim() {
        let wallet = Arc::new(InMemoryWallet::new());
        let aggregator = SyncStatusAggregator::new(wallet);

        aggregator.apply_sync_update(&discovery(70));
        aggregator.apply_sync_update(&headers_fetch(30, 90));

        let status = aggregator.snapshot();
        assert_eq!(status.current_stage, Some(SyncStep::FetchHeaders));
        assert_eq!(status.stage_progress_percent, 30);
        assert_eq!(status.completed_steps, 1);
    }

    #[test]
    fn test_mismatched_report_ignored() {
        let wallet = Arc::new(InMemoryWallet::new());
        let aggregator = SyncStatusAggregator::new(wallet);

        let mut update = discovery(70);
        update.stage = SyncStage::HeadersFetchProgress;
        aggregator.apply_sync_update(&update);
        aggregator.apply_sync_update(&SyncStatusUpdate::stage(
            SyncStage::AddressDiscoveryProgress,
        ));

        assert_eq!(aggregator.snapshot().current_stage, None);
    }

    #[test]
    fn test_locked_library_keeps_previous_values() {
        let wallet = Arc::new(InMemoryWallet::new());
        wallet.set_synced(true);
        wallet.set_connected(true);
        wallet.set_best_block(BlockInfo {
            height: 900,
            timestamp: 1_700_000_000,
        });
        let aggregator = SyncStatusAggregator::seeded(wallet.clone());

        aggregator.apply_sync_update(&SyncStatusUpdate::stage(SyncStage::Started));
        wallet.set_locked(true);
        aggregator.apply_sync_update(&SyncStatusUpdate::stage(SyncStage::Canceled));

        let status = aggregator.snapshot();
        assert!(!status.is_syncing);
        // Started cleared is_synced; the failed re-query must not invent a value.
        assert!(!status.is_synced);
        assert!(status.is_connected);
        assert_eq!(status.best_block_height, 900);
        assert!(status.best_block_time.is_some());
    }

    /// Records whether the status lock was free while each accessor ran.
    #[derive(Default)]
    struct LockCheckingSource {
        status: Mutex<Option<SyncStatusHandle>>,
        lock_free: Mutex<Vec<bool>>,
    }

    impl LockCheckingSource {
        fn record(&self) {
            let free = match self.status.lock().unwrap().as_ref() {
                Some(handle) => handle.inner.try_lock().is_ok(),
                None => true,
            };
            self.lock_free.lock().unwrap().push(free);
        }
    }

    impl SyncStateSource for LockCheckingSource {
        fn is_synced(&self) -> Result<bool, LibraryError> {
            self.record();
            Ok(true)
        }

        fn is_connected_to_network(&self) -> Result<bool, LibraryError> {
            self.record();
            Ok(true)
        }

        fn best_block(&self) -> Result<BlockInfo, LibraryError> {
            self.record();
            Ok(BlockInfo {
                height: 77,
                timestamp: 1_700_000_000,
            })
        }
    }

    #[test]
    fn test_library_queried_without_holding_status_lock() {
        let source = Arc::new(LockCheckingSource::default());
        let aggregator = SyncStatusAggregator::new(source.clone());
        *source.status.lock().unwrap() = Some(aggregator.handle());

        aggregator.apply_sync_update(&SyncStatusUpdate::stage(SyncStage::Completed));
        aggregator.apply_tx_or_block(&TxOrBlockNotification {
            kind: TxOrBlockKind::BlockAttached,
            wallet_id: 1,
            transaction: None,
            block_height: Some(78),
            hash: None,
        });

        let checks = source.lock_free.lock().unwrap().clone();
        assert_eq!(checks.len(), 4);
        assert!(checks.iter().all(|free| *free));
        assert_eq!(aggregator.snapshot().best_block_height, 78);
    }

    #[test]
    fn test_rescan_lifecycle() {
        let wallet = Arc::new(InMemoryWallet::new());
        let aggregator = SyncStatusAggregator::new(wallet);

        aggregator.apply_rescan_update(&RescanUpdate {
            stage: RescanStage::Started,
            wallet_id: 3,
            progress_report: None,
        });
        aggregator.apply_rescan_update(&RescanUpdate {
            stage: RescanStage::Progress,
            wallet_id: 3,
            progress_report: Some(HeadersRescanProgressReport {
                wallet_id: 3,
                current_rescan_height: 420,
                rescan_progress: 140,
                rescan_time_remaining: 12,
                ..Default::default()
            }),
        });

        let rescan = aggregator.snapshot().rescan.expect("rescan in progress");
        assert_eq!(rescan.progress_percent, 100);
        assert_eq!(rescan.current_height, 420);

        aggregator.apply_rescan_update(&RescanUpdate {
            stage: RescanStage::Ended,
            wallet_id: 3,
            progress_report: None,
        });
        assert_eq!(aggregator.snapshot().rescan, None);
    }

    #[tokio::test]
    async fn test_block_attached_advances_best_block() {
        let wallet = Arc::new(InMemoryWallet::new());
        let mut aggregator = SyncStatusAggregator::new(wallet.clone());

        wallet.set_best_block(BlockInfo {
            height: 1_001,
            timestamp: 1_700_000_300,
        });
        let attached = |height| {
            Notification::TxOrBlock(TxOrBlockNotification {
                kind: TxOrBlockKind::BlockAttached,
                wallet_id: 1,
                transaction: None,
                block_height: Some(height),
                hash: None,
            })
        };

        NotificationHandler::handle(&mut aggregator, &attached(1_001))
            .await
            .expect("handled");
        assert_eq!(aggregator.snapshot().best_block_height, 1_001);

        // A late notification for an older block never lowers the height.
        NotificationHandler::handle(&mut aggregator, &attached(990))
            .await
            .expect("handled");
        let status = aggregator.snapshot();
        assert_eq!(status.best_block_height, 1_001);
        assert_eq!(
            status.best_block_time.map(|t| t.timestamp()),
            Some(1_700_000_300)
        );
    }
}
