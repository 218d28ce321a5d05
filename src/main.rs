use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tokio::runtime::Handle;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;

use wallet_ui_bridge::BridgeConfig;
use wallet_ui_bridge::bridge::{BridgeError, RedrawSignal};
use wallet_ui_bridge::library::{
	AddressDiscoveryProgressReport, BlockInfo, CFiltersFetchProgressReport, GeneralSyncProgress,
	HeadersFetchProgressReport, HeadersRescanProgressReport, InMemoryWallet, Proposal,
};
use wallet_ui_bridge::page::{Navigator, PageContext, UiInput};
use wallet_ui_bridge::pages::{OVERVIEW_PAGE_ID, OverviewPage, PROPOSALS_PAGE_ID};

/// Frames the demo runs before shutting down.
const DEMO_FRAMES: u32 = 80;

fn load_config() -> Result<BridgeConfig, BridgeError> {
	match std::env::args().nth(1) {
		Some(path) => {
			let json = std::fs::read_to_string(&path)
				.map_err(|e| BridgeError::Config(format!("cannot read {}: {}", path, e)))?;
			BridgeConfig::from_json_str(&json)
		}
		None => Ok(BridgeConfig::default()),
	}
}

fn general(progress: i32, remaining_seconds: i64) -> GeneralSyncProgress {
	GeneralSyncProgress {
		total_sync_progress: progress,
		total_time_remaining_seconds: remaining_seconds,
	}
}

/// Plays the callbacks a wallet library would fire from its own threads.
fn simulate_library(wallet: Arc<InMemoryWallet>) {
	let pause = || thread::sleep(Duration::from_millis(120));

	wallet.set_best_block(BlockInfo {
		height: 812_400,
		timestamp: chrono::Utc::now().timestamp() - 600,
	});
	wallet.emit_peers_changed(3);
	wallet.emit_sync_started(false);
	pause();

	wallet.emit_cfilters_fetch_progress(&CFiltersFetchProgressReport {
		general: general(10, 300),
		total_cfilters_to_fetch: 120,
		current_cfilter_height: 812_300,
		cfilters_fetch_progress: 45,
	});
	pause();
	wallet.emit_headers_fetch_progress(&HeadersFetchProgressReport {
		general: general(40, 180),
		total_headers_to_fetch: 120,
		fetched_headers_count: 60,
		current_header_timestamp: chrono::Utc::now().timestamp() - 300,
		headers_fetch_progress: 50,
	});
	pause();
	wallet.emit_address_discovery_progress(&AddressDiscoveryProgressReport {
		general: general(70, 60),
		wallet_id: 1,
		address_discovery_progress: 80,
	});
	pause();
	wallet.emit_headers_rescan_progress(&HeadersRescanProgressReport {
		general: general(90, 15),
		wallet_id: 1,
		total_headers_to_scan: 120,
		current_rescan_height: 812_500,
		rescan_progress: 90,
		rescan_time_remaining: 15,
	});
	pause();
	wallet.emit_sync_completed();

	wallet.emit_transaction(
		r#"{"walletID":1,"hash":"5f2b8e0c7a1d4e3f9b6a2c8d0e1f3a5b7c9d1e2f4a6b8c0d2e4f6a8b0c2d4e6f","type":"Regular","direction":1,"amount":125000000,"fee":2550,"blockHeight":-1,"timestamp":1700000000}"#,
	);
	pause();
	wallet.emit_block_attached(1, 812_521, chrono::Utc::now().timestamp());
	wallet.emit_transaction_confirmed(
		1,
		"5f2b8e0c7a1d4e3f9b6a2c8d0e1f3a5b7c9d1e2f4a6b8c0d2e4f6a8b0c2d4e6f",
		812_521,
	);

	// Proposals arrive while the proposals page is open.
	thread::sleep(Duration::from_millis(900));
	for (token, name) in [("a1b2c3", "Treasury spend Q3"), ("d4e5f6", "Block reward split")] {
		wallet.emit_new_proposal(&Proposal {
			token: token.to_string(),
			name: name.to_string(),
			username: "stakeholder".to_string(),
			vote_status: 1,
			..Default::default()
		});
		pause();
	}
	wallet.emit_proposals_synced();
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
	let loaded = load_config();
	let directive = loaded
		.as_ref()
		.map(|config| config.log_directive.clone())
		.unwrap_or_else(|_| BridgeConfig::default().log_directive);

	let mut filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());
	match directive.parse::<Directive>() {
		Ok(parsed) => filter = filter.add_directive(parsed),
		Err(e) => eprintln!("Ignoring log directive {}: {}", directive, e),
	}
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_target(false)
		.with_thread_ids(false)
		.with_thread_names(false)
		.with_file(false)
		.with_line_number(false)
		.with_timer(tracing_subscriber::fmt::time::time())
		.init();

	let config = match loaded {
		Ok(config) => config,
		Err(e) => {
			error!("Failed to load configuration: {}", e);
			return;
		}
	};
	info!(
		"Starting wallet UI bridge demo (channel capacity {}, frame every {:?})",
		config.channel_capacity, config.frame_interval
	);

	let wallet = Arc::new(InMemoryWallet::new());
	let redraw = Arc::new(RedrawSignal::new());
	let context = PageContext::new(
		wallet.clone(),
		Handle::current(),
		redraw.clone(),
		config.clone(),
	);
	let mut navigator = Navigator::new(redraw);
	navigator.change_fragment(Box::new(OverviewPage::new(context)), OVERVIEW_PAGE_ID);

	let library = thread::Builder::new()
		.name("wallet-library".to_string())
		.spawn({
			let wallet = wallet.clone();
			move || simulate_library(wallet)
		});
	let library = match library {
		Ok(handle) => Some(handle),
		Err(e) => {
			error!("Failed to start library thread: {}", e);
			None
		}
	};

	let mut interval = tokio::time::interval(config.frame_interval);
	for frame_number in 0..DEMO_FRAMES {
		interval.tick().await;

		let input = match frame_number {
			25 => UiInput::Activate(PROPOSALS_PAGE_ID.to_string()),
			55 => UiInput::Activate("a1b2c3".to_string()),
			60 => UiInput::Activate("close".to_string()),
			65 => UiInput::Back,
			_ => UiInput::Frame,
		};
		navigator.handle_input(&input);

		let frame = navigator.frame();
		if frame.redraw {
			info!(
				"Frame {}: page {:?} modals {:?} | {}",
				frame_number,
				frame.page,
				frame.modals,
				navigator.render_current().unwrap_or_default()
			);
		}
	}

	navigator.shutdown();
	if let Some(handle) = library {
		// Joined off the runtime thread so closing consumers still get polled.
		match tokio::task::spawn_blocking(move || handle.join()).await {
			Ok(Ok(())) => {}
			_ => warn!("Library thread panicked"),
		}
	}
	info!("Demo finished");
}
