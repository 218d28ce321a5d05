//! Notification bridge and page navigation runtime for a desktop wallet UI.
//!
//! The wallet library reports sync progress, rescans, proposals, mixer runs and transactions
//! through callbacks on its own threads. [`bridge`] turns those callbacks into typed
//! notifications delivered to page-local consumer tasks, [`sync`] folds sync notifications into
//! a status value, and [`page`] drives page lifecycle and navigation on the UI thread.

pub mod bridge;
pub mod config;
pub mod library;
pub mod page;
pub mod pages;
pub mod sync;
pub mod utils;

pub use config::BridgeConfig;
