//! Runtime configuration for the bridge and the demo UI loop.

use crate::bridge::BridgeError;

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration shared by every page listener
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
	/// Buffered notifications per page before library threads start to wait.
	pub channel_capacity: usize,
	/// Interval between UI frames in the demo loop.
	#[serde(with = "millis")]
	pub frame_interval: Duration,
	/// Default `tracing` directive when `RUST_LOG` is not set.
	pub log_directive: String,
}

impl Default for BridgeConfig {
	fn default() -> Self {
		Self {
			channel_capacity: 10,
			frame_interval: Duration::from_millis(50),
			log_directive: "wallet_ui_bridge=debug".to_string(),
		}
	}
}

impl BridgeConfig {
	pub fn with_channel_capacity(mut self, channel_capacity: usize) -> Self {
		self.channel_capacity = channel_capacity;
		self
	}

	/// Parse a settings document; missing keys fall back to defaults.
	pub fn from_json_str(json: &str) -> Result<Self, BridgeError> {
		let config: BridgeConfig = serde_json::from_str(json)?;
		config.validate()?;
		Ok(config)
	}

	pub fn validate(&self) -> Result<(), BridgeError> {
		if self.channel_capacity == 0 {
			return Err(BridgeError::Config(
				"channel_capacity must be at least 1".to_string(),
			));
		}
		if self.frame_interval.is_zero() {
			return Err(BridgeError::Config(
				"frame_interval must be greater than zero".to_string(),
			));
		}
		Ok(())
	}
}

mod millis {
	use serde::{Deserialize, Deserializer, Serializer};
	use std::time::Duration;

	pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_u64(value.as_millis() as u64)
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
		Ok(Duration::from_millis(u64::deserialize(deserializer)?))
	}
}
