//! Runtime configuration for the engine and the backend client.
//!
//! Every field has a default, so a partial JSON document (or none at all)
//! yields a usable config.

use std::time::Duration;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::GraphResult;

/// Top-level configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
	/// Base URL of the analysis backend, without a trailing slash.
	pub api_base_url: String,
	/// Visual encoding constants.
	pub encoding: EncodingConfig,
	/// Camera choreography constants.
	pub camera: CameraConfig,
	/// Citation build polling intervals.
	pub polling: PollingConfig,
	/// Path playback timing.
	pub playback: PlaybackConfig,
}

impl Default for EngineConfig {
	fn default() -> Self {
		Self {
			api_base_url: "/api".into(),
			encoding: EncodingConfig::default(),
			camera: CameraConfig::default(),
			polling: PollingConfig::default(),
			playback: PlaybackConfig::default(),
		}
	}
}

impl EngineConfig {
	/// Parse a (possibly partial) JSON document.
	pub fn from_json(json: &str) -> GraphResult<Self> {
		let mut config: Self = serde_json::from_str(json)?;
		config.api_base_url = config.api_base_url.trim_end_matches('/').to_string();
		Ok(config)
	}

	/// Config embedded by the host page, falling back to defaults when the
	/// page carries none or the document does not parse.
	pub fn from_embedded(json: Option<&str>) -> Self {
		let Some(json) = json.map(str::trim).filter(|j| !j.is_empty()) else {
			info!("no embedded config, using defaults");
			return Self::default();
		};
		Self::from_json(json).unwrap_or_else(|err| {
			warn!("ignoring embedded config: {err}");
			Self::default()
		})
	}
}

/// Constants of the size and opacity formulas.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodingConfig {
	/// Weight of betweenness centrality in the size signal.
	pub betweenness_weight: f64,
	/// Fixed additive boost for gap bridge entities.
	pub gap_bridge_bonus: f64,
	/// Opacity of a node with no centrality signal at all.
	pub opacity_floor: f64,
	/// Opacity of nodes and links outside a non-empty highlight set.
	pub dimmed_opacity: f64,
}

impl Default for EncodingConfig {
	fn default() -> Self {
		Self {
			betweenness_weight: 0.3,
			gap_bridge_bonus: 0.15,
			opacity_floor: 0.6,
			dimmed_opacity: 0.15,
		}
	}
}

/// Distances and durations used by the camera choreographer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
	/// Eye distance when focusing a single node.
	pub node_distance: f64,
	/// Eye distance when focusing a cluster.
	pub cluster_distance: f64,
	/// Eye distance when focusing a gap; keeps both clusters in frame.
	pub gap_distance: f64,
	/// Eye distance of the home position.
	pub default_distance: f64,
	/// Length of every focus transition.
	pub transition_ms: u32,
	/// Fallback delay before a deferred focus fires without a layout signal.
	pub settle_delay_ms: u32,
}

impl Default for CameraConfig {
	fn default() -> Self {
		Self {
			node_distance: 200.0,
			cluster_distance: 300.0,
			gap_distance: 350.0,
			default_distance: 500.0,
			transition_ms: 1000,
			settle_delay_ms: 800,
		}
	}
}

/// Poll cadence for long-running backend builds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
	/// Delay between polls while the build reports progress.
	pub interval_ms: u64,
	/// First delay after a failed poll; doubles per consecutive failure.
	pub failure_backoff_ms: u64,
	/// Upper bound for the failure delay.
	pub max_backoff_ms: u64,
	/// Consecutive failed polls before the build is reported as failed.
	pub max_consecutive_failures: u32,
}

impl Default for PollingConfig {
	fn default() -> Self {
		Self {
			interval_ms: 1500,
			failure_backoff_ms: 3000,
			max_backoff_ms: 30_000,
			max_consecutive_failures: 5,
		}
	}
}

impl PollingConfig {
	/// Delay after a successful, non-terminal poll.
	pub fn interval(&self) -> Duration {
		Duration::from_millis(self.interval_ms)
	}
}

/// Timing for step-by-step path playback.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
	/// Delay before auto-advancing to the next step.
	pub step_delay_ms: u64,
}

impl Default for PlaybackConfig {
	fn default() -> Self {
		Self {
			step_delay_ms: 2000,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;

	#[test]
	fn empty_document_yields_defaults() {
		assert_eq!(EngineConfig::from_json("{}").unwrap(), EngineConfig::default());
	}

	#[test]
	fn partial_sections_keep_remaining_defaults() {
		let config = EngineConfig::from_json(
			r#"{"api_base_url": "http://localhost:8000/", "camera": {"gap_distance": 420.0}}"#,
		)
		.unwrap();
		assert_eq!(config.api_base_url, "http://localhost:8000");
		assert_eq!(config.camera.gap_distance, 420.0);
		assert_eq!(config.camera.node_distance, 200.0);
		assert_eq!(config.polling, PollingConfig::default());
	}

	#[test]
	fn malformed_json_is_an_error() {
		assert!(EngineConfig::from_json("{").is_err());
	}

	#[test]
	fn embedded_config_overrides_defaults() {
		let config = EngineConfig::from_embedded(Some(
			r#" {"api_base_url": "https://graph.example.org/api/", "polling": {"max_consecutive_failures": 2}} "#,
		));
		assert_eq!(config.api_base_url, "https://graph.example.org/api");
		assert_eq!(config.polling.max_consecutive_failures, 2);
		assert_eq!(config.camera, CameraConfig::default());
	}

	#[test]
	fn missing_or_broken_embedded_config_falls_back_to_defaults() {
		assert_eq!(EngineConfig::from_embedded(None), EngineConfig::default());
		assert_eq!(EngineConfig::from_embedded(Some("  ")), EngineConfig::default());
		assert_eq!(EngineConfig::from_embedded(Some("{ nope")), EngineConfig::default());
	}
}
