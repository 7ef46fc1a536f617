//! Error type shared by the backend client and the views.

use thiserror::Error;

/// Result alias used across the crate.
pub type GraphResult<T> = Result<T, GraphError>;

/// Failures surfaced while talking to the analysis backend.
///
/// Engine operations (encoding, interaction, camera) never produce these;
/// they degrade to safe defaults instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
	/// Backend answered with a non-success status.
	#[error("HTTP {status} from {url}")]
	Http {
		/// Status code.
		status: u16,
		/// Requested URL.
		url: String,
	},

	/// Request never completed (offline, CORS, aborted).
	#[error("network error: {0}")]
	Network(String),

	/// Response body did not match the expected shape.
	#[error("failed to decode response: {0}")]
	Decode(String),

	/// The snapshot came back empty or could not be loaded at all.
	#[error("graph data unavailable: {0}")]
	DataUnavailable(String),

	/// A long-running backend build reported or reached a terminal failure.
	#[error("build failed: {0}")]
	BuildFailed(String),
}

impl GraphError {
	/// Whether a poll loop should retry after this error.
	pub fn is_transient(&self) -> bool {
		match self {
			Self::Network(_) => true,
			Self::Http { status, .. } => *status >= 500 || *status == 429,
			_ => false,
		}
	}
}

impl From<reqwest::Error> for GraphError {
	fn from(err: reqwest::Error) -> Self {
		if err.is_decode() {
			return Self::Decode(err.to_string());
		}
		match err.status() {
			Some(status) => Self::Http {
				status: status.as_u16(),
				url: err.url().map(|u| u.to_string()).unwrap_or_default(),
			},
			None => Self::Network(err.to_string()),
		}
	}
}

impl From<serde_json::Error> for GraphError {
	fn from(err: serde_json::Error) -> Self {
		Self::Decode(err.to_string())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn server_errors_are_transient() {
		let err = GraphError::Http {
			status: 503,
			url: "/status".into(),
		};
		assert!(err.is_transient());
		assert!(GraphError::Network("offline".into()).is_transient());
	}

	#[test]
	fn client_and_terminal_errors_are_not_transient() {
		let not_found = GraphError::Http {
			status: 404,
			url: "/status".into(),
		};
		assert!(!not_found.is_transient());
		assert!(!GraphError::BuildFailed("boom".into()).is_transient());
		assert!(!GraphError::Decode("bad json".into()).is_transient());
	}

	#[test]
	fn json_errors_become_decode_errors() {
		let err: GraphError = serde_json::from_str::<u32>("nope").unwrap_err().into();
		assert!(matches!(err, GraphError::Decode(_)));
	}
}
