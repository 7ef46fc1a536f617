//! Polling state machine for long-running backend builds (citation network).
//!
//! `Idle → Building → {Completed, Failed}`. The machine owns no timer itself;
//! it tells the caller how long to wait before the next poll, and a
//! generation counter lets the caller discard answers that belong to a build
//! that was cancelled or superseded.

use std::time::Duration;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::config::PollingConfig;
use crate::error::GraphError;

/// Backend-reported build state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildState {
	/// Accepted, not started.
	Pending,
	/// Running.
	Building,
	/// Finished successfully.
	Completed,
	/// Stopped with an error.
	Failed,
}

/// Status document returned by the backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BuildStatus {
	/// Backend build state.
	pub state: BuildState,
	/// Items processed so far.
	#[serde(default)]
	pub progress: u64,
	/// Items to process; 0 while unknown.
	#[serde(default)]
	pub total: u64,
	/// Backend phase name, may be empty.
	#[serde(default)]
	pub phase: String,
	/// Failure reason when `state` is failed.
	#[serde(default)]
	pub error: Option<String>,
}

impl BuildStatus {
	/// Completion in `[0, 1]`; 0 while the total is unknown.
	pub fn fraction(&self) -> f64 {
		if self.total == 0 {
			0.0
		} else {
			(self.progress as f64 / self.total as f64).clamp(0.0, 1.0)
		}
	}
}

/// Client-side phase of a build.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum PollerPhase {
	/// No build requested yet.
	#[default]
	Idle,
	/// Running.
	Building,
	/// Finished successfully.
	Completed,
	/// Gave up or the backend reported a failure.
	Failed(GraphError),
}

impl PollerPhase {
	/// No further polls follow.
	pub fn is_terminal(&self) -> bool {
		matches!(self, Self::Completed | Self::Failed(_))
	}
}

/// What the caller should do after feeding a poll result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollDecision {
	/// Schedule the next poll after this delay.
	PollAgain(Duration),
	/// Terminal state reached; stop the loop.
	Done,
	/// Result belonged to an older build; ignore it and keep no timer for it.
	Stale,
}

/// State machine behind the citation build panel.
#[derive(Clone, Debug)]
pub struct BuildPoller {
	config: PollingConfig,
	phase: PollerPhase,
	generation: u64,
	consecutive_failures: u32,
	last_status: Option<BuildStatus>,
}

impl BuildPoller {
	/// Idle poller.
	pub fn new(config: PollingConfig) -> Self {
		Self {
			config,
			phase: PollerPhase::Idle,
			generation: 0,
			consecutive_failures: 0,
			last_status: None,
		}
	}

	/// Current phase.
	pub fn phase(&self) -> &PollerPhase {
		&self.phase
	}

	/// Generation of the current build; results of older ones are stale.
	pub fn generation(&self) -> u64 {
		self.generation
	}

	/// Last status the backend reported.
	pub fn last_status(&self) -> Option<&BuildStatus> {
		self.last_status.as_ref()
	}

	/// Begin (or restart) a build. Any loop of an earlier build goes stale.
	pub fn start(&mut self) -> u64 {
		self.generation += 1;
		self.phase = PollerPhase::Building;
		self.consecutive_failures = 0;
		self.last_status = None;
		debug!("citation build started, generation {}", self.generation);
		self.generation
	}

	/// Stop polling (view unmounted or user cancelled).
	pub fn cancel(&mut self) {
		self.generation += 1;
		if !self.phase.is_terminal() {
			self.phase = PollerPhase::Idle;
		}
	}

	/// Delay after the n-th consecutive failure: doubles, capped.
	fn backoff(&self) -> Duration {
		let exp = self.consecutive_failures.saturating_sub(1).min(16);
		let ms = self
			.config
			.failure_backoff_ms
			.saturating_mul(1u64 << exp)
			.min(self.config.max_backoff_ms);
		Duration::from_millis(ms)
	}

	/// Feed one poll result.
	pub fn on_status(&mut self, generation: u64, result: Result<BuildStatus, GraphError>) -> PollDecision {
		if generation != self.generation || self.phase != PollerPhase::Building {
			return PollDecision::Stale;
		}

		match result {
			Ok(status) => {
				self.consecutive_failures = 0;
				let decision = match status.state {
					BuildState::Completed => {
						self.phase = PollerPhase::Completed;
						PollDecision::Done
					}
					BuildState::Failed => {
						let reason = status.error.clone().unwrap_or_else(|| "no reason given".into());
						warn!("citation build failed: {reason}");
						self.phase = PollerPhase::Failed(GraphError::BuildFailed(reason));
						PollDecision::Done
					}
					BuildState::Pending | BuildState::Building => {
						PollDecision::PollAgain(self.config.interval())
					}
				};
				self.last_status = Some(status);
				decision
			}
			Err(err) if err.is_transient() => {
				self.consecutive_failures += 1;
				if self.consecutive_failures >= self.config.max_consecutive_failures {
					warn!("giving up on citation build after {} failed polls", self.consecutive_failures);
					self.phase = PollerPhase::Failed(err);
					return PollDecision::Done;
				}
				let delay = self.backoff();
				debug!("poll failed ({err}), retrying in {delay:?}");
				PollDecision::PollAgain(delay)
			}
			Err(err) => {
				warn!("citation build status unrecoverable: {err}");
				self.phase = PollerPhase::Failed(err);
				PollDecision::Done
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;

	fn status(state: BuildState) -> BuildStatus {
		BuildStatus {
			state,
			progress: 3,
			total: 10,
			phase: "fetching".into(),
			error: None,
		}
	}

	fn offline() -> GraphError {
		GraphError::Network("offline".into())
	}

	#[test]
	fn building_polls_at_the_short_interval_until_complete() {
		let mut p = BuildPoller::new(PollingConfig::default());
		let generation = p.start();
		assert_eq!(
			p.on_status(generation, Ok(status(BuildState::Building))),
			PollDecision::PollAgain(Duration::from_millis(1500))
		);
		assert_eq!(p.on_status(generation, Ok(status(BuildState::Completed))), PollDecision::Done);
		assert_eq!(p.phase(), &PollerPhase::Completed);
	}

	#[test]
	fn failed_status_is_terminal() {
		let mut p = BuildPoller::new(PollingConfig::default());
		let generation = p.start();
		let mut failed = status(BuildState::Failed);
		failed.error = Some("rate limited".into());
		assert_eq!(p.on_status(generation, Ok(failed)), PollDecision::Done);
		assert_eq!(
			p.phase(),
			&PollerPhase::Failed(GraphError::BuildFailed("rate limited".into()))
		);
	}

	#[test]
	fn transient_errors_back_off_then_give_up() {
		let mut p = BuildPoller::new(PollingConfig::default());
		let generation = p.start();
		let delays: Vec<PollDecision> = (0..4).map(|_| p.on_status(generation, Err(offline()))).collect();
		assert_eq!(
			delays,
			vec![
				PollDecision::PollAgain(Duration::from_millis(3000)),
				PollDecision::PollAgain(Duration::from_millis(6000)),
				PollDecision::PollAgain(Duration::from_millis(12000)),
				PollDecision::PollAgain(Duration::from_millis(24000)),
			]
		);
		assert_eq!(p.on_status(generation, Err(offline())), PollDecision::Done);
		assert!(matches!(p.phase(), PollerPhase::Failed(_)));
	}

	#[test]
	fn success_resets_failure_count() {
		let mut p = BuildPoller::new(PollingConfig::default());
		let generation = p.start();
		p.on_status(generation, Err(offline()));
		p.on_status(generation, Ok(status(BuildState::Building)));
		assert_eq!(
			p.on_status(generation, Err(offline())),
			PollDecision::PollAgain(Duration::from_millis(3000))
		);
	}

	#[test]
	fn unrecoverable_error_fails_immediately() {
		let mut p = BuildPoller::new(PollingConfig::default());
		let generation = p.start();
		let err = GraphError::Http {
			status: 404,
			url: "/status".into(),
		};
		assert_eq!(p.on_status(generation, Err(err)), PollDecision::Done);
		assert!(matches!(p.phase(), PollerPhase::Failed(_)));
	}

	#[test]
	fn results_of_old_builds_are_stale() {
		let mut p = BuildPoller::new(PollingConfig::default());
		let first = p.start();
		let second = p.start();
		assert_eq!(p.on_status(first, Ok(status(BuildState::Completed))), PollDecision::Stale);
		assert_eq!(p.phase(), &PollerPhase::Building);

		p.cancel();
		assert_eq!(p.on_status(second, Ok(status(BuildState::Building))), PollDecision::Stale);
		assert_eq!(p.phase(), &PollerPhase::Idle);
	}

	#[test]
	fn status_fraction_handles_unknown_total() {
		let mut s = status(BuildState::Building);
		assert!((s.fraction() - 0.3).abs() < 1e-12);
		s.total = 0;
		assert_eq!(s.fraction(), 0.0);
	}

	#[test]
	fn status_deserializes_lowercase_states() {
		let s: BuildStatus =
			serde_json::from_str(r#"{"state":"building","progress":1,"total":4,"phase":"citations"}"#).unwrap();
		assert_eq!(s.state, BuildState::Building);
		assert_eq!(s.error, None);
	}
}
