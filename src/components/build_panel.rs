use std::time::Duration;

use leptos::prelude::*;
use leptos::task::spawn_local;
use log::{debug, info, warn};

use super::session::GraphSession;
use crate::config::PollingConfig;
use crate::engine::{BuildPoller, BuildStatus, PollDecision, PollerPhase};
use crate::error::GraphResult;

/// The one timer a build loop may own at a time.
#[derive(Clone, Copy)]
struct PollLoop {
	session: GraphSession,
	poller: RwSignal<BuildPoller>,
	timer: StoredValue<Option<TimeoutHandle>>,
	on_complete: Callback<()>,
}

impl PollLoop {
	fn clear_timer(&self) {
		if let Some(handle) = self.timer.try_update_value(Option::take).flatten() {
			handle.clear();
		}
	}

	fn schedule(self, generation: u64, delay: Duration) {
		self.clear_timer();
		match set_timeout_with_handle(move || self.poll(generation), delay) {
			Ok(handle) => {
				if self.timer.try_update_value(|t| *t = Some(handle)).is_none() {
					handle.clear();
				}
			}
			Err(err) => warn!("could not schedule build poll: {err:?}"),
		}
	}

	fn handle(self, generation: u64, result: GraphResult<BuildStatus>) {
		// the panel may be gone by the time a request returns
		let Some(decision) = self.poller.try_update(|p| p.on_status(generation, result)) else {
			return;
		};
		match decision {
			PollDecision::PollAgain(delay) => self.schedule(generation, delay),
			PollDecision::Done => {
				if self.poller.with_untracked(|p| p.phase() == &PollerPhase::Completed) {
					info!("citation network build completed");
					self.on_complete.run(());
				}
			}
			PollDecision::Stale => debug!("dropping stale build status"),
		}
	}

	fn poll(self, generation: u64) {
		let (client, project) = (self.session.client(), self.session.project_id.get_untracked());
		spawn_local(async move {
			let result = client.citation_build_status(&project).await;
			self.handle(generation, result);
		});
	}

	fn start(self) {
		self.clear_timer();
		let generation = self.poller.try_update(BuildPoller::start).unwrap_or_default();
		let (client, project) = (self.session.client(), self.session.project_id.get_untracked());
		spawn_local(async move {
			let result = client.start_citation_build(&project).await;
			if let Ok(status) = &result {
				debug!("build for {project} accepted in state {:?}", status.state);
			}
			self.handle(generation, result);
		});
	}

	fn cancel(self) {
		self.clear_timer();
		self.poller.try_update(BuildPoller::cancel);
	}
}

/// Starts the backend citation-network build and follows its progress.
/// Polling stops when the panel unmounts or a new build starts.
#[component]
pub fn BuildPanel(
	session: GraphSession,
	polling: PollingConfig,
	/// Called once a build completes, typically to reload the snapshot.
	#[prop(into)]
	on_complete: Callback<()>,
) -> impl IntoView {
	let poll_loop = PollLoop {
		session,
		poller: RwSignal::new(BuildPoller::new(polling)),
		timer: StoredValue::new(None),
		on_complete,
	};
	let poller = poll_loop.poller;
	on_cleanup(move || poll_loop.cancel());

	let building = move || poller.with(|p| p.phase() == &PollerPhase::Building);
	let progress = move || {
		poller.with(|p| {
			p.last_status().map(|s| {
				let phase = if s.phase.is_empty() { "working" } else { s.phase.as_str() };
				format!("{phase}: {}/{} ({:.0}%)", s.progress, s.total, s.fraction() * 100.0)
			})
		})
	};
	let fraction = move || poller.with(|p| p.last_status().map_or(0.0, |s| s.fraction()));

	view! {
		<section class="panel build-panel">
			<h2>"Citation network"</h2>
			<div class="build-actions">
				<button disabled=building on:click=move |_| poll_loop.start()>"Build"</button>
				<button disabled=move || !building() on:click=move |_| poll_loop.cancel()>"Cancel"</button>
			</div>
			<progress max="1" value=move || fraction().to_string()></progress>
			<p class="build-status">
				{move || match poller.with(|p| p.phase().clone()) {
					PollerPhase::Idle => "Not started".to_string(),
					PollerPhase::Building => progress().unwrap_or_else(|| "Starting…".to_string()),
					PollerPhase::Completed => "Completed".to_string(),
					PollerPhase::Failed(err) => err.to_string(),
				}}
			</p>
		</section>
	}
}
