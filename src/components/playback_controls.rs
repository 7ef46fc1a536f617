use leptos::prelude::*;
use log::warn;

use super::session::GraphSession;
use crate::engine::playback::AdvanceToken;
use crate::engine::{InteractionState, PathPlayback};

/// Owns the single pending auto-advance timer of a playback.
#[derive(Clone, Copy)]
struct StepTimer {
	playback: RwSignal<Option<PathPlayback>>,
	interaction: RwSignal<InteractionState>,
	timer: StoredValue<Option<TimeoutHandle>>,
}

impl StepTimer {
	fn clear(&self) {
		if let Some(handle) = self.timer.try_update_value(Option::take).flatten() {
			handle.clear();
		}
	}

	fn schedule(self, token: Option<AdvanceToken>) {
		self.clear();
		let Some(token) = token else {
			return;
		};
		let Some(delay) = self.playback.with_untracked(|p| p.as_ref().map(PathPlayback::step_delay)) else {
			return;
		};
		match set_timeout_with_handle(move || self.advance(token), delay) {
			Ok(handle) => {
				if self.timer.try_update_value(|t| *t = Some(handle)).is_none() {
					handle.clear();
				}
			}
			Err(err) => warn!("could not schedule playback step: {err:?}"),
		}
	}

	/// Runs `f` with the playback and the interaction state borrowed together.
	fn with_both<R>(&self, f: impl FnOnce(&mut PathPlayback, &mut InteractionState) -> R) -> Option<R> {
		let interaction = self.interaction;
		self.playback
			.try_update(|p| {
				let p = p.as_mut()?;
				interaction.try_update(|s| f(p, s))
			})
			.flatten()
	}

	fn advance(self, token: AdvanceToken) {
		let next = self.with_both(|p, s| p.on_timer(token, s)).flatten();
		self.schedule(next);
	}

	fn play(self) {
		let first = self.with_both(PathPlayback::play).flatten();
		self.schedule(first);
	}

	fn jump(self, index: usize) {
		self.clear();
		self.with_both(|p, s| p.jump_to(index, s));
	}

	fn stop(self) {
		self.clear();
		self.with_both(PathPlayback::stop);
	}
}

/// Step-by-step walk along a node path. Clicking a step stops the
/// automatic advance.
#[component]
pub fn PlaybackControls(session: GraphSession, playback: RwSignal<Option<PathPlayback>>) -> impl IntoView {
	let step_timer = StepTimer {
		playback,
		interaction: session.interaction,
		timer: StoredValue::new(None),
	};
	on_cleanup(move || step_timer.clear());

	// a replaced path must not be advanced by the old timer
	let path = Memo::new(move |_| playback.with(|p| p.as_ref().map(|p| p.steps().to_vec())));
	Effect::new(move |prev: Option<()>| {
		path.track();
		if prev.is_some() {
			step_timer.clear();
		}
	});

	let playing = move || playback.with(|p| p.as_ref().is_some_and(PathPlayback::is_playing));
	let steps = move || {
		playback.with(|p| {
			p.as_ref()
				.map(|p| {
					p.steps()
						.iter()
						.map(|step| {
							let last = step.node_ids.last().cloned().unwrap_or_default();
							session
								.with_snapshot(|snap| snap.entity(&last).map(|e| e.name.clone()))
								.flatten()
								.unwrap_or(last)
						})
						.collect::<Vec<_>>()
				})
				.unwrap_or_default()
		})
	};
	let current = move || playback.with(|p| p.as_ref().and_then(PathPlayback::current));

	move || {
		playback.with(|p| p.is_some()).then(|| {
			view! {
				<section class="panel playback-controls">
					<h2>"Path"</h2>
					<div class="playback-actions">
						<button disabled=playing on:click=move |_| step_timer.play()>"Play"</button>
						<button on:click=move |_| step_timer.stop()>"Stop"</button>
						<button on:click=move |_| {
							step_timer.stop();
							playback.set(None);
						}>"Close"</button>
					</div>
					<ol class="playback-steps">
						{move || {
							steps()
								.into_iter()
								.enumerate()
								.map(|(i, name)| {
									view! {
										<li
											class:current=move || current() == Some(i)
											on:click=move |_| step_timer.jump(i)
										>
											{name}
										</li>
									}
								})
								.collect_view()
						}}
					</ol>
				</section>
			}
		})
	}
}
