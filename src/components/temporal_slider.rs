use leptos::prelude::*;
use web_sys::Event;

use super::session::GraphSession;
use crate::engine::{TemporalFilter, YearRange};

const HISTOGRAM_HEIGHT: f64 = 32.0;

/// Publication-year cutoff with a small histogram of entities per year.
/// Hidden when no entity carries a year.
#[component]
pub fn TemporalSlider(session: GraphSession) -> impl IntoView {
	let temporal = session.temporal;
	let range = Memo::new(move |_| session.snapshot.with(|s| s.as_deref().and_then(YearRange::of)));
	let histogram = Memo::new(move |_| {
		session
			.snapshot
			.with(|s| s.as_deref().map(TemporalFilter::histogram).unwrap_or_default())
	});

	let on_input = move |ev: Event| {
		let Some(range) = range.get_untracked() else {
			return;
		};
		if let Ok(year) = event_target_value(&ev).parse::<i32>() {
			let year = range.clamp(year);
			temporal.set(if year >= range.max {
				TemporalFilter::default()
			} else {
				TemporalFilter::until(year)
			});
		}
	};

	let bars = move || {
		let counts = histogram.get();
		let peak = counts.iter().map(|&(_, n)| n).max().unwrap_or(1).max(1) as f64;
		let cutoff = temporal.get().until;
		counts
			.into_iter()
			.map(|(year, n)| {
				let height = format!("{:.1}px", HISTOGRAM_HEIGHT * n as f64 / peak);
				let active = cutoff.is_none_or(|c| year <= c);
				view! {
					<span
						class="bar"
						class:inactive=!active
						style:height=height
						title=format!("{year}: {n}")
					></span>
				}
			})
			.collect_view()
	};

	move || {
		range
			.get()
			.map(|r| {
				view! {
					<section class="panel temporal-slider">
						<h2>"Timeline"</h2>
						<div class="histogram">{bars}</div>
						<input
							type="range"
							min=r.min.to_string()
							max=r.max.to_string()
							prop:value=move || temporal.get().until.unwrap_or(r.max).to_string()
							on:input=on_input
						/>
						<div class="temporal-labels">
							<span>{r.min}</span>
							<span>
								{move || match temporal.get().until {
									Some(year) => format!("up to {year}"),
									None => "all years".to_string(),
								}}
							</span>
							<span>{r.max}</span>
						</div>
						<button
							disabled=move || !temporal.get().is_active()
							on:click=move |_| temporal.set(TemporalFilter::default())
						>
							"Show all"
						</button>
					</section>
				}
			})
	}
}
