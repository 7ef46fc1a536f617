use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::components::A;
use leptos_router::hooks::use_params_map;
use log::warn;

use crate::api::ApiClient;
use crate::config::EngineConfig;
use crate::engine::ComparisonData;

#[derive(Clone, Debug, PartialEq)]
enum CompareState {
	Loading,
	Ready(ComparisonData),
	Failed(String),
}

/// Entity overlap of two projects. The snapshots behind a local comparison
/// are dropped as soon as the numbers are computed.
#[component]
pub fn Compare() -> impl IntoView {
	let config = use_context::<EngineConfig>().unwrap_or_default();
	let params = use_params_map();
	let ids = Memo::new(move |_| {
		params.with(|p| (p.get("a").unwrap_or_default(), p.get("b").unwrap_or_default()))
	});
	let state = RwSignal::new(CompareState::Loading);
	let generation = StoredValue::new(0u64);
	let api_base = config.api_base_url;

	Effect::new(move |_| {
		let (a, b) = ids.get();
		let current = generation.try_update_value(|g| {
			*g += 1;
			*g
		});
		state.set(CompareState::Loading);
		let client = ApiClient::new(&api_base);
		spawn_local(async move {
			let result = client.compare_projects(&a, &b).await;
			if generation.try_get_value() != current {
				return;
			}
			state.try_set(match result {
				Ok(data) => CompareState::Ready(data),
				Err(err) => {
					warn!("comparing {a} and {b} failed: {err}");
					CompareState::Failed(err.to_string())
				}
			});
		});
	});

	let percent = |x: f64| format!("{:.1}%", x * 100.0);

	view! {
		<div class="compare">
			<A href="/">"← Projects"</A>
			<h1>{move || { let (a, b) = ids.get(); format!("{a} vs {b}") }}</h1>
			{move || match state.get() {
				CompareState::Loading => view! { <p class="muted">"Comparing…"</p> }.into_any(),
				CompareState::Failed(message) => view! { <p class="error">{message}</p> }.into_any(),
				CompareState::Ready(data) => {
					view! {
						<dl class="comparison">
							<dt>"Shared entities"</dt>
							<dd>{data.common_entities}</dd>
							<dt>"Only in first"</dt>
							<dd>{data.unique_to_a}</dd>
							<dt>"Only in second"</dt>
							<dd>{data.unique_to_b}</dd>
							<dt>"Jaccard similarity"</dt>
							<dd>{percent(data.jaccard_similarity)}</dd>
							<dt>"Overlap coefficient"</dt>
							<dd>{percent(data.overlap_coefficient)}</dd>
						</dl>
					}
						.into_any()
				}
			}}
		</div>
	}
}
