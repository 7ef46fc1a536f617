use leptos::prelude::*;
use log::info;
use web_sys::Event;

use super::session::GraphSession;
use crate::engine::SliceMetric;

/// "What if these nodes were gone": preview the top-ranked nodes, then
/// remove them from the view, then bring them back.
#[component]
pub fn SliceControls(session: GraphSession) -> impl IntoView {
	let interaction = session.interaction;
	let config = move || interaction.with(|s| s.slice_config());
	let sliced = move || interaction.with(|s| !s.sliced_node_ids().is_empty());

	let set_count = move |ev: Event| {
		if let Ok(count) = event_target_value(&ev).parse::<usize>() {
			interaction.update(|s| {
				let metric = s.slice_config().metric;
				s.set_slice_parameters(count, metric);
			});
		}
	};

	let set_metric = move |ev: Event| {
		if let Some(metric) = SliceMetric::from_key(&event_target_value(&ev)) {
			interaction.update(|s| {
				let count = s.slice_config().count;
				s.set_slice_parameters(count, metric);
			});
		}
	};

	let preview = move |_| {
		session.with_snapshot(|snap| {
			interaction.update(|s| {
				s.preview_top_bridges(snap);
			});
		});
	};

	let apply = move |_| {
		interaction.update(|s| {
			if s.apply_slicing() {
				info!("sliced {} nodes", s.sliced_node_ids().len());
			}
		});
	};

	let previewed_names = move || {
		let ids: Vec<String> = interaction.with(|s| s.slice_preview().iter().cloned().collect());
		let mut names: Vec<String> = session
			.with_snapshot(|snap| {
				ids.iter()
					.map(|id| snap.entity(id).map_or_else(|| id.clone(), |e| e.name.clone()))
					.collect()
			})
			.unwrap_or_default();
		names.sort();
		names
	};

	view! {
		<section class="panel slice-controls">
			<h2>"Slicing"</h2>
			<label>
				"Remove top "
				<input
					type="number"
					min="1"
					max="50"
					prop:value=move || config().count.to_string()
					disabled=sliced
					on:input=set_count
				/>
			</label>
			<label>
				" by "
				<select on:change=set_metric disabled=sliced>
					{SliceMetric::ALL
						.into_iter()
						.map(|m| {
							view! {
								<option value=m.key() selected=move || config().metric == m>
									{m.key()}
								</option>
							}
						})
						.collect_view()}
				</select>
			</label>
			<div class="slice-actions">
				<button on:click=preview disabled=sliced>"Preview"</button>
				<button
					on:click=apply
					disabled=move || sliced() || interaction.with(|s| !s.is_previewing())
				>
					"Apply"
				</button>
				<button on:click=move |_| interaction.update(|s| s.reset_slicing())>"Reset"</button>
			</div>
			<ul class="slice-preview">
				{move || previewed_names().into_iter().map(|name| view! { <li>{name}</li> }).collect_view()}
			</ul>
		</section>
	}
}
