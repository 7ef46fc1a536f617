use std::collections::HashSet;
use std::sync::Arc;

use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::components::A;
use leptos_router::hooks::use_params_map;
use log::{debug, info, warn};

use crate::api::ApiClient;
use crate::components::build_panel::BuildPanel;
use crate::components::cluster_panel::ClusterPanel;
use crate::components::force_graph::{CanvasEvent, ForceGraphCanvas};
use crate::components::gap_panel::GapPanel;
use crate::components::playback_controls::PlaybackControls;
use crate::components::session::GraphSession;
use crate::components::slice_controls::SliceControls;
use crate::components::temporal_slider::TemporalSlider;
use crate::config::EngineConfig;
use crate::engine::model::EntityId;
use crate::engine::{
	FocusTarget, GraphSnapshot, HighlightSource, InteractionState, PathPlayback, RenderOptions, SizeScale,
	TemporalFilter, build_render_set,
};
use crate::error::GraphError;

#[derive(Clone, Debug, PartialEq)]
enum LoadState {
	Loading,
	Loaded(Arc<GraphSnapshot>),
	/// Nothing to show yet, with the reason.
	Unavailable(String),
	Failed(String),
}

/// Ids of `id` and every node one edge away from it.
fn neighborhood(snapshot: &GraphSnapshot, id: &str) -> HashSet<EntityId> {
	let mut ids: HashSet<EntityId> = snapshot
		.edges
		.iter()
		.filter_map(|e| {
			if e.source == id {
				Some(e.target.clone())
			} else if e.target == id {
				Some(e.source.clone())
			} else {
				None
			}
		})
		.collect();
	ids.insert(id.to_string());
	ids
}

/// Graph view of one project: canvas, minimap and every control panel,
/// all driven by one interaction state.
#[component]
pub fn Project() -> impl IntoView {
	let config = use_context::<EngineConfig>().unwrap_or_default();
	let params = use_params_map();
	let project_id = Memo::new(move |_| params.with(|p| p.get("id").unwrap_or_default()));

	let load = RwSignal::new(LoadState::Loading);
	let reload = RwSignal::new(0u32);
	let generation = StoredValue::new(0u64);
	let snapshot = Memo::new(move |_| match load.get() {
		LoadState::Loaded(snapshot) => Some(snapshot),
		_ => None,
	});

	let session = GraphSession {
		project_id: project_id.into(),
		snapshot: snapshot.into(),
		interaction: RwSignal::new(InteractionState::new()),
		temporal: RwSignal::new(TemporalFilter::default()),
		focus: RwSignal::new(None),
		api_base: StoredValue::new(config.api_base_url.clone()),
	};
	let playback: RwSignal<Option<PathPlayback>> = RwSignal::new(None);

	// a new snapshot replaces the old one wholesale; late answers for an
	// older request are dropped
	Effect::new(move |_| {
		let id = project_id.get();
		reload.track();
		let Some(current) = generation.try_update_value(|g| {
			*g += 1;
			*g
		}) else {
			return;
		};
		load.set(LoadState::Loading);
		let client: ApiClient = session.client();
		spawn_local(async move {
			let result = client.fetch_snapshot(&id).await;
			if generation.try_get_value() != Some(current) {
				debug!("discarding stale snapshot for {id}");
				return;
			}
			let next = match result {
				Ok(snapshot) => {
					info!("snapshot for {id} ready");
					LoadState::Loaded(Arc::new(snapshot))
				}
				Err(GraphError::DataUnavailable(reason)) => LoadState::Unavailable(reason),
				Err(err) => {
					warn!("loading {id} failed: {err}");
					LoadState::Failed(err.to_string())
				}
			};
			session.interaction.try_update(InteractionState::reset);
			session.temporal.try_set(TemporalFilter::default());
			session.focus.try_set(None);
			playback.try_set(None);
			load.try_set(next);
		});
	});

	let encoding = config.encoding.clone();
	let render_set = Memo::new(move |_| {
		let options = RenderOptions {
			scale: SizeScale::NODE_2D,
			temporal: session.temporal.get(),
		};
		snapshot.with(|snap| {
			snap.as_deref()
				.map(|snap| session.interaction.with(|s| build_render_set(snap, s, &encoding, &options)))
				.unwrap_or_default()
		})
	});
	let encoding = config.encoding.clone();
	let minimap = Memo::new(move |_| {
		let options = RenderOptions {
			scale: SizeScale::MINIMAP,
			temporal: session.temporal.get(),
		};
		snapshot.with(|snap| {
			snap.as_deref()
				.map(|snap| session.interaction.with(|s| build_render_set(snap, s, &encoding, &options)))
				.unwrap_or_default()
		})
	});

	let on_canvas = Callback::new(move |event: CanvasEvent| match event {
		CanvasEvent::NodeClicked(id) => {
			let already = session.interaction.with_untracked(|s| {
				s.highlight_source() == &HighlightSource::Manual && s.is_highlighted(&id)
			});
			if already {
				session.interaction.update(|s| {
					s.clear_highlights_from(&HighlightSource::Manual);
				});
				return;
			}
			if let Some(ids) = session.with_snapshot(|snap| neighborhood(snap, &id)) {
				session.interaction.update(|s| s.highlight_nodes(ids));
			}
			session.request_focus(FocusTarget::Node(id));
		}
		CanvasEvent::NodePinned(id) => session.interaction.update(|s| s.pin_node(id)),
		CanvasEvent::NodeUnpinned(id) => session.interaction.update(|s| s.unpin_node(&id)),
	});

	let playback_config = config.playback.clone();
	let on_trace = Callback::new(move |path: Vec<EntityId>| {
		let Some(next) =
			session.with_snapshot(|snap| PathPlayback::along(&path, &snap.edges, &playback_config))
		else {
			return;
		};
		playback.update(|current| {
			if let Some(old) = current.as_mut() {
				session.interaction.update(|s| old.stop(s));
			}
			*current = Some(next);
		});
	});

	let refresh = Callback::new(move |_: ()| reload.update(|n| *n += 1));
	let camera = config.camera.clone();
	let polling = config.polling.clone();

	let toolbar = move || {
		view! {
			<div class="toolbar">
				<A href="/">"← Projects"</A>
				<span class="project-id">{move || project_id.get()}</span>
				<button on:click=move |_| session.request_focus(FocusTarget::Home)>"Reset view"</button>
				<button on:click=move |_| session.interaction.update(InteractionState::clear_highlights)>
					"Clear highlight"
				</button>
				<button on:click=move |_| session.interaction.update(InteractionState::clear_pinned)>
					"Unpin all"
				</button>
				<span class="stats">
					{move || {
						render_set
							.with(|set| {
								format!(
									"{} nodes · {} links{}",
									set.nodes.len(),
									set.links.len(),
									if set.dropped_links > 0 {
										format!(" · {} hidden", set.dropped_links)
									} else {
										String::new()
									},
								)
							})
					}}
				</span>
			</div>
		}
	};

	view! {
		<div class="project">
			{toolbar}
			{move || match load.get() {
				LoadState::Loading => view! { <p class="centered muted">"Loading graph…"</p> }.into_any(),
				LoadState::Unavailable(reason) => {
					view! {
						<div class="centered">
							<h2>"No graph yet"</h2>
							<p class="muted">{reason}</p>
							<button on:click=move |_| refresh.run(())>"Retry"</button>
						</div>
					}
						.into_any()
				}
				LoadState::Failed(message) => {
					view! {
						<div class="centered">
							<h2>"Could not load the graph"</h2>
							<p class="error">{message}</p>
							<button on:click=move |_| refresh.run(())>"Retry"</button>
						</div>
					}
						.into_any()
				}
				LoadState::Loaded(_) => {
					let (camera, polling) = (camera.clone(), polling.clone());
					view! {
						<div class="workspace">
							<div class="graph-area">
								<ForceGraphCanvas
									render_set=render_set
									minimap=minimap
									focus=session.focus
									on_event=on_canvas
									camera=camera
								/>
							</div>
							<aside class="sidebar">
								<ClusterPanel session=session on_recomputed=refresh />
								<GapPanel session=session on_trace=on_trace />
								<PlaybackControls session=session playback=playback />
								<SliceControls session=session />
								<TemporalSlider session=session />
								<BuildPanel session=session polling=polling on_complete=refresh />
							</aside>
						</div>
					}
						.into_any()
				}
			}}
		</div>
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::engine::{Edge, Entity, EntityType, RelationshipType};
	use pretty_assertions::assert_eq;

	#[test]
	fn neighborhood_follows_edges_both_ways() {
		let snapshot = GraphSnapshot::new(
			["a", "b", "c", "d"]
				.iter()
				.map(|id| Entity::new(*id, *id, EntityType::Concept))
				.collect(),
			vec![
				Edge::new("ab", "a", "b", RelationshipType::RelatedTo),
				Edge::new("ca", "c", "a", RelationshipType::Cites),
			],
			vec![],
			vec![],
			vec![],
		);
		let mut ids: Vec<EntityId> = neighborhood(&snapshot, "a").into_iter().collect();
		ids.sort();
		assert_eq!(ids, vec!["a", "b", "c"]);
	}
}
