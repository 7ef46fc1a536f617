use leptos::prelude::*;
use leptos::task::spawn_local;
use log::{debug, warn};

use super::session::GraphSession;
use crate::api::BridgeHypotheses;
use crate::engine::model::{EntityId, GapId, StructuralGap};
use crate::engine::{FocusTarget, GraphSnapshot};

/// Node path that walks from one side of a gap across its bridge candidates
/// to the other side.
fn bridge_path(gap: &StructuralGap) -> Vec<EntityId> {
	let mut path: Vec<EntityId> = Vec::new();
	let ends = gap.cluster_a_concepts.first().into_iter();
	for id in ends
		.chain(&gap.bridge_candidates)
		.chain(gap.cluster_b_concepts.first())
	{
		if !path.contains(id) {
			path.push(id.clone());
		}
	}
	path
}

fn concept_names(snapshot: &GraphSnapshot, ids: &[EntityId]) -> String {
	ids.iter()
		.take(3)
		.map(|id| snapshot.entity(id).map_or(id.as_str(), |e| e.name.as_str()))
		.collect::<Vec<_>>()
		.join(", ")
}

/// Structural gaps of the project, strongest first. Selecting one highlights
/// it and frames it once the layout has settled.
#[component]
pub fn GapPanel(
	session: GraphSession,
	/// Receives the node path of "trace bridge".
	#[prop(into)]
	on_trace: Callback<Vec<EntityId>>,
) -> impl IntoView {
	let hypotheses: RwSignal<Option<(GapId, Result<BridgeHypotheses, String>)>> = RwSignal::new(None);
	let generating = RwSignal::new(false);

	let gaps = Memo::new(move |_| {
		session.snapshot.with(|snap| {
			let mut gaps = snap.as_ref().map(|s| s.gaps.clone()).unwrap_or_default();
			gaps.sort_by(|a, b| b.gap_strength.total_cmp(&a.gap_strength));
			gaps
		})
	});

	let toggle = move |gap: StructuralGap| {
		let already = session
			.interaction
			.with_untracked(|s| s.selected_gap_id() == Some(&gap.id));
		if already {
			session.interaction.update(|s| s.select_gap(None, &[]));
			return;
		}
		session.with_snapshot(|snap| {
			session.interaction.update(|s| s.select_gap(Some(&gap), &snap.edges));
		});
		session.request_focus(FocusTarget::Gap(gap));
	};

	let generate = move |gap_id: GapId| {
		if generating.get_untracked() {
			return;
		}
		generating.set(true);
		let (client, project) = (session.client(), session.project_id.get_untracked());
		spawn_local(async move {
			let result = client.generate_bridge(&project, &gap_id).await.map_err(|e| {
				warn!("bridge generation for {gap_id} failed: {e}");
				e.to_string()
			});
			debug!("bridge hypotheses for {gap_id} ready");
			hypotheses.set(Some((gap_id, result)));
			generating.set(false);
		});
	};

	let selected_hypotheses = move || {
		let selected = session.interaction.with(|s| s.selected_gap_id().cloned())?;
		hypotheses.with(|h| match h {
			Some((id, result)) if *id == selected => Some(result.clone()),
			_ => None,
		})
	};

	view! {
		<section class="panel gap-panel">
			<h2>"Structural gaps"</h2>
			<Show when=move || !gaps.with(Vec::is_empty) fallback=|| view! { <p class="muted">"No gaps detected."</p> }>
				<ul class="gap-list">
					<For
						each=move || gaps.get()
						key=|gap| gap.id.clone()
						children=move |gap| {
							let id = gap.id.clone();
							let label = session
								.with_snapshot(|snap| {
									format!(
										"{}  ↔  {}",
										concept_names(snap, &gap.cluster_a_concepts),
										concept_names(snap, &gap.cluster_b_concepts),
									)
								})
								.unwrap_or_default();
							let strength = format!("{:.0}%", gap.gap_strength * 100.0);
							let (gap_click, gap_trace, id_bridge) = (gap.clone(), gap.clone(), id.clone());
							view! {
								<li
									class="gap"
									class:selected=move || {
										session.interaction.with(|s| s.selected_gap_id() == Some(&id))
									}
								>
									<button class="gap-select" on:click=move |_| toggle(gap_click.clone())>
										<span class="gap-label">{label}</span>
										<span class="gap-strength">{strength}</span>
									</button>
									<div class="gap-actions">
										<button on:click=move |_| on_trace.run(bridge_path(&gap_trace))>"Trace bridge"</button>
										<button
											disabled=move || generating.get()
											on:click=move |_| generate(id_bridge.clone())
										>
											"Generate hypotheses"
										</button>
									</div>
								</li>
							}
						}
					/>
				</ul>
			</Show>
			{move || {
				selected_hypotheses()
					.map(|result| match result {
						Ok(BridgeHypotheses { bridge_type, key_insight, hypotheses: items }) => {
							view! {
								<div class="hypotheses">
									<h3>{bridge_type}</h3>
									<p class="insight">{key_insight}</p>
									<ul>
										{items
											.into_iter()
											.map(|h| {
												let confidence = format!("{:.0}%", h.confidence.clamp(0.0, 1.0) * 100.0);
												view! {
													<li>
														<strong>{h.title}</strong>
														<span class="confidence">{confidence}</span>
														<p>{h.description}</p>
													</li>
												}
											})
											.collect_view()}
									</ul>
								</div>
							}
								.into_any()
						}
						Err(message) => view! { <p class="error">{message}</p> }.into_any(),
					})
			}}
		</section>
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;

	#[test]
	fn bridge_path_crosses_candidates_without_repeats() {
		let gap = StructuralGap {
			id: "g".into(),
			cluster_a_id: 1,
			cluster_b_id: 2,
			cluster_a_concepts: vec!["a1".into(), "a2".into()],
			cluster_b_concepts: vec!["b1".into()],
			bridge_candidates: vec!["a1".into(), "x".into()],
			gap_strength: 0.5,
			research_questions: vec![],
			potential_edges: None,
		};
		assert_eq!(bridge_path(&gap), vec!["a1", "x", "b1"]);
	}
}
