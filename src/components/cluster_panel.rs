use leptos::prelude::*;
use leptos::task::spawn_local;
use log::{info, warn};
use web_sys::Event;

use super::session::GraphSession;
use crate::engine::encoding::cluster_color;
use crate::engine::model::{Cluster, ClusterId};
use crate::engine::{FocusTarget, HighlightSource, compare_clusters};

fn cluster_title(cluster: &Cluster) -> String {
	cluster
		.label
		.clone()
		.unwrap_or_else(|| format!("Cluster {}", cluster.cluster_id))
}

fn parse_cluster(ev: &Event) -> Option<ClusterId> {
	event_target_value(ev).parse().ok()
}

/// Cluster legend: click to highlight and frame a cluster, recompute with a
/// different cluster count, compare two clusters side by side.
#[component]
pub fn ClusterPanel(
	session: GraphSession,
	/// Called after a successful recomputation so the page can reload.
	#[prop(into)]
	on_recomputed: Callback<()>,
) -> impl IntoView {
	let interaction = session.interaction;
	let clusters = Memo::new(move |_| {
		session
			.snapshot
			.with(|s| s.as_ref().map(|s| s.clusters.clone()).unwrap_or_default())
	});
	let target_count = RwSignal::new(String::new());
	let recompute_status: RwSignal<Option<String>> = RwSignal::new(None);
	let compare_a: RwSignal<Option<ClusterId>> = RwSignal::new(None);
	let compare_b: RwSignal<Option<ClusterId>> = RwSignal::new(None);

	let toggle = move |cluster: Cluster| {
		let source = HighlightSource::Cluster(cluster.cluster_id);
		if interaction.with_untracked(|s| s.highlight_source() == &source) {
			interaction.update(|s| {
				s.clear_highlights_from(&source);
			});
			return;
		}
		interaction.update(|s| s.highlight_cluster(&cluster));
		session.request_focus(FocusTarget::Cluster(cluster.cluster_id));
	};

	let recompute = move |_| {
		let Ok(count) = target_count.get_untracked().trim().parse::<usize>() else {
			recompute_status.set(Some("Enter a cluster count".into()));
			return;
		};
		let (client, project) = (session.client(), session.project_id.get_untracked());
		recompute_status.set(Some("Recomputing…".into()));
		spawn_local(async move {
			match client.recompute_clusters(&project, count).await {
				Ok(result) => {
					info!("recomputed clusters of {project}, optimal k = {}", result.optimal_k);
					recompute_status.try_set(Some(format!("Done (optimal k = {})", result.optimal_k)));
					on_recomputed.run(());
				}
				Err(err) => {
					warn!("cluster recompute failed: {err}");
					recompute_status.try_set(Some(err.to_string()));
				}
			}
		});
	};

	let comparison = move || {
		let (a, b) = (compare_a.get()?, compare_b.get()?);
		clusters.with(|all| {
			let find = |id| all.iter().find(|c| c.cluster_id == id);
			Some(compare_clusters(find(a)?, find(b)?))
		})
	};

	let options = move || {
		clusters
			.get()
			.into_iter()
			.map(|c| view! { <option value=c.cluster_id.to_string()>{cluster_title(&c)}</option> })
			.collect_view()
	};

	view! {
		<section class="panel cluster-panel">
			<h2>"Clusters"</h2>
			<ul class="cluster-legend">
				<For
					each=move || clusters.get()
					key=|c| c.cluster_id
					children=move |cluster| {
						let id = cluster.cluster_id;
						let title = cluster_title(&cluster);
						let size = cluster.concepts.len();
						view! {
							<li
								class="cluster"
								class:selected=move || {
									interaction.with(|s| s.highlight_source() == &HighlightSource::Cluster(id))
								}
								on:click=move |_| toggle(cluster.clone())
							>
								<span class="swatch" style:background-color=cluster_color(id)></span>
								<span class="cluster-title">{title}</span>
								<span class="cluster-size">{size}</span>
							</li>
						}
					}
				/>
			</ul>

			<div class="recompute">
				<input
					type="number"
					min="2"
					placeholder="k"
					prop:value=move || target_count.get()
					on:input=move |ev: Event| target_count.set(event_target_value(&ev))
				/>
				<button on:click=recompute>"Recompute"</button>
				<span class="muted">{move || recompute_status.get()}</span>
			</div>

			<div class="cluster-compare">
				<h3>"Compare"</h3>
				<select on:change=move |ev: Event| compare_a.set(parse_cluster(&ev))>
					<option value="">"-"</option>
					{options}
				</select>
				<select on:change=move |ev: Event| compare_b.set(parse_cluster(&ev))>
					<option value="">"-"</option>
					{options}
				</select>
				{move || {
					comparison()
						.map(|cmp| {
							view! {
								<dl>
									<dt>"Common"</dt>
									<dd>{cmp.common.join(", ")}</dd>
									<dt>"Only in first"</dt>
									<dd>{cmp.unique_to_a.join(", ")}</dd>
									<dt>"Only in second"</dt>
									<dd>{cmp.unique_to_b.join(", ")}</dd>
								</dl>
							}
						})
				}}
			</div>
		</section>
	}
}
