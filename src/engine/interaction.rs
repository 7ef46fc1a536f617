//! Session-scoped interaction state: highlights, pins, slicing, gap selection.
//!
//! One [`InteractionState`] belongs to one mounted graph session. Ids are never
//! validated against the live entity list, so commands issued by late async
//! updates cannot fail.

use std::collections::HashSet;

use log::debug;
use serde::{Deserialize, Serialize};

use super::model::{
	CentralityMetric, ClusterId, Cluster, Edge, EdgeId, EntityId, GapId, GraphSnapshot, StructuralGap,
};

/// Centrality measure used to rank nodes for slicing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SliceMetric {
	/// Betweenness centrality.
	#[default]
	Betweenness,
	/// Degree centrality.
	Degree,
	/// PageRank.
	Pagerank,
}

impl SliceMetric {
	/// Every metric, in menu order.
	pub const ALL: [Self; 3] = [Self::Betweenness, Self::Degree, Self::Pagerank];

	/// Stable lowercase name.
	pub fn key(self) -> &'static str {
		match self {
			Self::Betweenness => "betweenness",
			Self::Degree => "degree",
			Self::Pagerank => "pagerank",
		}
	}

	/// Inverse of [`SliceMetric::key`].
	pub fn from_key(key: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|m| m.key() == key)
	}

	/// Value of this metric in a record; absent values rank last.
	pub fn value(self, metric: &CentralityMetric) -> f64 {
		let v = match self {
			Self::Betweenness => metric.betweenness_centrality,
			Self::Degree => metric.degree_centrality.unwrap_or(0.0),
			Self::Pagerank => metric.pagerank.unwrap_or(0.0),
		};
		if v.is_nan() { f64::NEG_INFINITY } else { v }
	}
}

/// How many nodes to slice and by which metric.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliceConfig {
	/// How many top-ranked nodes a slice removes.
	pub count: usize,
	/// Ranking used to pick them.
	pub metric: SliceMetric,
}

impl Default for SliceConfig {
	fn default() -> Self {
		Self {
			count: 5,
			metric: SliceMetric::Betweenness,
		}
	}
}

/// Which trigger currently owns the highlight sets.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum HighlightSource {
	/// Nothing highlighted.
	#[default]
	None,
	/// A selected structural gap.
	Gap(GapId),
	/// A cluster from the legend.
	Cluster(ClusterId),
	/// Path playback.
	Path,
	/// Direct node selection on the canvas.
	Manual,
}

/// Rank centrality records by `metric`, descending, ties broken by id.
pub fn rank_by_metric<'a>(
	metrics: impl IntoIterator<Item = &'a CentralityMetric>,
	metric: SliceMetric,
) -> Vec<EntityId> {
	let mut ranked: Vec<&CentralityMetric> = metrics.into_iter().collect();
	ranked.sort_by(|a, b| {
		metric
			.value(b)
			.total_cmp(&metric.value(a))
			.then_with(|| a.concept_id.cmp(&b.concept_id))
	});
	ranked.into_iter().map(|m| m.concept_id.clone()).collect()
}

/// The transient state of one graph session.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InteractionState {
	highlighted_node_ids: HashSet<EntityId>,
	highlighted_edge_ids: HashSet<EdgeId>,
	pinned_node_ids: HashSet<EntityId>,
	sliced_node_ids: HashSet<EntityId>,
	slice_preview: HashSet<EntityId>,
	selected_gap_id: Option<GapId>,
	slice_config: SliceConfig,
	highlight_source: HighlightSource,
}

impl InteractionState {
	/// Empty state: nothing highlighted, sliced or pinned.
	pub fn new() -> Self {
		Self::default()
	}

	// --- highlights ---------------------------------------------------------

	fn set_highlight(
		&mut self,
		source: HighlightSource,
		nodes: HashSet<EntityId>,
		edges: HashSet<EdgeId>,
	) {
		if !matches!(source, HighlightSource::Gap(_)) {
			self.selected_gap_id = None;
		}
		debug!(
			"highlight {:?} -> {:?} ({} nodes, {} edges)",
			self.highlight_source,
			source,
			nodes.len(),
			edges.len()
		);
		self.highlighted_node_ids = nodes;
		self.highlighted_edge_ids = edges;
		self.highlight_source = if self.highlighted_node_ids.is_empty() && self.highlighted_edge_ids.is_empty() {
			HighlightSource::None
		} else {
			source
		};
	}

	/// Replace the highlight set (search results, manual picks).
	pub fn highlight_nodes(&mut self, ids: HashSet<EntityId>) {
		self.set_highlight(HighlightSource::Manual, ids, HashSet::new());
	}

	/// Highlight every concept of a cluster.
	pub fn highlight_cluster(&mut self, cluster: &Cluster) {
		let nodes = cluster.concepts.iter().cloned().collect();
		self.set_highlight(HighlightSource::Cluster(cluster.cluster_id), nodes, HashSet::new());
	}

	/// Highlight one step of a path overlay.
	pub fn highlight_path(&mut self, nodes: HashSet<EntityId>, edges: HashSet<EdgeId>) {
		self.set_highlight(HighlightSource::Path, nodes, edges);
	}

	/// Empty both highlight sets and drop the gap selection.
	pub fn clear_highlights(&mut self) {
		self.set_highlight(HighlightSource::None, HashSet::new(), HashSet::new());
	}

	/// Clear only if `source` still owns the highlight. Returns whether it did.
	pub fn clear_highlights_from(&mut self, source: &HighlightSource) -> bool {
		if &self.highlight_source != source {
			return false;
		}
		self.clear_highlights();
		true
	}

	/// Select a structural gap (or deselect with `None`).
	///
	/// Highlights the union of both clusters' concepts and the bridge
	/// candidates, plus every edge with both endpoints in that union.
	pub fn select_gap(&mut self, gap: Option<&StructuralGap>, edges: &[Edge]) {
		let Some(gap) = gap else {
			self.clear_highlights();
			return;
		};
		let nodes: HashSet<EntityId> = gap
			.cluster_a_concepts
			.iter()
			.chain(&gap.cluster_b_concepts)
			.chain(&gap.bridge_candidates)
			.cloned()
			.collect();
		let edge_ids = edges
			.iter()
			.filter(|e| nodes.contains(&e.source) && nodes.contains(&e.target))
			.map(|e| e.id.clone())
			.collect();
		self.set_highlight(HighlightSource::Gap(gap.id.clone()), nodes, edge_ids);
		self.selected_gap_id = Some(gap.id.clone());
	}

	// --- slicing ------------------------------------------------------------

	/// Configure the next slice. No visible effect until applied.
	pub fn set_slice_parameters(&mut self, count: usize, metric: SliceMetric) {
		self.slice_config = SliceConfig { count, metric };
	}

	/// Make the first `count` ids of a descending ranking the preview set.
	/// The sliced set is left untouched.
	pub fn preview_slice(&mut self, top_bridges: &[EntityId], count: usize) -> &HashSet<EntityId> {
		self.slice_preview = top_bridges.iter().take(count).cloned().collect();
		&self.slice_preview
	}

	/// Preview the configured number of top nodes of a snapshot, ranked by the
	/// configured metric.
	pub fn preview_top_bridges(&mut self, snapshot: &GraphSnapshot) -> &HashSet<EntityId> {
		let ranked = rank_by_metric(snapshot.centrality.values(), self.slice_config.metric);
		let count = self.slice_config.count;
		self.preview_slice(&ranked, count)
	}

	/// Commit the preview into the sliced set. Slicing is exclusive: while
	/// nodes are sliced this is a no-op and returns `false`.
	pub fn apply_slicing(&mut self) -> bool {
		if !self.sliced_node_ids.is_empty() {
			debug!("slice already applied, ignoring");
			return false;
		}
		self.sliced_node_ids = std::mem::take(&mut self.slice_preview);
		debug!("sliced {} nodes", self.sliced_node_ids.len());
		!self.sliced_node_ids.is_empty()
	}

	/// Bring every sliced node back and discard any preview.
	pub fn reset_slicing(&mut self) {
		self.sliced_node_ids.clear();
		self.slice_preview.clear();
	}

	// --- pins ---------------------------------------------------------------

	/// Fix a node in place.
	pub fn pin_node(&mut self, id: impl Into<EntityId>) {
		self.pinned_node_ids.insert(id.into());
	}

	/// Release a pinned node.
	pub fn unpin_node(&mut self, id: &str) {
		self.pinned_node_ids.remove(id);
	}

	/// Release every pinned node.
	pub fn clear_pinned(&mut self) {
		self.pinned_node_ids.clear();
	}

	/// Back to a freshly created session.
	pub fn reset(&mut self) {
		*self = Self {
			slice_config: self.slice_config,
			..Self::default()
		};
	}

	// --- queries ------------------------------------------------------------

	/// Highlighted nodes.
	pub fn highlighted_node_ids(&self) -> &HashSet<EntityId> {
		&self.highlighted_node_ids
	}

	/// Highlighted edges.
	pub fn highlighted_edge_ids(&self) -> &HashSet<EdgeId> {
		&self.highlighted_edge_ids
	}

	/// Pinned nodes.
	pub fn pinned_node_ids(&self) -> &HashSet<EntityId> {
		&self.pinned_node_ids
	}

	/// Nodes removed by an applied slice.
	pub fn sliced_node_ids(&self) -> &HashSet<EntityId> {
		&self.sliced_node_ids
	}

	/// Nodes a preview would remove.
	pub fn slice_preview(&self) -> &HashSet<EntityId> {
		&self.slice_preview
	}

	/// Gap picked in the gap panel.
	pub fn selected_gap_id(&self) -> Option<&GapId> {
		self.selected_gap_id.as_ref()
	}

	/// Parameters of the next slice.
	pub fn slice_config(&self) -> SliceConfig {
		self.slice_config
	}

	/// Trigger that owns the current highlight.
	pub fn highlight_source(&self) -> &HighlightSource {
		&self.highlight_source
	}

	/// Whether node `id` is highlighted.
	pub fn is_highlighted(&self, id: &str) -> bool {
		self.highlighted_node_ids.contains(id)
	}

	/// Whether any node is highlighted.
	pub fn has_highlight(&self) -> bool {
		!self.highlighted_node_ids.is_empty()
	}

	/// Whether node `id` is pinned.
	pub fn is_pinned(&self, id: &str) -> bool {
		self.pinned_node_ids.contains(id)
	}

	/// Whether node `id` was removed by a slice.
	pub fn is_sliced(&self, id: &str) -> bool {
		self.sliced_node_ids.contains(id)
	}

	/// A preview is showing and has not been committed yet.
	pub fn is_previewing(&self) -> bool {
		!self.slice_preview.is_empty() && self.sliced_node_ids.is_empty()
	}

	/// Dimmed: a highlight is active and the node is not part of it.
	pub fn is_node_dimmed(&self, id: &str) -> bool {
		self.has_highlight() && !self.is_highlighted(id)
	}

	/// Edges count as highlighted when listed explicitly or when both
	/// endpoints are highlighted.
	pub fn is_edge_highlighted(&self, edge: &Edge) -> bool {
		self.highlighted_edge_ids.contains(&edge.id)
			|| (self.is_highlighted(&edge.source) && self.is_highlighted(&edge.target))
	}

	/// Dimmed unless highlighted while a highlight is active.
	pub fn is_edge_dimmed(&self, edge: &Edge) -> bool {
		self.has_highlight() && !self.is_edge_highlighted(edge)
	}

	/// Subset of `ids` that should be drawn dimmed.
	pub fn nodes_to_dim<'a>(&self, ids: impl IntoIterator<Item = &'a EntityId>) -> HashSet<EntityId> {
		if !self.has_highlight() {
			return HashSet::new();
		}
		ids.into_iter()
			.filter(|id| !self.is_highlighted(id))
			.cloned()
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::engine::model::RelationshipType;
	use pretty_assertions::assert_eq;

	fn ids(list: &[&str]) -> HashSet<EntityId> {
		list.iter().map(|s| s.to_string()).collect()
	}

	fn gap() -> StructuralGap {
		StructuralGap {
			id: "g1".into(),
			cluster_a_id: 1,
			cluster_b_id: 2,
			cluster_a_concepts: vec!["a1".into(), "a2".into()],
			cluster_b_concepts: vec!["b1".into()],
			bridge_candidates: vec!["a1".into(), "b1".into()],
			gap_strength: 0.7,
			research_questions: vec![],
			potential_edges: None,
		}
	}

	fn edges() -> Vec<Edge> {
		vec![
			Edge::new("e1", "a1", "b1", RelationshipType::RelatedTo),
			Edge::new("e2", "a2", "zz", RelationshipType::RelatedTo),
		]
	}

	#[test]
	fn selecting_a_gap_unions_without_duplicates() {
		let mut state = InteractionState::new();
		state.select_gap(Some(&gap()), &edges());

		assert_eq!(state.highlighted_node_ids(), &ids(&["a1", "a2", "b1"]));
		assert_eq!(state.highlighted_edge_ids(), &ids(&["e1"]));
		assert_eq!(state.selected_gap_id().map(String::as_str), Some("g1"));
		assert_eq!(state.highlight_source(), &HighlightSource::Gap("g1".into()));
	}

	#[test]
	fn deselecting_a_gap_leaves_no_residue() {
		let mut state = InteractionState::new();
		state.select_gap(Some(&gap()), &edges());
		state.select_gap(None, &edges());

		assert!(state.highlighted_node_ids().is_empty());
		assert!(state.highlighted_edge_ids().is_empty());
		assert_eq!(state.selected_gap_id(), None);
		assert_eq!(state.highlight_source(), &HighlightSource::None);
	}

	#[test]
	fn highlight_is_independent_of_slicing_and_pins() {
		let mut state = InteractionState::new();
		state.pin_node("x");
		state.preview_slice(&["x".to_string()], 1);
		state.apply_slicing();
		state.highlight_nodes(ids(&["x"]));
		state.highlight_nodes(ids(&["x"]));

		assert!(state.is_sliced("x"));
		assert!(state.is_highlighted("x"));
		assert!(state.is_pinned("x"));
	}

	#[test]
	fn preview_does_not_slice() {
		let mut state = InteractionState::new();
		let ranked: Vec<EntityId> = ["n1", "n2", "n3"].map(String::from).to_vec();
		let preview = state.preview_slice(&ranked, 2).clone();

		assert_eq!(preview, ids(&["n1", "n2"]));
		assert!(state.sliced_node_ids().is_empty());
		assert!(state.is_previewing());
	}

	#[test]
	fn second_apply_is_a_no_op() {
		let mut state = InteractionState::new();
		state.preview_slice(&["n1".to_string(), "n2".to_string()], 2);
		assert!(state.apply_slicing());
		let first = state.sliced_node_ids().clone();

		state.preview_slice(&["n9".to_string()], 1);
		assert!(!state.apply_slicing());
		assert_eq!(state.sliced_node_ids(), &first);

		state.reset_slicing();
		assert!(state.sliced_node_ids().is_empty());
		assert!(!state.is_previewing());
	}

	#[test]
	fn ranking_uses_the_configured_metric() {
		let m = |id: &str, b: f64, p: f64| CentralityMetric {
			concept_id: id.into(),
			betweenness_centrality: b,
			degree_centrality: None,
			pagerank: Some(p),
		};
		let snapshot = GraphSnapshot::new(
			vec![],
			vec![],
			vec![],
			vec![],
			vec![m("a", 0.9, 0.1), m("b", 0.5, 0.8), m("c", 0.1, 0.5)],
		);
		let mut state = InteractionState::new();

		state.set_slice_parameters(2, SliceMetric::Pagerank);
		assert_eq!(state.preview_top_bridges(&snapshot), &ids(&["b", "c"]));

		state.set_slice_parameters(1, SliceMetric::Betweenness);
		assert_eq!(state.preview_top_bridges(&snapshot), &ids(&["a"]));
	}

	#[test]
	fn newer_trigger_wins_and_stale_clear_is_ignored() {
		let mut state = InteractionState::new();
		state.highlight_path(ids(&["p1", "p2"]), ids(&["e1"]));
		state.select_gap(Some(&gap()), &edges());

		// playback finishing must not wipe the gap highlight
		assert!(!state.clear_highlights_from(&HighlightSource::Path));
		assert_eq!(state.highlight_source(), &HighlightSource::Gap("g1".into()));
		assert!(state.is_highlighted("a1"));
		assert!(!state.is_highlighted("p1"));

		assert!(state.clear_highlights_from(&HighlightSource::Gap("g1".into())));
		assert!(!state.has_highlight());
	}

	#[test]
	fn manual_highlight_drops_gap_selection() {
		let mut state = InteractionState::new();
		state.select_gap(Some(&gap()), &edges());
		state.highlight_nodes(ids(&["q"]));
		assert_eq!(state.selected_gap_id(), None);
		assert_eq!(state.highlight_source(), &HighlightSource::Manual);
	}

	#[test]
	fn dimming_only_applies_with_an_active_highlight() {
		let mut state = InteractionState::new();
		let all = ids(&["a1", "a2", "c"]);
		assert!(state.nodes_to_dim(&all).is_empty());
		assert!(!state.is_node_dimmed("c"));

		state.select_gap(Some(&gap()), &edges());
		assert_eq!(state.nodes_to_dim(&all), ids(&["c"]));
		assert!(state.is_edge_dimmed(&edges()[1]));
		assert!(!state.is_edge_dimmed(&edges()[0]));
	}

	#[test]
	fn reset_keeps_slice_configuration() {
		let mut state = InteractionState::new();
		state.set_slice_parameters(9, SliceMetric::Degree);
		state.pin_node("a");
		state.highlight_nodes(ids(&["a"]));
		state.reset();

		assert_eq!(state.slice_config().count, 9);
		assert!(state.pinned_node_ids().is_empty());
		assert!(!state.has_highlight());
	}

	#[test]
	fn unknown_ids_are_accepted() {
		let mut state = InteractionState::new();
		state.unpin_node("ghost");
		state.pin_node("ghost");
		state.clear_pinned();
		assert!(state.pinned_node_ids().is_empty());
	}
}
