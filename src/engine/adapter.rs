//! Renderer-neutral render set, rebuilt on every data or state change.
//!
//! Concrete views map [`RenderNode`]/[`RenderLink`] onto their own schema and
//! key everything by node id, never by position in the list.

use std::collections::HashSet;

use log::debug;

use crate::config::EncodingConfig;

use super::encoding::{EncodingContext, LinkVisual, NodeVisual, SizeScale, resolve_link};
use super::interaction::InteractionState;
use super::model::{ClusterId, EdgeId, EntityId, EntityType, GraphSnapshot};
use super::temporal::TemporalFilter;

/// Per-view knobs for building a render set.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderOptions {
	/// Node size range.
	pub scale: SizeScale,
	/// Year cutoff.
	pub temporal: TemporalFilter,
}

impl Default for RenderOptions {
	fn default() -> Self {
		Self {
			scale: SizeScale::NODE_2D,
			temporal: TemporalFilter::default(),
		}
	}
}

/// One drawable node.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderNode {
	/// Entity id; the stable key across rebuilds.
	pub id: EntityId,
	/// Display name.
	pub label: String,
	/// Kind of entity.
	pub entity_type: EntityType,
	/// Cluster, when the snapshot knows it.
	pub cluster_id: Option<ClusterId>,
	/// Resolved color, size and opacity.
	pub visual: NodeVisual,
	/// Final opacity, with dimming applied.
	pub opacity: f64,
	/// Part of the current highlight.
	pub highlighted: bool,
	/// Outside a non-empty highlight.
	pub dimmed: bool,
	/// Fixed in place by the user.
	pub pinned: bool,
	/// Will disappear when the current slice preview is applied.
	pub preview_sliced: bool,
}

/// One drawable link.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderLink {
	/// Edge id.
	pub id: EdgeId,
	/// Source entity id.
	pub source: EntityId,
	/// Target entity id.
	pub target: EntityId,
	/// Resolved color, width and opacity.
	pub visual: LinkVisual,
	/// Part of the current highlight.
	pub highlighted: bool,
	/// Outside a non-empty highlight.
	pub dimmed: bool,
}

/// Everything a renderer needs for one frame of data.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderSet {
	/// Visible nodes.
	pub nodes: Vec<RenderNode>,
	/// Links whose both ends are in `nodes`.
	pub links: Vec<RenderLink>,
	/// Edges skipped because an endpoint is missing or hidden.
	pub dropped_links: usize,
}

impl RenderSet {
	/// Look up a node by id.
	pub fn node(&self, id: &str) -> Option<&RenderNode> {
		self.nodes.iter().find(|n| n.id == id)
	}

	/// Ids of every node in the set.
	pub fn node_ids(&self) -> HashSet<&str> {
		self.nodes.iter().map(|n| n.id.as_str()).collect()
	}
}

/// Build the visible nodes and links of a snapshot for one view.
///
/// Visible nodes are all entities minus sliced ones and minus those outside
/// the temporal filter. While a slice is only previewed the affected nodes
/// stay, tagged `preview_sliced`.
pub fn build_render_set(
	snapshot: &GraphSnapshot,
	state: &InteractionState,
	config: &EncodingConfig,
	options: &RenderOptions,
) -> RenderSet {
	let ctx = EncodingContext::new(snapshot, config);
	let previewing = state.is_previewing();

	let nodes: Vec<RenderNode> = snapshot
		.entities
		.iter()
		.filter(|e| !state.is_sliced(&e.id) && options.temporal.admits(e))
		.map(|e| {
			let visual = ctx.encode(e, state, options.scale);
			let dimmed = state.is_node_dimmed(&e.id);
			RenderNode {
				id: e.id.clone(),
				label: e.name.clone(),
				entity_type: e.entity_type,
				cluster_id: ctx.known_cluster(e),
				visual,
				opacity: if dimmed { config.dimmed_opacity } else { visual.opacity },
				highlighted: state.is_highlighted(&e.id),
				dimmed,
				pinned: state.is_pinned(&e.id),
				preview_sliced: previewing && state.slice_preview().contains(&e.id),
			}
		})
		.collect();

	let visible: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
	let mut dropped_links = 0;
	let links = snapshot
		.edges
		.iter()
		.filter(|edge| {
			let keep = visible.contains(edge.source.as_str()) && visible.contains(edge.target.as_str());
			if !keep {
				dropped_links += 1;
				if !snapshot.contains(&edge.source) || !snapshot.contains(&edge.target) {
					debug!("edge {} references a missing entity", edge.id);
				}
			}
			keep
		})
		.map(|edge| {
			let highlighted = state.is_edge_highlighted(edge);
			let dimmed = state.is_edge_dimmed(edge);
			RenderLink {
				id: edge.id.clone(),
				source: edge.source.clone(),
				target: edge.target.clone(),
				visual: resolve_link(edge.weight, highlighted, dimmed, config),
				highlighted,
				dimmed,
			}
		})
		.collect();

	RenderSet {
		nodes,
		links,
		dropped_links,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::engine::encoding::HIGHLIGHT_COLOR;
	use crate::engine::model::{Edge, Entity, RelationshipType};
	use pretty_assertions::assert_eq;

	fn snapshot() -> GraphSnapshot {
		GraphSnapshot::new(
			vec![
				Entity::new("a", "A", EntityType::Concept).with_property("year", 2010),
				Entity::new("b", "B", EntityType::Concept).with_property("year", 2015),
				Entity::new("c", "C", EntityType::Paper).with_property("year", 2022),
			],
			vec![
				Edge::new("ab", "a", "b", RelationshipType::RelatedTo),
				Edge::new("bc", "b", "c", RelationshipType::Cites),
				Edge::new("ax", "a", "ghost", RelationshipType::Cites),
			],
			vec![],
			vec![],
			vec![],
		)
	}

	fn ids(set: &RenderSet) -> Vec<&str> {
		set.nodes.iter().map(|n| n.id.as_str()).collect()
	}

	#[test]
	fn dangling_edges_are_dropped() {
		let set = build_render_set(
			&snapshot(),
			&InteractionState::new(),
			&EncodingConfig::default(),
			&RenderOptions::default(),
		);
		assert_eq!(ids(&set), vec!["a", "b", "c"]);
		assert_eq!(set.links.len(), 2);
		assert_eq!(set.dropped_links, 1);
	}

	#[test]
	fn sliced_nodes_and_their_edges_disappear() {
		let mut state = InteractionState::new();
		state.preview_slice(&["b".to_string()], 1);
		state.apply_slicing();
		let set = build_render_set(&snapshot(), &state, &EncodingConfig::default(), &RenderOptions::default());
		assert_eq!(ids(&set), vec!["a", "c"]);
		assert!(set.links.is_empty());
	}

	#[test]
	fn preview_keeps_nodes_but_tags_them() {
		let mut state = InteractionState::new();
		state.preview_slice(&["b".to_string()], 1);
		let set = build_render_set(&snapshot(), &state, &EncodingConfig::default(), &RenderOptions::default());
		assert_eq!(ids(&set), vec!["a", "b", "c"]);
		assert!(set.node("b").unwrap().preview_sliced);
		assert!(!set.node("a").unwrap().preview_sliced);
	}

	#[test]
	fn highlight_dims_everything_else() {
		let config = EncodingConfig::default();
		let mut state = InteractionState::new();
		state.highlight_nodes(["a".to_string(), "b".to_string()].into());
		let set = build_render_set(&snapshot(), &state, &config, &RenderOptions::default());

		let a = set.node("a").unwrap();
		assert!(a.highlighted && !a.dimmed);
		assert_eq!(a.visual.color, HIGHLIGHT_COLOR);
		let c = set.node("c").unwrap();
		assert!(c.dimmed);
		assert_eq!(c.opacity, config.dimmed_opacity);

		let ab = set.links.iter().find(|l| l.id == "ab").unwrap();
		assert!(ab.highlighted && !ab.dimmed);
		let bc = set.links.iter().find(|l| l.id == "bc").unwrap();
		assert!(bc.dimmed);
	}

	#[test]
	fn temporal_filter_limits_visible_nodes() {
		let options = RenderOptions {
			temporal: TemporalFilter::until(2016),
			..RenderOptions::default()
		};
		let set = build_render_set(&snapshot(), &InteractionState::new(), &EncodingConfig::default(), &options);
		assert_eq!(ids(&set), vec!["a", "b"]);
		assert_eq!(set.links.len(), 1);
	}

	#[test]
	fn views_agree_on_colors() {
		let s = snapshot();
		let state = InteractionState::new();
		let config = EncodingConfig::default();
		let canvas = build_render_set(&s, &state, &config, &RenderOptions::default());
		let minimap = build_render_set(
			&s,
			&state,
			&config,
			&RenderOptions {
				scale: SizeScale::MINIMAP,
				..RenderOptions::default()
			},
		);
		for (a, b) in canvas.nodes.iter().zip(&minimap.nodes) {
			assert_eq!(a.visual.color, b.visual.color);
			assert_eq!(a.opacity, b.opacity);
		}
	}
}
