//! Visual encoding: entity + context → color, size, opacity.
//!
//! These are the only color/size formulas in the crate. Every renderer (the
//! physics canvas, the minimap, a 3D view) calls into here with its own
//! [`SizeScale`] so that relative prominence never depends on the view.

use crate::config::EncodingConfig;

use super::interaction::InteractionState;
use super::model::{CentralityMetric, ClusterId, Entity, EntityType, GraphSnapshot};

/// Reserved color of highlighted nodes and links.
pub const HIGHLIGHT_COLOR: &str = "#FFD700";
/// Fallback for entity types without a mapped color.
pub const NEUTRAL_COLOR: &str = "#9CA3AF";
/// Default link stroke.
pub const LINK_COLOR: &str = "#64B4FF";

/// Cluster palette; `color(id) = PALETTE[id mod len]`.
pub const PALETTE: &[&str] = &[
	"#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
	"#bcbd22", "#17becf",
];

/// Palette color of a cluster. Negative ids wrap with Euclidean modulo.
pub fn cluster_color(cluster_id: ClusterId) -> &'static str {
	let len = PALETTE.len() as i64;
	PALETTE[cluster_id.rem_euclid(len) as usize]
}

/// Base color of an entity type.
pub fn entity_type_color(entity_type: EntityType) -> &'static str {
	match entity_type {
		EntityType::Paper => "#3B82F6",
		EntityType::Author => "#10B981",
		EntityType::Concept => "#8B5CF6",
		EntityType::Method => "#F59E0B",
		EntityType::Finding => "#EF4444",
		EntityType::Problem => "#EC4899",
		EntityType::Dataset => "#06B6D4",
		EntityType::Metric => "#84CC16",
		EntityType::Innovation => "#14B8A6",
		EntityType::Limitation => "#F97316",
		EntityType::Unknown => NEUTRAL_COLOR,
	}
}

/// Size range of one renderer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SizeScale {
	/// Size of a node with no centrality signal.
	pub min: f64,
	/// Size of a node with a saturated signal.
	pub max: f64,
}

impl SizeScale {
	/// Sphere radius in a 3D force graph.
	pub const SPHERE_3D: Self = Self { min: 4.0, max: 20.0 };
	/// Circle radius on the 2D canvas.
	pub const NODE_2D: Self = Self { min: 4.0, max: 12.0 };
	/// Dot radius on the minimap.
	pub const MINIMAP: Self = Self { min: 1.0, max: 3.0 };

	/// Map a unit signal onto this range; the result is always in `[min, max]`.
	pub fn scale(&self, signal: f64) -> f64 {
		self.min + (self.max - self.min) * unit(signal)
	}
}

/// Resolved appearance of one node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeVisual {
	/// CSS color.
	pub color: &'static str,
	/// Radius in scene units.
	pub size: f64,
	/// Alpha in `[0, 1]`.
	pub opacity: f64,
}

/// Resolved appearance of one link.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinkVisual {
	/// CSS color.
	pub color: &'static str,
	/// Stroke width in screen pixels.
	pub width: f64,
	/// Alpha in `[0, 1]`.
	pub opacity: f64,
}

/// NaN becomes 0, everything else is clamped into `[0, 1]`.
fn unit(value: f64) -> f64 {
	if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}

/// Color priority: highlight, then a known cluster, then the entity type.
pub fn resolve_color(
	highlighted: bool,
	known_cluster: Option<ClusterId>,
	entity_type: EntityType,
) -> &'static str {
	if highlighted {
		HIGHLIGHT_COLOR
	} else if let Some(cluster_id) = known_cluster {
		cluster_color(cluster_id)
	} else {
		entity_type_color(entity_type)
	}
}

/// Unit size signal: pagerank (or degree) plus weighted betweenness plus the
/// gap bridge bonus, clamped. Missing centrality counts as 0.
pub fn size_signal(
	metric: Option<&CentralityMetric>,
	is_gap_bridge: bool,
	config: &EncodingConfig,
) -> f64 {
	let (base, betweenness) = match metric {
		Some(m) => (
			unit(m.pagerank.or(m.degree_centrality).unwrap_or(0.0)),
			unit(m.betweenness_centrality),
		),
		None => (0.0, 0.0),
	};
	let bridge = if is_gap_bridge { config.gap_bridge_bonus } else { 0.0 };
	unit(base + config.betweenness_weight * betweenness + bridge)
}

/// Opacity rises linearly from the floor with the strongest centrality signal.
pub fn resolve_opacity(metric: Option<&CentralityMetric>, config: &EncodingConfig) -> f64 {
	let floor = unit(config.opacity_floor);
	let strongest = metric
		.map(|m| {
			unit(m.pagerank.unwrap_or(0.0))
				.max(unit(m.degree_centrality.unwrap_or(0.0)))
				.max(unit(m.betweenness_centrality))
		})
		.unwrap_or(0.0);
	floor + (1.0 - floor) * strongest
}

/// Link appearance. Width grows with the (clamped) weight.
pub fn resolve_link(weight: Option<f64>, highlighted: bool, dimmed: bool, config: &EncodingConfig) -> LinkVisual {
	let w = unit(weight.unwrap_or(0.5));
	LinkVisual {
		color: if highlighted { HIGHLIGHT_COLOR } else { LINK_COLOR },
		width: if highlighted { 1.5 + 2.0 * w } else { 0.75 + 1.5 * w },
		opacity: if dimmed { config.dimmed_opacity } else { 0.6 },
	}
}

/// Ambient context for encoding nodes of one snapshot.
pub struct EncodingContext<'a> {
	snapshot: &'a GraphSnapshot,
	config: &'a EncodingConfig,
}

impl<'a> EncodingContext<'a> {
	/// Encoder for one snapshot.
	pub fn new(snapshot: &'a GraphSnapshot, config: &'a EncodingConfig) -> Self {
		Self { snapshot, config }
	}

	/// Cluster of the entity, only if the snapshot knows that cluster.
	pub fn known_cluster(&self, entity: &Entity) -> Option<ClusterId> {
		self.snapshot
			.cluster_of(entity)
			.filter(|&id| self.snapshot.cluster(id).is_some())
	}

	/// Highlight, then cluster, then type color.
	pub fn color(&self, entity: &Entity, state: &InteractionState) -> &'static str {
		resolve_color(
			state.is_highlighted(&entity.id),
			self.known_cluster(entity),
			entity.entity_type,
		)
	}

	/// Radius of `entity` within `scale`.
	pub fn size(&self, entity: &Entity, scale: SizeScale) -> f64 {
		let signal = size_signal(
			self.snapshot.centrality_of(&entity.id),
			entity.is_gap_bridge(),
			self.config,
		);
		scale.scale(signal)
	}

	/// Base opacity from centrality.
	pub fn opacity(&self, entity: &Entity) -> f64 {
		resolve_opacity(self.snapshot.centrality_of(&entity.id), self.config)
	}

	/// Full node encoding for one renderer.
	pub fn encode(&self, entity: &Entity, state: &InteractionState, scale: SizeScale) -> NodeVisual {
		NodeVisual {
			color: self.color(entity, state),
			size: self.size(entity, scale),
			opacity: self.opacity(entity),
		}
	}

	/// Encoding constants.
	pub fn config(&self) -> &EncodingConfig {
		self.config
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::engine::model::{Cluster, GraphSnapshot};
	use proptest::prelude::*;
	use std::collections::HashSet;

	fn metric(pagerank: Option<f64>, degree: Option<f64>, betweenness: f64) -> CentralityMetric {
		CentralityMetric {
			concept_id: "n".into(),
			betweenness_centrality: betweenness,
			degree_centrality: degree,
			pagerank,
		}
	}

	fn snapshot_with_cluster() -> GraphSnapshot {
		GraphSnapshot::new(
			vec![
				Entity::new("a", "A", EntityType::Concept).with_property("cluster_id", 2),
				Entity::new("b", "B", EntityType::Method).with_property("cluster_id", 99),
				Entity::new("c", "C", EntityType::Unknown),
			],
			vec![],
			vec![Cluster {
				cluster_id: 2,
				label: None,
				concepts: vec!["a".into()],
				concept_names: vec!["A".into()],
				size: 1,
				density: 1.0,
				color: None,
			}],
			vec![],
			vec![],
		)
	}

	#[test]
	fn highlight_beats_cluster_then_cluster_returns() {
		let snapshot = snapshot_with_cluster();
		let config = EncodingConfig::default();
		let ctx = EncodingContext::new(&snapshot, &config);
		let a = snapshot.entity("a").unwrap();
		let mut state = InteractionState::default();

		state.highlight_nodes(HashSet::from(["a".to_string()]));
		assert_eq!(ctx.color(a, &state), HIGHLIGHT_COLOR);

		state.clear_highlights();
		assert_eq!(ctx.color(a, &state), cluster_color(2));
	}

	#[test]
	fn unknown_cluster_and_type_fall_back() {
		let snapshot = snapshot_with_cluster();
		let config = EncodingConfig::default();
		let ctx = EncodingContext::new(&snapshot, &config);
		let state = InteractionState::default();

		let b = snapshot.entity("b").unwrap();
		assert_eq!(ctx.color(b, &state), entity_type_color(EntityType::Method));
		let c = snapshot.entity("c").unwrap();
		assert_eq!(ctx.color(c, &state), NEUTRAL_COLOR);
	}

	#[test]
	fn palette_wraps_by_modulo() {
		let len = PALETTE.len() as i64;
		assert_eq!(cluster_color(3), cluster_color(3 + len));
		assert_eq!(cluster_color(-1), PALETTE[PALETTE.len() - 1]);
	}

	#[test]
	fn missing_centrality_gives_minimum_size_and_floor_opacity() {
		let snapshot = snapshot_with_cluster();
		let config = EncodingConfig::default();
		let ctx = EncodingContext::new(&snapshot, &config);
		let c = snapshot.entity("c").unwrap();
		assert_eq!(ctx.size(c, SizeScale::NODE_2D), SizeScale::NODE_2D.min);
		assert_eq!(ctx.opacity(c), config.opacity_floor);
	}

	#[test]
	fn pagerank_falls_back_to_degree() {
		let config = EncodingConfig::default();
		let with_degree = size_signal(Some(&metric(None, Some(0.4), 0.0)), false, &config);
		assert!((with_degree - 0.4).abs() < 1e-9);
	}

	#[test]
	fn gap_bridges_get_a_fixed_boost() {
		let config = EncodingConfig::default();
		let plain = size_signal(None, false, &config);
		let bridge = size_signal(None, true, &config);
		assert!((bridge - plain - config.gap_bridge_bonus).abs() < 1e-9);
	}

	#[test]
	fn prominence_order_is_the_same_in_every_scale() {
		let config = EncodingConfig::default();
		let weak = size_signal(Some(&metric(Some(0.1), None, 0.1)), false, &config);
		let strong = size_signal(Some(&metric(Some(0.5), None, 0.4)), false, &config);
		for scale in [SizeScale::SPHERE_3D, SizeScale::NODE_2D, SizeScale::MINIMAP] {
			assert!(scale.scale(weak) < scale.scale(strong));
		}
	}

	#[test]
	fn highlighted_links_are_gold_and_wider() {
		let config = EncodingConfig::default();
		let normal = resolve_link(Some(0.5), false, false, &config);
		let lit = resolve_link(Some(0.5), true, false, &config);
		assert_eq!(lit.color, HIGHLIGHT_COLOR);
		assert!(lit.width > normal.width);
		assert_eq!(resolve_link(None, false, true, &config).opacity, config.dimmed_opacity);
	}

	proptest! {
		#[test]
		fn size_is_always_within_bounds(
			pagerank in proptest::option::of(prop_oneof![any::<f64>(), -10.0..10.0f64]),
			degree in proptest::option::of(-10.0..10.0f64),
			betweenness in prop_oneof![any::<f64>(), -10.0..10.0f64],
			bridge in any::<bool>(),
		) {
			let config = EncodingConfig::default();
			let m = metric(pagerank, degree, betweenness);
			for scale in [SizeScale::SPHERE_3D, SizeScale::NODE_2D, SizeScale::MINIMAP] {
				let size = scale.scale(size_signal(Some(&m), bridge, &config));
				prop_assert!(size >= scale.min && size <= scale.max);
			}
		}

		#[test]
		fn opacity_is_between_floor_and_one(
			pagerank in proptest::option::of(any::<f64>()),
			betweenness in any::<f64>(),
		) {
			let config = EncodingConfig::default();
			let opacity = resolve_opacity(Some(&metric(pagerank, None, betweenness)), &config);
			prop_assert!(opacity >= config.opacity_floor && opacity <= 1.0);
		}
	}
}
