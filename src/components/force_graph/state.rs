use std::collections::{HashMap, HashSet};
use std::f64::consts::PI;

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData, SimulationParameters};
use log::debug;

use crate::config::CameraConfig;
use crate::engine::camera::{
	CameraControl, CameraPose, Choreographer, FocusGate, FocusTarget, PositionSource, Vec3,
};
use crate::engine::model::{ClusterId, EntityId, StructuralGap};
use crate::engine::{RenderNode, RenderSet};

pub const HIT_RADIUS: f64 = 12.0;
/// Mean per-node movement (world units per frame) below which the layout
/// counts as settled.
const SETTLE_MOTION: f64 = 0.05;
/// Screen distance a press may travel and still count as a click.
const CLICK_SLOP: f64 = 4.0;

#[derive(Clone, Debug, Default)]
pub struct NodeInfo {
	pub id: EntityId,
	pub label: String,
	pub color: &'static str,
	pub radius: f64,
	pub minimap_radius: f64,
	pub opacity: f64,
	pub cluster_id: Option<ClusterId>,
	pub highlighted: bool,
	pub dimmed: bool,
	pub pinned: bool,
	pub preview_sliced: bool,
}

impl NodeInfo {
	fn from_render(node: &RenderNode, minimap_radius: f64) -> Self {
		Self {
			id: node.id.clone(),
			label: node.label.clone(),
			color: node.visual.color,
			radius: node.visual.size,
			minimap_radius,
			opacity: node.opacity,
			cluster_id: node.cluster_id,
			highlighted: node.highlighted,
			dimmed: node.dimmed,
			pinned: node.pinned,
			preview_sliced: node.preview_sliced,
		}
	}
}

#[derive(Clone, Debug, Default)]
pub struct LinkInfo {
	pub color: &'static str,
	pub width: f64,
	pub opacity: f64,
	pub highlighted: bool,
}

#[derive(Clone, Debug, Default)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub moved: bool,
	pub node_idx: Option<DefaultNodeIdx>,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start_x: f32,
	pub node_start_y: f32,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

#[derive(Clone, Debug, Default)]
pub struct HoverState {
	pub node: Option<DefaultNodeIdx>,
	pub neighbors: HashSet<DefaultNodeIdx>,
	pub highlight_t: f64,
	pub prev_node: Option<DefaultNodeIdx>,
	pub prev_neighbors: HashSet<DefaultNodeIdx>,
	delay_t: f64,
}

/// Outcome of releasing the mouse over the canvas.
#[derive(Clone, Debug, PartialEq)]
pub enum Release {
	Click(EntityId),
	Dropped(EntityId),
	Nothing,
}

pub struct ForceGraphState {
	pub graph: ForceGraph<NodeInfo, LinkInfo>,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub hover: HoverState,
	pub width: f64,
	pub height: f64,
	pub animation_running: bool,
	pub flow_time: f64,
	pub show_minimap: bool,
	camera: Choreographer,
	gate: FocusGate,
	index: HashMap<EntityId, DefaultNodeIdx>,
	edges: Vec<(DefaultNodeIdx, DefaultNodeIdx)>,
	last_positions: HashMap<DefaultNodeIdx, (f32, f32)>,
}

impl ForceGraphState {
	pub fn new(set: &RenderSet, minimap: &RenderSet, camera: CameraConfig, width: f64, height: f64) -> Self {
		let graph = ForceGraph::new(SimulationParameters {
			force_charge: 150.0,
			force_spring: 0.05,
			force_max: 100.0,
			node_speed: 3000.0,
			damping_factor: 0.9,
		});
		let gate = FocusGate::new(camera.settle_delay_ms);
		let mut state = Self {
			graph,
			transform: ViewTransform {
				x: width / 2.0,
				y: height / 2.0,
				k: 1.0,
			},
			drag: DragState::default(),
			pan: PanState::default(),
			hover: HoverState::default(),
			width,
			height,
			animation_running: true,
			flow_time: 0.0,
			show_minimap: true,
			camera: Choreographer::new(camera),
			gate,
			index: HashMap::new(),
			edges: Vec::new(),
			last_positions: HashMap::new(),
		};
		state.sync(set, minimap);
		state.apply_camera();
		state
	}

	/// Rebuild the simulation from a fresh render set, keeping the position of
	/// every node id that was already laid out.
	pub fn sync(&mut self, set: &RenderSet, minimap: &RenderSet) {
		let mut previous: HashMap<EntityId, (f32, f32)> = HashMap::new();
		self.graph.visit_nodes(|node| {
			previous.insert(node.data.user_data.id.clone(), (node.x(), node.y()));
		});
		let minimap_radius: HashMap<&str, f64> =
			minimap.nodes.iter().map(|n| (n.id.as_str(), n.visual.size)).collect();

		let hovered = self.hover_id();
		self.graph.clear();
		self.index.clear();
		self.edges.clear();
		self.last_positions.clear();

		let fresh: Vec<&RenderNode> = set.nodes.iter().filter(|n| !previous.contains_key(&n.id)).collect();
		let center = Vec3::centroid(previous.values().map(|&(x, y)| Vec3::new(x as f64, y as f64, 0.0)))
			.unwrap_or(Vec3::ZERO);

		let mut placed_fresh = 0usize;
		for node in &set.nodes {
			let (x, y) = match previous.get(&node.id) {
				Some(&pos) => pos,
				None => {
					let angle = (placed_fresh as f64) * 2.0 * PI / fresh.len().max(1) as f64;
					placed_fresh += 1;
					(
						(center.x + 100.0 * angle.cos()) as f32,
						(center.y + 100.0 * angle.sin()) as f32,
					)
				}
			};
			let mini = minimap_radius.get(node.id.as_str()).copied().unwrap_or(1.0);
			let idx = self.graph.add_node(NodeData {
				x,
				y,
				mass: 10.0,
				is_anchor: node.pinned,
				user_data: NodeInfo::from_render(node, mini),
			});
			self.index.insert(node.id.clone(), idx);
		}

		for link in &set.links {
			if let (Some(&src), Some(&tgt)) = (self.index.get(&link.source), self.index.get(&link.target)) {
				self.graph.add_edge(
					src,
					tgt,
					EdgeData {
						user_data: LinkInfo {
							color: link.visual.color,
							width: link.visual.width,
							opacity: link.visual.opacity,
							highlighted: link.highlighted,
						},
					},
				);
				self.edges.push((src, tgt));
			}
		}

		if !fresh.is_empty() {
			debug!("{} new nodes, waiting for layout to settle", fresh.len());
			self.gate.reset_layout();
		}
		self.drag = DragState::default();
		self.hover = HoverState::default();
		if let Some(id) = hovered {
			let idx = self.index.get(&id).copied();
			self.set_hover(idx);
		}
	}

	fn hover_id(&self) -> Option<EntityId> {
		let idx = self.hover.node?;
		self.node_info(idx).map(|info| info.id.clone())
	}

	pub fn node_info(&self, idx: DefaultNodeIdx) -> Option<&NodeInfo> {
		self.graph.get_graph().node_weight(idx).map(|n| &n.data.user_data)
	}

	pub fn node_id(&self, idx: DefaultNodeIdx) -> Option<EntityId> {
		self.node_info(idx).map(|info| info.id.clone())
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<DefaultNodeIdx> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let mut found = None;
		self.graph.visit_nodes(|node| {
			let (dx, dy) = (node.x() as f64 - gx, node.y() as f64 - gy);
			let reach = HIT_RADIUS.max(node.data.user_data.radius);
			if (dx * dx + dy * dy).sqrt() < reach {
				found = Some(node.index());
			}
		});
		found
	}

	pub fn set_hover(&mut self, node: Option<DefaultNodeIdx>) {
		if self.hover.node == node {
			return;
		}
		let was_hovering = self.hover.node.is_some();

		// keep the old set around so it can fade out
		if was_hovering && node.is_none() {
			self.hover.prev_node = self.hover.node.take();
			self.hover.prev_neighbors = std::mem::take(&mut self.hover.neighbors);
		} else {
			self.hover.prev_node = None;
			self.hover.prev_neighbors.clear();
		}

		self.hover.node = node;
		self.hover.neighbors.clear();

		if let Some(idx) = node {
			if !was_hovering {
				self.hover.delay_t = 0.0;
			}
			for &(src, tgt) in &self.edges {
				if src == idx {
					self.hover.neighbors.insert(tgt);
				} else if tgt == idx {
					self.hover.neighbors.insert(src);
				}
			}
		}
	}

	pub fn is_hover_highlighted(&self, idx: DefaultNodeIdx) -> bool {
		self.hover.node == Some(idx)
			|| self.hover.neighbors.contains(&idx)
			|| self.hover.prev_node == Some(idx)
			|| self.hover.prev_neighbors.contains(&idx)
	}

	pub fn is_hovered(&self, idx: DefaultNodeIdx) -> bool {
		self.hover.node == Some(idx) || self.hover.prev_node == Some(idx)
	}

	pub fn has_hover(&self) -> bool {
		self.hover.node.is_some() || self.hover.prev_node.is_some()
	}

	// --- pointer ------------------------------------------------------------

	pub fn press(&mut self, x: f64, y: f64) {
		if let Some(idx) = self.node_at_position(x, y) {
			let mut start = (0.0, 0.0);
			self.graph.visit_nodes(|node| {
				if node.index() == idx {
					start = (node.x(), node.y());
				}
			});
			self.drag = DragState {
				active: true,
				moved: false,
				node_idx: Some(idx),
				start_x: x,
				start_y: y,
				node_start_x: start.0,
				node_start_y: start.1,
			};
		} else {
			self.pan = PanState {
				active: true,
				start_x: x,
				start_y: y,
				transform_start_x: self.transform.x,
				transform_start_y: self.transform.y,
			};
		}
	}

	pub fn pointer_move(&mut self, x: f64, y: f64) {
		if !self.drag.active {
			let hovered = self.node_at_position(x, y);
			self.set_hover(hovered);
		}

		if self.drag.active {
			let Some(idx) = self.drag.node_idx else {
				return;
			};
			if (x - self.drag.start_x).hypot(y - self.drag.start_y) > CLICK_SLOP {
				self.drag.moved = true;
			}
			if !self.drag.moved {
				return;
			}
			let (dx, dy) = (
				(x - self.drag.start_x) / self.transform.k,
				(y - self.drag.start_y) / self.transform.k,
			);
			let (nx, ny) = (self.drag.node_start_x + dx as f32, self.drag.node_start_y + dy as f32);
			self.graph.visit_nodes_mut(|node| {
				if node.index() == idx {
					node.data.x = nx;
					node.data.y = ny;
					node.data.is_anchor = true;
				}
			});
		} else if self.pan.active {
			self.transform.x = self.pan.transform_start_x + (x - self.pan.start_x);
			self.transform.y = self.pan.transform_start_y + (y - self.pan.start_y);
			self.camera_from_transform();
		}
	}

	/// End a press. A drag leaves the node anchored where it was dropped.
	pub fn release(&mut self) -> Release {
		let outcome = match (self.drag.active, self.drag.node_idx) {
			(true, Some(idx)) => match self.node_id(idx) {
				Some(id) if self.drag.moved => Release::Dropped(id),
				Some(id) => Release::Click(id),
				None => Release::Nothing,
			},
			_ => Release::Nothing,
		};
		self.drag = DragState::default();
		self.pan.active = false;
		outcome
	}

	pub fn leave(&mut self) {
		self.drag = DragState::default();
		self.pan.active = false;
		self.set_hover(None);
	}

	pub fn zoom_at(&mut self, x: f64, y: f64, zoom_in: bool) {
		let factor = if zoom_in { 1.1 } else { 0.9 };
		let new_k = (self.transform.k * factor).clamp(0.1, 10.0);
		let ratio = new_k / self.transform.k;
		self.transform.x = x - (x - self.transform.x) * ratio;
		self.transform.y = y - (y - self.transform.y) * ratio;
		self.transform.k = new_k;
		self.camera_from_transform();
	}

	// --- camera -------------------------------------------------------------

	/// Queue a focus that fires once the layout has settled.
	pub fn request_focus(&mut self, target: FocusTarget) {
		self.gate.request(target);
	}

	/// Project the animated camera pose onto the 2D transform.
	fn apply_camera(&mut self) {
		let pose = self.camera.pose();
		let k = pose.zoom(self.camera.config().default_distance).clamp(0.1, 10.0);
		self.transform.k = k;
		self.transform.x = self.width / 2.0 - pose.look_at.x * k;
		self.transform.y = self.height / 2.0 - pose.look_at.y * k;
	}

	/// User panned or zoomed: the camera jumps to match so later transitions
	/// start from what is on screen.
	fn camera_from_transform(&mut self) {
		let k = self.transform.k;
		let (cx, cy) = self.screen_to_graph(self.width / 2.0, self.height / 2.0);
		let distance = self.camera.config().default_distance / k;
		self.camera.snap_to(CameraPose::looking_at(Vec3::new(cx, cy, 0.0), distance));
	}

	fn settle_check(&mut self) {
		let mut motion = 0.0;
		let mut count = 0usize;
		let last = &mut self.last_positions;
		self.graph.visit_nodes(|node| {
			let now = (node.x(), node.y());
			if let Some(prev) = last.insert(node.index(), now) {
				motion += ((now.0 - prev.0).abs() + (now.1 - prev.1).abs()) as f64;
				count += 1;
			}
		});
		if count > 0 && motion / (count as f64) < SETTLE_MOTION {
			self.gate.mark_layout_ready();
		}
	}

	pub fn tick(&mut self, dt: f32) {
		self.graph.update(dt);
		self.flow_time += dt as f64;
		self.settle_check();

		if let Some(target) = self.gate.poll(dt as f64 * 1000.0) {
			self.focus(&target);
		}
		if self.camera.is_animating() {
			self.camera.tick(dt as f64 * 1000.0);
			self.apply_camera();
		}

		let (target, delay, speed) = if self.hover.node.is_some() {
			(1.0, 0.08, 1.8)
		} else {
			(0.0, 0.0, 1.26)
		};

		if self.hover.node.is_some() {
			self.hover.delay_t = (self.hover.delay_t + dt as f64).min(delay);
			if self.hover.delay_t >= delay {
				self.hover.highlight_t += (target - self.hover.highlight_t) * speed * dt as f64;
			}
		} else {
			self.hover.highlight_t += (target - self.hover.highlight_t) * speed * dt as f64;
			if self.hover.highlight_t < 0.01 {
				self.hover.highlight_t = 0.0;
				self.hover.prev_node = None;
				self.hover.prev_neighbors.clear();
			}
		}
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
		self.apply_camera();
	}

	/// World-space bounding box of all nodes: `(min_x, min_y, max_x, max_y)`.
	pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
		let mut bounds: Option<(f64, f64, f64, f64)> = None;
		self.graph.visit_nodes(|node| {
			let (x, y) = (node.x() as f64, node.y() as f64);
			bounds = Some(match bounds {
				None => (x, y, x, y),
				Some((a, b, c, d)) => (a.min(x), b.min(y), c.max(x), d.max(y)),
			});
		});
		bounds
	}
}

/// Live positions straight out of the simulation.
struct Layout<'a> {
	graph: &'a ForceGraph<NodeInfo, LinkInfo>,
	index: &'a HashMap<EntityId, DefaultNodeIdx>,
}

impl PositionSource for Layout<'_> {
	fn node_position(&self, id: &str) -> Option<Vec3> {
		let idx = *self.index.get(id)?;
		self.graph
			.get_graph()
			.node_weight(idx)
			.map(|n| Vec3::new(n.x() as f64, n.y() as f64, 0.0))
	}

	fn cluster_positions(&self, cluster_id: ClusterId) -> Vec<Vec3> {
		let mut out = Vec::new();
		self.graph.visit_nodes(|node| {
			if node.data.user_data.cluster_id == Some(cluster_id) {
				out.push(Vec3::new(node.x() as f64, node.y() as f64, 0.0));
			}
		});
		out
	}
}

impl CameraControl for ForceGraphState {
	fn focus_on_node(&mut self, id: &str) -> bool {
		let layout = Layout {
			graph: &self.graph,
			index: &self.index,
		};
		self.camera.focus_on_node(&layout, id)
	}

	fn focus_on_cluster(&mut self, cluster_id: ClusterId) -> bool {
		let layout = Layout {
			graph: &self.graph,
			index: &self.index,
		};
		self.camera.focus_on_cluster(&layout, cluster_id)
	}

	fn focus_on_gap(&mut self, gap: &StructuralGap) -> bool {
		let layout = Layout {
			graph: &self.graph,
			index: &self.index,
		};
		self.camera.focus_on_gap(&layout, gap)
	}

	fn reset_camera(&mut self) {
		self.camera.reset_camera();
	}

	fn camera(&self) -> CameraPose {
		self.camera.pose()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::EncodingConfig;
	use crate::engine::model::{Entity, EntityType, GraphSnapshot};
	use crate::engine::{InteractionState, RenderOptions, build_render_set};
	use pretty_assertions::assert_eq;

	fn state_with(ids: &[&str]) -> ForceGraphState {
		let snapshot = GraphSnapshot::new(
			ids.iter().map(|id| Entity::new(*id, *id, EntityType::Concept)).collect(),
			vec![],
			vec![],
			vec![],
			vec![],
		);
		let set = build_render_set(
			&snapshot,
			&InteractionState::new(),
			&EncodingConfig::default(),
			&RenderOptions::default(),
		);
		ForceGraphState::new(&set, &set, CameraConfig::default(), 800.0, 600.0)
	}

	#[test]
	fn still_layout_releases_a_pending_focus() {
		let mut state = state_with(&["a", "b"]);
		state.request_focus(FocusTarget::Home);
		state.settle_check();
		assert_eq!(state.gate.poll(0.0), None);

		state.settle_check();
		assert_eq!(state.gate.poll(0.0), Some(FocusTarget::Home));
	}

	#[test]
	fn moving_layout_keeps_the_focus_waiting() {
		let mut state = state_with(&["a"]);
		state.request_focus(FocusTarget::Home);
		state.settle_check();
		state.graph.visit_nodes_mut(|node| node.data.x += 10.0);
		state.settle_check();
		assert_eq!(state.gate.poll(0.0), None);
	}
}
