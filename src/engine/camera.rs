//! Camera choreography: look-at targets from live node positions and eased
//! transitions between poses.
//!
//! Positions come from whatever physics engine drives the view, read through
//! [`PositionSource`] at call time. A focus on a layout that is still
//! converging simply re-centers when called again.

use std::ops::{Add, Mul, Sub};

use log::debug;

use crate::config::CameraConfig;

use super::model::{ClusterId, EntityId, StructuralGap};

/// Point or offset in scene space. 2D views use `z = 0`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec3 {
	/// Horizontal coordinate.
	pub x: f64,
	/// Vertical coordinate.
	pub y: f64,
	/// Depth; 0 in 2D views.
	pub z: f64,
}

impl Vec3 {
	/// Origin.
	pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

	/// Point from its coordinates.
	pub const fn new(x: f64, y: f64, z: f64) -> Self {
		Self { x, y, z }
	}

	/// Euclidean length.
	pub fn length(self) -> f64 {
		(self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
	}

	/// Linear interpolation, `t` in `[0, 1]`.
	pub fn lerp(self, other: Self, t: f64) -> Self {
		self + (other - self) * t
	}

	/// Arithmetic mean, `None` for an empty input.
	pub fn centroid(points: impl IntoIterator<Item = Vec3>) -> Option<Vec3> {
		let (sum, n) = points
			.into_iter()
			.fold((Vec3::ZERO, 0usize), |(sum, n), p| (sum + p, n + 1));
		let n = n as f64;
		(n > 0.0).then(|| Vec3::new(sum.x / n, sum.y / n, sum.z / n))
	}
}

impl Add for Vec3 {
	type Output = Self;
	fn add(self, o: Self) -> Self {
		Self::new(self.x + o.x, self.y + o.y, self.z + o.z)
	}
}

impl Sub for Vec3 {
	type Output = Self;
	fn sub(self, o: Self) -> Self {
		Self::new(self.x - o.x, self.y - o.y, self.z - o.z)
	}
}

impl Mul<f64> for Vec3 {
	type Output = Self;
	fn mul(self, k: f64) -> Self {
		Self::new(self.x * k, self.y * k, self.z * k)
	}
}

/// Where the camera is and what it looks at.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraPose {
	/// Camera position.
	pub eye: Vec3,
	/// Point the camera faces.
	pub look_at: Vec3,
}

impl CameraPose {
	/// Eye placed `distance` units along +Z from the target.
	pub fn looking_at(target: Vec3, distance: f64) -> Self {
		Self {
			eye: target + Vec3::new(0.0, 0.0, distance),
			look_at: target,
		}
	}

	/// Eye to look-at distance.
	pub fn distance(&self) -> f64 {
		(self.eye - self.look_at).length()
	}

	/// Zoom factor for orthographic 2D views, relative to `home_distance`.
	pub fn zoom(&self, home_distance: f64) -> f64 {
		let d = self.distance();
		if d <= f64::EPSILON { 1.0 } else { home_distance / d }
	}

	fn lerp(&self, other: &Self, t: f64) -> Self {
		Self {
			eye: self.eye.lerp(other.eye, t),
			look_at: self.look_at.lerp(other.look_at, t),
		}
	}
}

/// Cubic ease-out, `t` in `[0, 1]`.
pub fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

/// Cubic ease-in-out, `t` in `[0, 1]`. Continuous with zero slope at both ends.
pub fn ease_in_out_cubic(t: f64) -> f64 {
	let t = t.clamp(0.0, 1.0);
	if t < 0.5 {
		4.0 * t * t * t
	} else {
		1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
	}
}

#[derive(Clone, Debug, PartialEq)]
struct Transition {
	from: CameraPose,
	to: CameraPose,
	duration_ms: f64,
	elapsed_ms: f64,
}

impl Transition {
	fn progress(&self) -> f64 {
		if self.duration_ms <= 0.0 {
			1.0
		} else {
			(self.elapsed_ms / self.duration_ms).clamp(0.0, 1.0)
		}
	}

	fn sample(&self) -> CameraPose {
		self.from.lerp(&self.to, ease_in_out_cubic(self.progress()))
	}
}

/// Live node positions as seen by a renderer.
pub trait PositionSource {
	/// Current position of a node, `None` if it is not laid out (yet).
	fn node_position(&self, id: &str) -> Option<Vec3>;

	/// Current positions of every laid-out node in a cluster.
	fn cluster_positions(&self, cluster_id: ClusterId) -> Vec<Vec3>;
}

/// What a focus request should frame.
#[derive(Clone, Debug, PartialEq)]
pub enum FocusTarget {
	/// One node.
	Node(EntityId),
	/// Centroid of a cluster.
	Cluster(ClusterId),
	/// Midpoint between both sides of a gap.
	Gap(StructuralGap),
	/// Default overview pose.
	Home,
}

/// Capability surface every mounted renderer exposes to call sites.
pub trait CameraControl {
	/// Frame one node. Returns whether the camera moved.
	fn focus_on_node(&mut self, id: &str) -> bool;
	/// Frame a cluster centroid.
	fn focus_on_cluster(&mut self, cluster_id: ClusterId) -> bool;
	/// Frame both sides of a gap.
	fn focus_on_gap(&mut self, gap: &StructuralGap) -> bool;
	/// Return to the overview pose.
	fn reset_camera(&mut self);
	/// Pose currently on screen.
	fn camera(&self) -> CameraPose;

	/// Dispatch a [`FocusTarget`]. Returns whether the camera moved.
	fn focus(&mut self, target: &FocusTarget) -> bool {
		match target {
			FocusTarget::Node(id) => self.focus_on_node(id),
			FocusTarget::Cluster(c) => self.focus_on_cluster(*c),
			FocusTarget::Gap(gap) => self.focus_on_gap(gap),
			FocusTarget::Home => {
				self.reset_camera();
				true
			}
		}
	}
}

/// Computes targets and animates the camera toward them.
#[derive(Clone, Debug)]
pub struct Choreographer {
	config: CameraConfig,
	current: CameraPose,
	transition: Option<Transition>,
}

impl Choreographer {
	/// Starts at the overview pose.
	pub fn new(config: CameraConfig) -> Self {
		let current = CameraPose::looking_at(Vec3::ZERO, config.default_distance);
		Self {
			config,
			current,
			transition: None,
		}
	}

	/// Animated pose for this frame.
	pub fn pose(&self) -> CameraPose {
		self.current
	}

	/// Pose the camera is heading to.
	pub fn target(&self) -> CameraPose {
		self.transition.as_ref().map(|t| t.to).unwrap_or(self.current)
	}

	/// Whether a transition is in flight.
	pub fn is_animating(&self) -> bool {
		self.transition.is_some()
	}

	/// Camera constants.
	pub fn config(&self) -> &CameraConfig {
		&self.config
	}

	/// Advance the running transition.
	pub fn tick(&mut self, dt_ms: f64) {
		let Some(transition) = self.transition.as_mut() else {
			return;
		};
		transition.elapsed_ms += dt_ms.max(0.0);
		self.current = transition.sample();
		if transition.progress() >= 1.0 {
			self.current = transition.to;
			self.transition = None;
		}
	}

	/// Start an eased transition from wherever the camera is right now.
	pub fn fly_to(&mut self, to: CameraPose) {
		self.transition = Some(Transition {
			from: self.current,
			to,
			duration_ms: f64::from(self.config.transition_ms),
			elapsed_ms: 0.0,
		});
	}

	/// Jump without animation.
	pub fn snap_to(&mut self, pose: CameraPose) {
		self.current = pose;
		self.transition = None;
	}

	/// Fly to a node. Unknown ids leave the camera alone.
	pub fn focus_on_node(&mut self, positions: &dyn PositionSource, id: &str) -> bool {
		let Some(target) = positions.node_position(id) else {
			debug!("focus on {id}: no position yet");
			return false;
		};
		self.fly_to(CameraPose::looking_at(target, self.config.node_distance));
		true
	}

	/// No-op when no member of the cluster has a position.
	pub fn focus_on_cluster(&mut self, positions: &dyn PositionSource, cluster_id: ClusterId) -> bool {
		let Some(center) = Vec3::centroid(positions.cluster_positions(cluster_id)) else {
			debug!("focus on cluster {cluster_id}: no resolved positions");
			return false;
		};
		self.fly_to(CameraPose::looking_at(center, self.config.cluster_distance));
		true
	}

	/// Frames both sides of a gap. Bridge candidates are left out of the
	/// centroid so an outlying bridge cannot drag the camera off-center.
	pub fn focus_on_gap(&mut self, positions: &dyn PositionSource, gap: &StructuralGap) -> bool {
		let points = gap
			.cluster_a_concepts
			.iter()
			.chain(&gap.cluster_b_concepts)
			.collect::<std::collections::HashSet<_>>()
			.into_iter()
			.filter_map(|id| positions.node_position(id));
		let Some(center) = Vec3::centroid(points) else {
			debug!("focus on gap {}: no resolved positions", gap.id);
			return false;
		};
		self.fly_to(CameraPose::looking_at(center, self.config.gap_distance));
		true
	}

	/// Fly back to the overview pose.
	pub fn reset_camera(&mut self) {
		self.fly_to(CameraPose::looking_at(Vec3::ZERO, self.config.default_distance));
	}

	/// Dispatch a [`FocusTarget`].
	pub fn focus(&mut self, positions: &dyn PositionSource, target: &FocusTarget) -> bool {
		match target {
			FocusTarget::Node(id) => self.focus_on_node(positions, id),
			FocusTarget::Cluster(c) => self.focus_on_cluster(positions, *c),
			FocusTarget::Gap(gap) => self.focus_on_gap(positions, gap),
			FocusTarget::Home => {
				self.reset_camera();
				true
			}
		}
	}
}

/// Holds back a focus request until the nodes it needs exist.
///
/// Fires on an explicit layout-ready signal, or once `settle_delay_ms` of
/// ticks have passed, whichever comes first. A newer request replaces an
/// older pending one.
#[derive(Clone, Debug)]
pub struct FocusGate {
	pending: Option<FocusTarget>,
	waited_ms: f64,
	settle_delay_ms: f64,
	layout_ready: bool,
}

impl FocusGate {
	/// Gate that opens after `settle_delay_ms` at the latest.
	pub fn new(settle_delay_ms: u32) -> Self {
		Self {
			pending: None,
			waited_ms: 0.0,
			settle_delay_ms: f64::from(settle_delay_ms),
			layout_ready: false,
		}
	}

	/// Queue `target`, replacing any pending request.
	pub fn request(&mut self, target: FocusTarget) {
		self.pending = Some(target);
		self.waited_ms = 0.0;
	}

	/// Drop the pending request.
	pub fn cancel(&mut self) {
		self.pending = None;
	}

	/// Whether a request waits for the layout.
	pub fn is_pending(&self) -> bool {
		self.pending.is_some()
	}

	/// The layout has settled; a pending focus may fire.
	pub fn mark_layout_ready(&mut self) {
		self.layout_ready = true;
	}

	/// New data arrived; nodes have to be laid out again.
	pub fn reset_layout(&mut self) {
		self.layout_ready = false;
		self.waited_ms = 0.0;
	}

	/// Advance time and hand back the request if it may fire now.
	pub fn poll(&mut self, dt_ms: f64) -> Option<FocusTarget> {
		self.pending.as_ref()?;
		self.waited_ms += dt_ms.max(0.0);
		if self.layout_ready || self.waited_ms >= self.settle_delay_ms {
			return self.pending.take();
		}
		None
	}
}
