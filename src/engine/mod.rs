//! Renderer-agnostic graph visualization and interaction engine.
//!
//! Views never reimplement color, size or centroid math; they build a
//! [`RenderSet`] from the snapshot and the [`InteractionState`] and map it
//! onto their own drawing primitives.

/// Snapshot plus interaction state to drawable nodes and links.
pub mod adapter;
/// Citation-network build polling.
pub mod build;
/// Camera poses, focus targets and transitions.
pub mod camera;
/// Set comparisons between clusters and graphs.
pub mod compare;
/// Color, size and opacity of nodes and links.
pub mod encoding;
/// Highlight, slice and pin state.
pub mod interaction;
/// Snapshot data model.
pub mod model;
/// Path playback.
pub mod playback;
/// Year filtering.
pub mod temporal;

pub use adapter::{RenderLink, RenderNode, RenderOptions, RenderSet, build_render_set};
pub use build::{BuildPoller, BuildState, BuildStatus, PollDecision, PollerPhase};
pub use camera::{CameraControl, CameraPose, Choreographer, FocusGate, FocusTarget, PositionSource, Vec3};
pub use compare::{ClusterComparison, ComparisonData, compare_clusters, compare_graphs};
pub use encoding::{EncodingContext, NodeVisual, SizeScale};
pub use interaction::{HighlightSource, InteractionState, SliceConfig, SliceMetric, rank_by_metric};
pub use model::{
	CentralityMetric, Cluster, ClusterId, Edge, Entity, EntityId, EntityType, GraphSnapshot, RelationshipType,
	StructuralGap,
};
pub use playback::{PathPlayback, PathStep};
pub use temporal::{TemporalFilter, YearRange};
