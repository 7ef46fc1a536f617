use crate::engine::camera::FocusTarget;
use crate::engine::model::EntityId;

/// A focus the canvas should perform once its layout allows it.
///
/// `seq` makes two requests for the same target distinguishable, so asking
/// twice re-centers twice.
#[derive(Clone, Debug, PartialEq)]
pub struct FocusRequest {
	pub seq: u64,
	pub target: FocusTarget,
}

impl FocusRequest {
	pub fn next(previous: Option<&FocusRequest>, target: FocusTarget) -> Self {
		Self {
			seq: previous.map_or(0, |p| p.seq + 1),
			target,
		}
	}
}

/// Pointer gestures the canvas reports to its owner.
#[derive(Clone, Debug, PartialEq)]
pub enum CanvasEvent {
	NodeClicked(EntityId),
	/// A node was dragged and dropped; it stays where it was put.
	NodePinned(EntityId),
	NodeUnpinned(EntityId),
}
