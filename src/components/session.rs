use std::sync::Arc;

use leptos::prelude::*;

use super::force_graph::FocusRequest;
use crate::api::ApiClient;
use crate::engine::{FocusTarget, GraphSnapshot, InteractionState, TemporalFilter};

/// Reactive handles of one graph session, shared by the panels of a project
/// page. Owned by exactly one page; never shared between two mounted graphs.
#[derive(Clone, Copy)]
pub struct GraphSession {
	pub project_id: Signal<String>,
	pub snapshot: Signal<Option<Arc<GraphSnapshot>>>,
	pub interaction: RwSignal<InteractionState>,
	pub temporal: RwSignal<TemporalFilter>,
	pub focus: RwSignal<Option<FocusRequest>>,
	pub api_base: StoredValue<String>,
}

impl GraphSession {
	pub fn client(&self) -> ApiClient {
		ApiClient::new(&self.api_base.read_value())
	}

	/// Ask the mounted canvas to frame `target` once its layout has settled.
	pub fn request_focus(&self, target: FocusTarget) {
		self.focus.update(|f| *f = Some(FocusRequest::next(f.as_ref(), target)));
	}

	/// Run `f` against the current snapshot without subscribing to it.
	pub fn with_snapshot<R>(&self, f: impl FnOnce(&GraphSnapshot) -> R) -> Option<R> {
		self.snapshot.with_untracked(|s| s.as_deref().map(f))
	}
}
