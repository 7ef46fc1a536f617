//! Step-by-step path playback over the interaction state.
//!
//! Auto-advance is a fixed-delay timer chain. Each scheduled advance carries
//! an [`AdvanceToken`]; any manual jump or stop bumps the generation, so a
//! timer that fires afterwards is ignored.

use std::collections::HashSet;
use std::time::Duration;

use log::debug;

use crate::config::PlaybackConfig;

use super::interaction::{HighlightSource, InteractionState};
use super::model::{Edge, EdgeId, EntityId};

/// One frame of the playback.
#[derive(Clone, Debug, PartialEq)]
pub struct PathStep {
	/// Nodes shown at this step.
	pub node_ids: Vec<EntityId>,
	/// Edges shown at this step.
	pub edge_ids: Vec<EdgeId>,
}

/// Ticket for a pending auto-advance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AdvanceToken {
	generation: u64,
}

/// Step-by-step reveal of a node path.
#[derive(Clone, Debug)]
pub struct PathPlayback {
	steps: Vec<PathStep>,
	current: Option<usize>,
	generation: u64,
	playing: bool,
	step_delay: Duration,
}

impl PathPlayback {
	/// Stopped playback over `steps`.
	pub fn new(steps: Vec<PathStep>, config: &PlaybackConfig) -> Self {
		Self {
			steps,
			current: None,
			generation: 0,
			playing: false,
			step_delay: Duration::from_millis(config.step_delay_ms),
		}
	}

	/// Cumulative steps along a node path: step `i` shows the first `i + 1`
	/// nodes and the edges joining consecutive ones.
	pub fn along(path: &[EntityId], edges: &[Edge], config: &PlaybackConfig) -> Self {
		let mut steps = Vec::with_capacity(path.len());
		let mut edge_ids = Vec::new();
		for (i, node) in path.iter().enumerate() {
			if i > 0 {
				let prev = &path[i - 1];
				if let Some(edge) = edges.iter().find(|e| {
					(&e.source == prev && &e.target == node) || (&e.source == node && &e.target == prev)
				}) {
					edge_ids.push(edge.id.clone());
				}
			}
			steps.push(PathStep {
				node_ids: path[..=i].to_vec(),
				edge_ids: edge_ids.clone(),
			});
		}
		Self::new(steps, config)
	}

	/// All steps in order.
	pub fn steps(&self) -> &[PathStep] {
		&self.steps
	}

	/// Number of steps.
	pub fn len(&self) -> usize {
		self.steps.len()
	}

	/// Whether there are no steps.
	pub fn is_empty(&self) -> bool {
		self.steps.is_empty()
	}

	/// Index of the step on screen.
	pub fn current(&self) -> Option<usize> {
		self.current
	}

	/// Whether auto-advance is running.
	pub fn is_playing(&self) -> bool {
		self.playing
	}

	/// Delay between automatic steps.
	pub fn step_delay(&self) -> Duration {
		self.step_delay
	}

	fn show(&mut self, index: usize, state: &mut InteractionState) {
		let step = &self.steps[index];
		self.current = Some(index);
		state.highlight_path(
			step.node_ids.iter().cloned().collect::<HashSet<_>>(),
			step.edge_ids.iter().cloned().collect(),
		);
	}

	fn schedule_next(&mut self) -> Option<AdvanceToken> {
		let next = self.current.map_or(0, |c| c + 1);
		if next >= self.steps.len() {
			self.playing = false;
			return None;
		}
		Some(AdvanceToken {
			generation: self.generation,
		})
	}

	/// Start from the first step. Returns the token of the first advance.
	pub fn play(&mut self, state: &mut InteractionState) -> Option<AdvanceToken> {
		if self.steps.is_empty() {
			return None;
		}
		self.generation += 1;
		self.playing = true;
		self.show(0, state);
		self.schedule_next()
	}

	/// Timer fired. Stale tokens do nothing.
	pub fn on_timer(&mut self, token: AdvanceToken, state: &mut InteractionState) -> Option<AdvanceToken> {
		if !self.playing || token.generation != self.generation {
			debug!("ignoring stale playback timer");
			return None;
		}
		// another trigger took the highlight; the path must not win it back
		if state.highlight_source() != &HighlightSource::Path {
			debug!("highlight taken over, stopping playback");
			self.generation += 1;
			self.playing = false;
			return None;
		}
		let next = self.current.map_or(0, |c| c + 1);
		if next >= self.steps.len() {
			self.playing = false;
			return None;
		}
		self.show(next, state);
		self.schedule_next()
	}

	/// Manual step selection; cancels any pending auto-advance.
	pub fn jump_to(&mut self, index: usize, state: &mut InteractionState) {
		if index >= self.steps.len() {
			return;
		}
		self.generation += 1;
		self.playing = false;
		self.show(index, state);
	}

	/// Stop and remove the path overlay, unless another trigger owns the
	/// highlight by now.
	pub fn stop(&mut self, state: &mut InteractionState) {
		self.generation += 1;
		self.playing = false;
		self.current = None;
		state.clear_highlights_from(&HighlightSource::Path);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::engine::model::{RelationshipType, StructuralGap};
	use pretty_assertions::assert_eq;

	fn playback() -> PathPlayback {
		let path: Vec<EntityId> = ["a", "b", "c"].map(String::from).to_vec();
		let edges = vec![
			Edge::new("ab", "a", "b", RelationshipType::RelatedTo),
			Edge::new("cb", "c", "b", RelationshipType::RelatedTo),
		];
		PathPlayback::along(&path, &edges, &PlaybackConfig::default())
	}

	fn highlighted(state: &InteractionState) -> Vec<String> {
		let mut v: Vec<String> = state.highlighted_node_ids().iter().cloned().collect();
		v.sort();
		v
	}

	#[test]
	fn steps_accumulate_nodes_and_edges() {
		let p = playback();
		assert_eq!(p.len(), 3);
		assert_eq!(p.steps[2].edge_ids, vec!["ab".to_string(), "cb".to_string()]);
	}

	#[test]
	fn timer_chain_walks_to_the_end() {
		let mut p = playback();
		let mut state = InteractionState::new();
		let t1 = p.play(&mut state).unwrap();
		assert_eq!(highlighted(&state), vec!["a"]);
		let t2 = p.on_timer(t1, &mut state).unwrap();
		assert_eq!(highlighted(&state), vec!["a", "b"]);
		assert_eq!(p.on_timer(t2, &mut state), None);
		assert_eq!(highlighted(&state), vec!["a", "b", "c"]);
		assert!(!p.is_playing());
	}

	#[test]
	fn manual_jump_cancels_pending_advance() {
		let mut p = playback();
		let mut state = InteractionState::new();
		let pending = p.play(&mut state).unwrap();
		p.jump_to(2, &mut state);
		assert_eq!(p.on_timer(pending, &mut state), None);
		assert_eq!(p.current(), Some(2));
		assert_eq!(highlighted(&state).len(), 3);
	}

	#[test]
	fn stop_does_not_clear_a_newer_gap_highlight() {
		let mut p = playback();
		let mut state = InteractionState::new();
		p.play(&mut state);
		let gap = StructuralGap {
			id: "g".into(),
			cluster_a_id: 1,
			cluster_b_id: 2,
			cluster_a_concepts: vec!["x".into()],
			cluster_b_concepts: vec!["y".into()],
			bridge_candidates: vec![],
			gap_strength: 0.1,
			research_questions: vec![],
			potential_edges: None,
		};
		state.select_gap(Some(&gap), &[]);
		p.stop(&mut state);
		assert_eq!(highlighted(&state), vec!["x", "y"]);

		p.play(&mut state);
		p.stop(&mut state);
		assert!(!state.has_highlight());
	}

	#[test]
	fn pending_advance_yields_to_a_newer_gap_selection() {
		let mut p = playback();
		let mut state = InteractionState::new();
		let pending = p.play(&mut state).unwrap();
		let gap = StructuralGap {
			id: "g".into(),
			cluster_a_id: 1,
			cluster_b_id: 2,
			cluster_a_concepts: vec!["x".into()],
			cluster_b_concepts: vec!["y".into()],
			bridge_candidates: vec![],
			gap_strength: 0.1,
			research_questions: vec![],
			potential_edges: None,
		};
		state.select_gap(Some(&gap), &[]);

		assert_eq!(p.on_timer(pending, &mut state), None);
		assert_eq!(state.highlight_source(), &HighlightSource::Gap("g".into()));
		assert_eq!(state.selected_gap_id(), Some(&"g".to_string()));
		assert_eq!(highlighted(&state), vec!["x", "y"]);
		assert!(!p.is_playing());
	}

	#[test]
	fn empty_playback_never_schedules() {
		let mut p = PathPlayback::new(vec![], &PlaybackConfig::default());
		let mut state = InteractionState::new();
		assert_eq!(p.play(&mut state), None);
		assert!(p.is_empty());
	}
}
