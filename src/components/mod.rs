pub mod build_panel;
pub mod cluster_panel;
pub mod force_graph;
pub mod gap_panel;
pub mod playback_controls;
pub mod session;
pub mod slice_controls;
pub mod temporal_slider;
