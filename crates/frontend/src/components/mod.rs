pub mod callout;
pub mod cluster_panel;
pub mod community_panel;
pub mod map_view;
