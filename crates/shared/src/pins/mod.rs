//! Map pin management: screen-space clustering of markers and a single open
//! callout across plain markers and clusters.
//!
//! The manager talks to the map only through [`MapSurface`], so it carries no
//! dependency on a particular mapping SDK.

mod cluster;
mod manager;
mod marker;
mod surface;

#[cfg(test)]
mod testing;

pub use cluster::{
    centroid, group_by_proximity, units_from_groups, Cluster, DisplayUnit,
    CLUSTER_DISPLAY_PRIORITY, MARKER_DISPLAY_PRIORITY,
};
pub use manager::{
    ActionOutcome, ClusterCallback, ClusterSelection, MapPinManager, PinError, PinManagerOptions,
    RevealTicket,
    DEFAULT_CLUSTERING_DISTANCE_PX, DEFAULT_MIN_SPAN_DEGREES, DEFAULT_REVEAL_DELAY_MS,
    DEFAULT_ZOOM_PADDING,
};
pub use marker::{AnnotationId, CalloutAction, CalloutContent, CalloutEntry, CalloutFn, Marker};
pub use surface::{ListenerId, MapEvent, MapSurface, ProjectionError};
