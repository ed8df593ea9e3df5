use crate::geo::Region;
use crate::models::{Coordinate, ScreenPoint};

use super::cluster::DisplayUnit;
use super::marker::AnnotationId;

/// Token for a click listener registered on a map surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProjectionError {
    #[error("coordinate ({latitude}, {longitude}) cannot be projected")]
    OutOfRange { latitude: f64, longitude: f64 },
    #[error("map surface has no viewport to project into")]
    NoViewport,
}

/// Events a map surface reports back to the pin manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapEvent {
    /// The user selected an annotation.
    Select(AnnotationId),
    /// The surface deselected an annotation on its own (e.g. callout close button).
    Deselect(AnnotationId),
    /// The map background was clicked; carries the listener it was reported to.
    BackgroundClick(ListenerId),
    /// The previously open callout has fully closed.
    CalloutClosed,
}

/// Everything the pin manager needs from a map implementation.
///
/// The manager is the only writer of the annotation collection while it is
/// active. Implementations own the actual drawing and callout display.
pub trait MapSurface {
    /// Whether the surface can host annotations yet.
    fn is_ready(&self) -> bool {
        true
    }

    /// Screen position of a coordinate under the current viewport.
    fn project_to_screen(&self, coordinate: Coordinate) -> Result<ScreenPoint, ProjectionError>;

    fn add_annotations(&mut self, units: &[DisplayUnit]);

    fn remove_annotations(&mut self, ids: &[AnnotationId]);

    fn selected_annotation(&self) -> Option<AnnotationId>;

    fn set_selected_annotation(&mut self, id: Option<AnnotationId>);

    fn add_click_listener(&mut self) -> ListenerId;

    fn remove_click_listener(&mut self, listener: ListenerId);

    fn set_center_animated(&mut self, center: Coordinate);

    fn animate_to_region(&mut self, region: Region);
}
