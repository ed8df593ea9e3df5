use crate::geo::Region;
use crate::models::{Coordinate, ScreenPoint};

use super::cluster::DisplayUnit;
use super::marker::AnnotationId;
use super::surface::{ListenerId, MapSurface, ProjectionError};

/// In-memory map surface for tests.
///
/// Projection is flat: one pixel per degree, longitude to the right and
/// latitude upwards. Latitudes beyond ±90 fail to project; coordinates listed
/// in `malformed` project to NaN.
#[derive(Debug)]
pub(crate) struct FakeSurface {
    pub ready: bool,
    pub annotations: Vec<AnnotationId>,
    pub selected: Option<AnnotationId>,
    pub listeners: Vec<ListenerId>,
    pub center: Option<Coordinate>,
    pub region: Option<Region>,
    pub malformed: Vec<Coordinate>,
    pub add_batches: usize,
    next_listener: u64,
}

impl FakeSurface {
    pub fn new() -> Self {
        Self {
            ready: true,
            annotations: Vec::new(),
            selected: None,
            listeners: Vec::new(),
            center: None,
            region: None,
            malformed: Vec::new(),
            add_batches: 0,
            next_listener: 0,
        }
    }

    /// Whether an annotation with this display form is on the surface.
    pub fn has(&self, id: &str) -> bool {
        self.annotations.iter().any(|a| a.to_string() == id)
    }
}

impl MapSurface for FakeSurface {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn project_to_screen(&self, coordinate: Coordinate) -> Result<ScreenPoint, ProjectionError> {
        if coordinate.latitude.abs() > 90.0 {
            return Err(ProjectionError::OutOfRange {
                latitude: coordinate.latitude,
                longitude: coordinate.longitude,
            });
        }
        if self.malformed.contains(&coordinate) {
            return Ok(ScreenPoint::new(f64::NAN, f64::NAN));
        }
        Ok(ScreenPoint::new(coordinate.longitude, -coordinate.latitude))
    }

    fn add_annotations(&mut self, units: &[DisplayUnit]) {
        self.add_batches += 1;
        for unit in units {
            assert!(
                !self.annotations.contains(unit.id()),
                "annotation {} added twice",
                unit.id()
            );
            self.annotations.push(unit.id().clone());
        }
    }

    fn remove_annotations(&mut self, ids: &[AnnotationId]) {
        self.annotations.retain(|a| !ids.contains(a));
        if self.selected.as_ref().is_some_and(|s| ids.contains(s)) {
            self.selected = None;
        }
    }

    fn selected_annotation(&self) -> Option<AnnotationId> {
        self.selected.clone()
    }

    fn set_selected_annotation(&mut self, id: Option<AnnotationId>) {
        self.selected = id;
    }

    fn add_click_listener(&mut self) -> ListenerId {
        self.next_listener += 1;
        let listener = ListenerId(self.next_listener);
        self.listeners.push(listener);
        listener
    }

    fn remove_click_listener(&mut self, listener: ListenerId) {
        self.listeners.retain(|l| *l != listener);
    }

    fn set_center_animated(&mut self, center: Coordinate) {
        self.center = Some(center);
    }

    fn animate_to_region(&mut self, region: Region) {
        self.region = Some(region);
    }
}
