use std::collections::VecDeque;

use finding_players_shared::geo::{Region, Viewport};
use finding_players_shared::models::{Coordinate, ScreenPoint};
use finding_players_shared::pins::{
    AnnotationId, DisplayUnit, ListenerId, MapEvent, MapPinManager, MapSurface, ProjectionError,
};

/// Upper bound on events handled per dispatch; guards against a feedback loop
/// between the manager and the surface.
const MAX_EVENTS_PER_DISPATCH: usize = 32;

/// How a pin is drawn.
#[derive(Debug, Clone, PartialEq)]
pub enum PinKind {
    Community,
    Pending,
    Cluster { count: usize },
}

/// An annotation resolved to container pixels, ready for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct PinView {
    pub id: AnnotationId,
    /// Render key, unique across markers and clusters.
    pub key: String,
    pub point: ScreenPoint,
    pub kind: PinKind,
    pub title: String,
    pub glyph: String,
    pub priority: u32,
    pub selected: bool,
}

/// Map surface backed by a Web-Mercator viewport. Annotations are kept in
/// the order they were added; user interaction is queued as [`MapEvent`]s
/// and fed back to the pin manager with [`dispatch_events`].
#[derive(Debug)]
pub struct ViewportSurface {
    viewport: Viewport,
    annotations: Vec<DisplayUnit>,
    selected: Option<AnnotationId>,
    /// Selection lost because its annotation was removed. Reported as a
    /// closed callout unless the same annotation is selected again first.
    dropped: Option<AnnotationId>,
    listeners: Vec<ListenerId>,
    next_listener: u64,
    events: VecDeque<MapEvent>,
}

impl ViewportSurface {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            annotations: Vec::new(),
            selected: None,
            dropped: None,
            listeners: Vec::new(),
            next_listener: 0,
            events: VecDeque::new(),
        }
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn annotation(&self, id: &AnnotationId) -> Option<&DisplayUnit> {
        self.annotations.iter().find(|u| u.id() == id)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    // -----------------------------------------------------------------------
    // User interaction
    // -----------------------------------------------------------------------

    /// The user clicked a pin.
    pub fn click_annotation(&mut self, id: &AnnotationId) {
        if self.annotation(id).is_none() {
            return;
        }
        if let Some(previous) = self.selected.replace(id.clone()) {
            if &previous == id {
                return;
            }
            self.events.push_back(MapEvent::Deselect(previous));
            self.events.push_back(MapEvent::CalloutClosed);
        }
        self.events.push_back(MapEvent::Select(id.clone()));
    }

    /// The user clicked the map itself, away from any pin.
    pub fn click_background(&mut self) {
        for listener in &self.listeners {
            self.events.push_back(MapEvent::BackgroundClick(*listener));
        }
    }

    /// The user dismissed the open callout.
    pub fn close_callout(&mut self) {
        if let Some(previous) = self.selected.take() {
            self.events.push_back(MapEvent::Deselect(previous));
            self.events.push_back(MapEvent::CalloutClosed);
        }
    }

    pub fn next_event(&mut self) -> Option<MapEvent> {
        if let Some(event) = self.events.pop_front() {
            return Some(event);
        }
        self.dropped.take().map(|_| MapEvent::CalloutClosed)
    }

    // -----------------------------------------------------------------------
    // Rendering
    // -----------------------------------------------------------------------

    /// Every annotation that projects inside (or near) the container, lowest
    /// display priority first so clusters paint on top.
    pub fn pins(&self) -> Vec<PinView> {
        let margin = 64.0;
        let (width, height) = (self.viewport.width, self.viewport.height);

        let mut pins: Vec<PinView> = self
            .annotations
            .iter()
            .filter_map(|unit| {
                let point = self.viewport.project(unit.coordinate())?;
                let visible = point.x >= -margin
                    && point.y >= -margin
                    && point.x <= width + margin
                    && point.y <= height + margin;
                visible.then(|| self.pin_view(unit, point))
            })
            .collect();
        pins.sort_by_key(|p| p.priority);
        pins
    }

    fn pin_view(&self, unit: &DisplayUnit, point: ScreenPoint) -> PinView {
        let (kind, title, glyph) = match unit {
            DisplayUnit::Cluster(cluster) => (
                PinKind::Cluster {
                    count: cluster.members.len(),
                },
                format!("{} Locations", cluster.members.len()),
                cluster.label(),
            ),
            DisplayUnit::Marker(marker) if marker.temporary => (
                PinKind::Pending,
                marker.display_title().to_string(),
                "+".to_string(),
            ),
            DisplayUnit::Marker(marker) => (
                PinKind::Community,
                marker.display_title().to_string(),
                initial(marker.display_title()),
            ),
        };
        PinView {
            id: unit.id().clone(),
            key: unit.id().render_key(),
            point,
            kind,
            title,
            glyph,
            priority: unit.display_priority(),
            selected: self.selected.as_ref() == Some(unit.id()),
        }
    }

}

fn initial(title: &str) -> String {
    title
        .chars()
        .find(|c| c.is_alphanumeric())
        .map(|c| c.to_uppercase().collect())
        .unwrap_or_default()
}

impl MapSurface for ViewportSurface {
    fn is_ready(&self) -> bool {
        self.viewport.has_area()
    }

    fn project_to_screen(&self, coordinate: Coordinate) -> Result<ScreenPoint, ProjectionError> {
        if !self.viewport.has_area() {
            return Err(ProjectionError::NoViewport);
        }
        self.viewport
            .project(coordinate)
            .ok_or(ProjectionError::OutOfRange {
                latitude: coordinate.latitude,
                longitude: coordinate.longitude,
            })
    }

    fn add_annotations(&mut self, units: &[DisplayUnit]) {
        for unit in units {
            match self.annotations.iter_mut().find(|u| u.id() == unit.id()) {
                Some(existing) => *existing = unit.clone(),
                None => self.annotations.push(unit.clone()),
            }
        }
    }

    fn remove_annotations(&mut self, ids: &[AnnotationId]) {
        self.annotations.retain(|u| !ids.contains(u.id()));
        if self.selected.as_ref().is_some_and(|s| ids.contains(s)) {
            self.dropped = self.selected.take();
        }
    }

    fn selected_annotation(&self) -> Option<AnnotationId> {
        self.selected.clone()
    }

    /// Switching to another annotation swaps the callout; only clearing the
    /// selection reports [`MapEvent::CalloutClosed`].
    fn set_selected_annotation(&mut self, id: Option<AnnotationId>) {
        match id {
            Some(id) => {
                if self.dropped.as_ref() == Some(&id) {
                    self.dropped = None;
                }
                self.selected = Some(id);
            }
            None => {
                if self.selected.take().is_some() {
                    self.events.push_back(MapEvent::CalloutClosed);
                }
            }
        }
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
        self.viewport.set_center(center);
    }

    fn animate_to_region(&mut self, region: Region) {
        self.viewport.fit_region(region);
    }
}

/// Feed queued surface events to the manager until the queue is empty.
/// Returns the number of events handled.
pub fn dispatch_events(manager: &mut MapPinManager<ViewportSurface>) -> usize {
    let mut handled = 0;
    while handled < MAX_EVENTS_PER_DISPATCH {
        let Some(event) = manager.surface_mut().next_event() else {
            break;
        };
        manager.handle_event(event);
        handled += 1;
    }
    if handled == MAX_EVENTS_PER_DISPATCH {
        tracing::warn!(handled, "event dispatch limit reached");
    }
    handled
}
