use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::geo::Region;
use crate::models::Coordinate;

use super::cluster::{group_by_proximity, units_from_groups, DisplayUnit};
use super::marker::{AnnotationId, CalloutAction, CalloutContent, Marker};
use super::surface::{ListenerId, MapEvent, MapSurface};

pub const DEFAULT_CLUSTERING_DISTANCE_PX: f64 = 40.0;
pub const DEFAULT_REVEAL_DELAY_MS: u64 = 150;
pub const DEFAULT_ZOOM_PADDING: f64 = 0.2;
pub const DEFAULT_MIN_SPAN_DEGREES: f64 = 0.005;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PinManagerOptions {
    /// Markers closer than this on screen share a cluster. Zero, negative or
    /// non-finite values disable clustering.
    pub clustering_distance_px: f64,
    /// How long to wait after closing a cluster callout before opening a
    /// member's own callout, when the surface gives no close signal.
    pub reveal_delay_ms: u64,
    /// Extra extent added around a cluster when zooming to it (0.2 = 20%).
    pub zoom_padding: f64,
    /// Smallest span, in degrees, a cluster zoom will produce.
    pub min_span_degrees: f64,
}

impl Default for PinManagerOptions {
    fn default() -> Self {
        Self {
            clustering_distance_px: DEFAULT_CLUSTERING_DISTANCE_PX,
            reveal_delay_ms: DEFAULT_REVEAL_DELAY_MS,
            zoom_padding: DEFAULT_ZOOM_PADDING,
            min_span_degrees: DEFAULT_MIN_SPAN_DEGREES,
        }
    }
}

impl PinManagerOptions {
    pub fn with_clustering_distance(clustering_distance_px: f64) -> Self {
        Self {
            clustering_distance_px,
            ..Self::default()
        }
    }

    pub fn clustering_enabled(&self) -> bool {
        self.clustering_distance_px.is_finite() && self.clustering_distance_px > 0.0
    }

    pub fn reveal_delay(&self) -> Duration {
        Duration::from_millis(self.reveal_delay_ms)
    }

    pub fn validate(&self) -> Result<(), PinError> {
        if !self.zoom_padding.is_finite() || self.zoom_padding < 0.0 {
            return Err(PinError::InvalidOption {
                name: "zoomPadding",
                value: self.zoom_padding,
            });
        }
        if !self.min_span_degrees.is_finite() || self.min_span_degrees <= 0.0 {
            return Err(PinError::InvalidOption {
                name: "minSpanDegrees",
                value: self.min_span_degrees,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PinError {
    #[error("map surface is not ready to host annotations")]
    SurfaceNotReady,
    #[error("invalid pin manager option {name}: {value}")]
    InvalidOption { name: &'static str, value: f64 },
}

/// Handle for a deferred member reveal. Only the most recent one is honoured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RevealTicket(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingReveal {
    ticket: RevealTicket,
    marker_id: AnnotationId,
}

/// Result of a callout action.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    /// Call [`MapPinManager::complete_reveal`] with `ticket` after `delay`,
    /// unless the surface reports [`MapEvent::CalloutClosed`] first.
    Reveal { ticket: RevealTicket, delay: Duration },
    /// The viewport was moved to this region.
    Zoomed(Region),
    /// Application-level action; the caller handles it.
    Forward(CalloutAction),
    /// The action referred to something no longer on the map.
    Ignored,
}

pub type ClusterCallback = Rc<dyn Fn(&[Marker])>;

/// A cluster that was opened, waiting to be reported to the cluster
/// selection callback.
///
/// The manager never calls the callback while it is borrowed. Hosts drain
/// these with [`MapPinManager::take_cluster_selections`] and call
/// [`ClusterSelection::notify`] once the manager is released, so the callback
/// may call back into the manager.
pub struct ClusterSelection {
    callback: ClusterCallback,
    members: Vec<Marker>,
}

impl ClusterSelection {
    pub fn members(&self) -> &[Marker] {
        &self.members
    }

    pub fn notify(self) {
        (self.callback)(&self.members);
    }
}

impl fmt::Debug for ClusterSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterSelection")
            .field("members", &self.members.len())
            .finish_non_exhaustive()
    }
}

/// Owns the markers shown on a [`MapSurface`]: clusters them, keeps at most
/// one callout open, and survives a temporary pin across refreshes.
pub struct MapPinManager<S: MapSurface> {
    surface: S,
    options: PinManagerOptions,
    displayed: Vec<DisplayUnit>,
    /// Cluster member shown on its own while its callout is open.
    revealed: Option<Marker>,
    active: Option<AnnotationId>,
    pending_reveal: Option<PendingReveal>,
    next_ticket: u64,
    click_listener: Option<ListenerId>,
    on_cluster_select: Option<ClusterCallback>,
    cluster_selections: Vec<ClusterSelection>,
}

impl<S: MapSurface> MapPinManager<S> {
    pub fn configure(surface: S, options: PinManagerOptions) -> Result<Self, PinError> {
        if !surface.is_ready() {
            return Err(PinError::SurfaceNotReady);
        }
        options.validate()?;
        if !options.clustering_enabled() {
            debug!(
                distance = options.clustering_distance_px,
                "clustering disabled"
            );
        }

        Ok(Self {
            surface,
            options,
            displayed: Vec::new(),
            revealed: None,
            active: None,
            pending_reveal: None,
            next_ticket: 0,
            click_listener: None,
            on_cluster_select: None,
            cluster_selections: Vec::new(),
        })
    }

    pub fn options(&self) -> &PinManagerOptions {
        &self.options
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Units currently on the map, not counting a revealed cluster member.
    pub fn displayed(&self) -> &[DisplayUnit] {
        &self.displayed
    }

    pub fn active_callout(&self) -> Option<&AnnotationId> {
        self.active.as_ref()
    }

    pub fn revealed_marker(&self) -> Option<&Marker> {
        self.revealed.as_ref()
    }

    pub fn temporary_marker(&self) -> Option<&Marker> {
        self.displayed.iter().find_map(|unit| match unit {
            DisplayUnit::Marker(m) if m.temporary => Some(m),
            _ => None,
        })
    }

    pub fn has_pending_reveal(&self) -> bool {
        self.pending_reveal.is_some()
    }

    /// Register the function called with a cluster's members whenever that
    /// cluster is opened. Replaces any earlier callback.
    ///
    /// Calls are delivered through [`Self::take_cluster_selections`].
    pub fn set_cluster_selection_callback(&mut self, callback: impl Fn(&[Marker]) + 'static) {
        self.on_cluster_select = Some(Rc::new(callback));
    }

    pub fn clear_cluster_selection_callback(&mut self) {
        self.on_cluster_select = None;
        self.cluster_selections.clear();
    }

    /// Cluster openings not yet reported, oldest first.
    pub fn take_cluster_selections(&mut self) -> Vec<ClusterSelection> {
        std::mem::take(&mut self.cluster_selections)
    }

    // -----------------------------------------------------------------------
    // Marker set
    // -----------------------------------------------------------------------

    /// Replace the displayed markers with `markers`, clustering nearby ones.
    ///
    /// A temporary marker already on the map is kept unless the batch brings
    /// its own temporary marker or commits a marker with the same id.
    pub fn apply_markers(&mut self, markers: Vec<Marker>) {
        let (committed, incoming_temporary) = split_batch(markers);

        let surviving = if incoming_temporary.is_some() {
            None
        } else {
            self.take_temporary()
        };
        let surviving = match surviving {
            Some(unit) if committed.iter().any(|m| &m.id == unit.id()) => {
                debug!(id = %unit.id(), "temporary marker committed, dropping the provisional pin");
                self.surface
                    .remove_annotations(std::slice::from_ref(unit.id()));
                None
            }
            other => other,
        };

        self.remove_all_from_surface();

        let mut units = self.build_units(committed);
        units.extend(incoming_temporary.map(DisplayUnit::Marker));
        if !units.is_empty() {
            self.surface.add_annotations(&units);
        }
        units.extend(surviving);
        self.displayed = units;

        self.ensure_click_listener();
        self.reconcile_active();
    }

    /// Remove every unit, the temporary marker included, and close the callout.
    pub fn clear_markers(&mut self) {
        self.close_active_callout();
        self.remove_all_from_surface();
        self.pending_reveal = None;
    }

    /// Show a provisional pin, replacing any previous one.
    pub fn show_temporary(&mut self, marker: Marker) {
        self.discard_temporary();
        let unit = DisplayUnit::Marker(marker.into_temporary());
        self.surface.add_annotations(std::slice::from_ref(&unit));
        self.displayed.push(unit);
        self.ensure_click_listener();
    }

    /// Remove the provisional pin, returning it if there was one.
    pub fn discard_temporary(&mut self) -> Option<Marker> {
        let unit = self.take_temporary()?;
        if self.active.as_ref() == Some(unit.id()) {
            self.close_active_callout();
        }
        self.surface
            .remove_annotations(std::slice::from_ref(unit.id()));
        match unit {
            DisplayUnit::Marker(marker) => Some(marker),
            DisplayUnit::Cluster(_) => None,
        }
    }

    fn build_units(&self, markers: Vec<Marker>) -> Vec<DisplayUnit> {
        if !self.options.clustering_enabled() || markers.len() < 2 {
            return markers.into_iter().map(DisplayUnit::Marker).collect();
        }

        let surface = &self.surface;
        let groups = group_by_proximity(markers, self.options.clustering_distance_px, |marker| {
            match surface.project_to_screen(marker.coordinate) {
                Ok(point) if point.is_finite() => Some(point),
                Ok(point) => {
                    warn!(
                        id = %marker.id,
                        x = point.x,
                        y = point.y,
                        "projection returned a non-finite point, marker left unclustered"
                    );
                    None
                }
                Err(error) => {
                    warn!(id = %marker.id, %error, "projection failed, marker left unclustered");
                    None
                }
            }
        });
        units_from_groups(groups)
    }

    fn take_temporary(&mut self) -> Option<DisplayUnit> {
        let index = self.displayed.iter().position(DisplayUnit::is_temporary)?;
        Some(self.displayed.remove(index))
    }

    fn remove_all_from_surface(&mut self) {
        let mut ids: Vec<AnnotationId> = self.displayed.drain(..).map(|u| u.id().clone()).collect();
        if let Some(revealed) = self.revealed.take() {
            ids.push(revealed.id);
        }
        if !ids.is_empty() {
            self.surface.remove_annotations(&ids);
        }
    }

    fn ensure_click_listener(&mut self) {
        if self.click_listener.is_none() {
            self.click_listener = Some(self.surface.add_click_listener());
        }
    }

    /// Keep the active callout open across a refresh, or forget it if its
    /// annotation is gone.
    fn reconcile_active(&mut self) {
        let Some(active) = self.active.clone() else {
            return;
        };
        let selected = self.surface.selected_annotation();
        if self.unit(&active).is_some() {
            if selected.as_ref() != Some(&active) {
                self.surface.set_selected_annotation(Some(active));
            }
        } else {
            debug!(%active, "active callout no longer displayed");
            self.active = None;
            if selected.as_ref() == Some(&active) {
                self.surface.set_selected_annotation(None);
            }
        }
    }

    fn unit(&self, id: &AnnotationId) -> Option<&DisplayUnit> {
        self.displayed.iter().find(|u| u.id() == id)
    }

    fn is_revealed(&self, id: &AnnotationId) -> bool {
        self.revealed.as_ref().is_some_and(|m| &m.id == id)
    }

    /// Find an application marker, whether shown alone, inside a cluster, or revealed.
    pub fn find_marker(&self, id: &AnnotationId) -> Option<&Marker> {
        self.displayed
            .iter()
            .find_map(|u| u.find_marker(id))
            .or_else(|| self.revealed.as_ref().filter(|m| &m.id == id))
    }

    // -----------------------------------------------------------------------
    // Callouts
    // -----------------------------------------------------------------------

    /// Record `id` as the one open callout, closing the previous one.
    /// Opening a cluster notifies the cluster selection callback.
    pub fn handle_marker_select(&mut self, id: &AnnotationId) {
        let members = match self.unit(id) {
            Some(DisplayUnit::Cluster(cluster)) => Some(cluster.members.clone()),
            Some(DisplayUnit::Marker(_)) => None,
            None if self.is_revealed(id) => None,
            None => {
                debug!(%id, "ignoring selection of an annotation that is not displayed");
                return;
            }
        };

        if self.active.as_ref() != Some(id) {
            self.close_active_callout();
        }
        self.active = Some(id.clone());

        if let (Some(members), Some(callback)) = (members, self.on_cluster_select.as_ref()) {
            self.cluster_selections.push(ClusterSelection {
                callback: Rc::clone(callback),
                members,
            });
        }
    }

    pub fn close_active_callout(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };
        if self.surface.selected_annotation().as_ref() == Some(&active) {
            self.surface.set_selected_annotation(None);
        }
        if self.is_revealed(&active) {
            self.revealed = None;
            self.surface
                .remove_annotations(std::slice::from_ref(&active));
        }
    }

    pub fn handle_event(&mut self, event: MapEvent) {
        match event {
            MapEvent::Select(id) => self.handle_marker_select(&id),
            MapEvent::Deselect(id) => {
                if self.active.as_ref() == Some(&id) {
                    self.close_active_callout();
                }
            }
            MapEvent::BackgroundClick(listener) => {
                if self.click_listener == Some(listener) {
                    self.close_active_callout();
                } else {
                    debug!(?listener, "background click for a foreign listener");
                }
            }
            MapEvent::CalloutClosed => {
                if let Some(ticket) = self.pending_reveal.as_ref().map(|p| p.ticket) {
                    self.complete_reveal(ticket);
                }
            }
        }
    }

    /// Callout content for a displayed unit or the revealed member.
    pub fn callout_for(&self, id: &AnnotationId) -> Option<CalloutContent> {
        if let Some(unit) = self.unit(id) {
            return Some(unit.callout());
        }
        self.revealed
            .as_ref()
            .filter(|m| &m.id == id)
            .map(Marker::callout)
    }

    pub fn active_callout_content(&self) -> Option<CalloutContent> {
        self.active.as_ref().and_then(|id| self.callout_for(id))
    }

    pub fn perform_action(&mut self, action: CalloutAction) -> ActionOutcome {
        match action {
            CalloutAction::View(id) => match self.view_marker(&id) {
                Some(ticket) => ActionOutcome::Reveal {
                    ticket,
                    delay: self.options.reveal_delay(),
                },
                None => ActionOutcome::Ignored,
            },
            CalloutAction::ZoomToFit(id) => match self.zoom_to_cluster(&id) {
                Some(region) => ActionOutcome::Zoomed(region),
                None => ActionOutcome::Ignored,
            },
            forwarded @ (CalloutAction::Details(_) | CalloutAction::Reviews(_)) => {
                ActionOutcome::Forward(forwarded)
            }
        }
    }

    /// Close the open callout and schedule `id`'s own callout to open once
    /// the close has finished. A later call supersedes an earlier one.
    pub fn view_marker(&mut self, id: &AnnotationId) -> Option<RevealTicket> {
        if self.find_marker(id).is_none() {
            debug!(%id, "cannot view a marker that is not displayed");
            return None;
        }
        self.close_active_callout();

        self.next_ticket += 1;
        let ticket = RevealTicket(self.next_ticket);
        let pending = PendingReveal {
            ticket,
            marker_id: id.clone(),
        };
        if let Some(previous) = self.pending_reveal.replace(pending) {
            debug!(superseded = %previous.marker_id, "pending reveal replaced");
        }
        Some(ticket)
    }

    /// Open the callout scheduled by [`Self::view_marker`]: select the marker,
    /// centre the map on it and, if it only exists inside a cluster, show it
    /// on its own. Returns `false` for a superseded ticket or a vanished marker.
    pub fn complete_reveal(&mut self, ticket: RevealTicket) -> bool {
        match &self.pending_reveal {
            Some(pending) if pending.ticket == ticket => {}
            _ => {
                debug!(?ticket, "stale reveal ticket");
                return false;
            }
        }
        let Some(pending) = self.pending_reveal.take() else {
            return false;
        };
        let Some(marker) = self.find_marker(&pending.marker_id).cloned() else {
            debug!(id = %pending.marker_id, "marker to reveal is gone");
            return false;
        };

        self.close_active_callout();
        if self.unit(&marker.id).is_none() {
            self.surface
                .add_annotations(&[DisplayUnit::Marker(marker.clone())]);
            self.revealed = Some(marker.clone());
        }
        self.active = Some(marker.id.clone());
        self.surface.set_center_animated(marker.coordinate);
        self.surface.set_selected_annotation(Some(marker.id));
        true
    }

    /// Close the callout and fit the viewport around a cluster's members.
    pub fn zoom_to_cluster(&mut self, id: &AnnotationId) -> Option<Region> {
        if !id.is_cluster() {
            debug!(%id, "zoom requested for a plain marker");
            return None;
        }
        let points: Vec<Coordinate> = match self.unit(id) {
            Some(DisplayUnit::Cluster(cluster)) => {
                cluster.members.iter().map(|m| m.coordinate).collect()
            }
            _ => {
                debug!(%id, "zoom requested for something that is not a displayed cluster");
                return None;
            }
        };
        self.close_active_callout();

        let region = Region::bounding(
            &points,
            self.options.zoom_padding,
            self.options.min_span_degrees,
        )?;
        self.surface.animate_to_region(region);
        Some(region)
    }

    /// Unregister the click listener and drop all managed state. Safe to repeat.
    pub fn destroy(&mut self) {
        if let Some(listener) = self.click_listener.take() {
            self.surface.remove_click_listener(listener);
        }
        self.clear_markers();
        self.clear_cluster_selection_callback();
    }
}

impl<S: MapSurface> fmt::Debug for MapPinManager<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapPinManager")
            .field("options", &self.options)
            .field("displayed", &self.displayed.len())
            .field("active", &self.active)
            .field("revealed", &self.revealed.as_ref().map(|m| &m.id))
            .field("pending_reveal", &self.pending_reveal)
            .field("click_listener", &self.click_listener)
            .field("cluster_selections", &self.cluster_selections.len())
            .finish_non_exhaustive()
    }
}

/// Split a batch into committed markers and at most one temporary marker,
/// dropping repeated ids.
fn split_batch(markers: Vec<Marker>) -> (Vec<Marker>, Option<Marker>) {
    let mut seen: HashSet<AnnotationId> = HashSet::with_capacity(markers.len());
    let mut committed = Vec::with_capacity(markers.len());
    let mut temporary: Option<Marker> = None;

    for marker in markers {
        if !seen.insert(marker.id.clone()) {
            warn!(id = %marker.id, "duplicate marker id in batch, keeping the first");
            continue;
        }
        if marker.temporary {
            if let Some(previous) = temporary.replace(marker) {
                warn!(id = %previous.id, "more than one temporary marker in batch, keeping the last");
            }
        } else {
            committed.push(marker);
        }
    }

    (committed, temporary)
}
