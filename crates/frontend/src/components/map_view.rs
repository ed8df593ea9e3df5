use dioxus::html::geometry::WheelDelta;
use dioxus::html::input_data::MouseButton;
use dioxus::prelude::*;
use finding_players_shared::geo::Viewport;
use finding_players_shared::models::ScreenPoint;
use finding_players_shared::pins::{
    ActionOutcome, AnnotationId, CalloutAction, MapPinManager, Marker, PinError,
};
use gloo_timers::future::TimeoutFuture;

use crate::components::callout::Callout;
use crate::data;
use crate::surface::{dispatch_events, PinKind, PinView, ViewportSurface};

const MAP_CONTAINER_ID: &str = "finder-map-container";

/// Drag threshold in pixels. Movement below this is treated as a click.
const DRAG_THRESHOLD: f64 = 3.0;

/// Zoom levels per wheel notch.
const ZOOM_STEP: f64 = 0.5;

/// Vertical gap between a pin's anchor point and the bottom of its callout.
const CALLOUT_OFFSET_PX: f64 = 36.0;

/// The pin manager as shared between components. `Err` when the map could
/// not be set up.
pub type PinSession = Signal<Result<MapPinManager<ViewportSurface>, PinError>>;

/// Run `f` against the pin manager, if there is one. Clusters opened along
/// the way are reported once the session is released.
pub fn with_pins<R>(
    session: PinSession,
    f: impl FnOnce(&mut MapPinManager<ViewportSurface>) -> R,
) -> Option<R> {
    let mut session = session;
    let (result, selections) = {
        let mut guard = session.write();
        let manager = guard.as_mut().ok()?;
        let result = f(manager);
        (result, manager.take_cluster_selections())
    };
    for selection in selections {
        selection.notify();
    }
    Some(result)
}

/// Re-cluster the current marker set under the current viewport.
pub fn refresh_markers(session: PinSession, markers: Signal<Vec<Marker>>) {
    let batch = markers.peek().clone();
    with_pins(session, |manager| {
        manager.apply_markers(batch);
        dispatch_events(manager);
    });
}

/// Carry out a callout action. Manager-owned actions run here; the rest go
/// to `on_forward`.
pub fn run_action(
    session: PinSession,
    markers: Signal<Vec<Marker>>,
    action: CalloutAction,
    on_forward: EventHandler<CalloutAction>,
) {
    let outcome = with_pins(session, |manager| {
        let outcome = manager.perform_action(action);
        dispatch_events(manager);
        let pending = manager.has_pending_reveal();
        (outcome, pending)
    });

    match outcome {
        Some((ActionOutcome::Reveal { ticket, delay }, true)) => {
            // The surface did not report the close; fall back to the timer.
            let millis = u32::try_from(delay.as_millis()).unwrap_or(u32::MAX);
            spawn(async move {
                TimeoutFuture::new(millis).await;
                with_pins(session, |manager| manager.complete_reveal(ticket));
            });
        }
        Some((ActionOutcome::Zoomed(_), _)) => refresh_markers(session, markers),
        Some((ActionOutcome::Forward(action), _)) => on_forward.call(action),
        Some((ActionOutcome::Reveal { .. }, false)) | Some((ActionOutcome::Ignored, _)) | None => {}
    }
}

// ---------------------------------------------------------------------------
// DOM helpers
// ---------------------------------------------------------------------------

/// Get the bounding client rect of the map container element.
fn container_rect() -> Option<web_sys::DomRect> {
    let document = web_sys::window()?.document()?;
    let element = document.get_element_by_id(MAP_CONTAINER_ID)?;
    Some(element.get_bounding_client_rect())
}

/// Client coordinates to container-relative pixels.
fn container_point(client_x: f64, client_y: f64) -> Option<ScreenPoint> {
    let rect = container_rect()?;
    Some(ScreenPoint::new(client_x - rect.left(), client_y - rect.top()))
}

// ---------------------------------------------------------------------------
// Pure helpers
// ---------------------------------------------------------------------------

/// Convert a wheel delta (pixels / lines / pages) to a uniform pixel-like value.
fn wheel_delta_y(delta: WheelDelta) -> f64 {
    match delta {
        WheelDelta::Pixels(d) => d.y,
        WheelDelta::Lines(d) => d.y * 40.0,
        WheelDelta::Pages(d) => d.y * 400.0,
    }
}

/// Scrolling up zooms in.
fn next_zoom(zoom: f64, delta_y: f64) -> f64 {
    if delta_y < 0.0 {
        zoom + ZOOM_STEP
    } else if delta_y > 0.0 {
        zoom - ZOOM_STEP
    } else {
        zoom
    }
}

fn pin_class(pin: &PinView) -> String {
    let kind = match pin.kind {
        PinKind::Community => "pin",
        PinKind::Pending => "pin pending",
        PinKind::Cluster { .. } => "pin cluster",
    };
    if pin.selected {
        format!("{kind} selected")
    } else {
        kind.to_string()
    }
}

/// Where the callout for `id` sits, if its pin is on screen.
fn callout_anchor(pins: &[PinView], id: &AnnotationId) -> Option<ScreenPoint> {
    pins.iter()
        .find(|p| &p.id == id)
        .map(|p| ScreenPoint::new(p.point.x, p.point.y - CALLOUT_OFFSET_PX))
}

#[component]
pub fn MapView(
    session: PinSession,
    markers: Signal<Vec<Marker>>,
    drop_mode: Signal<bool>,
    initial_view: Viewport,
    reset_view_counter: Signal<u64>,
    on_forward: EventHandler<CalloutAction>,
) -> Element {
    let mut drop_mode = drop_mode;

    // Apply the marker set whenever it changes.
    use_effect(move || {
        let batch = markers.read().clone();
        with_pins(session, |manager| {
            manager.apply_markers(batch);
            dispatch_events(manager);
        });
    });

    // Reset the view when the parent bumps the counter.
    use_effect(move || {
        let _counter = *reset_view_counter.read();
        with_pins(session, |manager| {
            let viewport = manager.surface_mut().viewport_mut();
            viewport.set_center(initial_view.center);
            viewport.zoom = initial_view.zoom;
        });
        refresh_markers(session, markers);
    });

    // Drag state (mouse)
    let mut is_dragging = use_signal(|| false);
    let mut did_drag = use_signal(|| false);
    let mut drag_start = use_signal(|| (0.0_f64, 0.0_f64));
    let mut drag_last = use_signal(|| (0.0_f64, 0.0_f64));

    let (pins, callout) = {
        let guard = session.read();
        let Ok(manager) = guard.as_ref() else {
            return rsx! {};
        };
        let pins = manager.surface().pins();
        let callout = manager.active_callout().and_then(|id| {
            let content = manager.callout_for(id)?;
            let anchor = callout_anchor(&pins, id)?;
            Some((content, anchor))
        });
        (pins, callout)
    };

    let dragging = *is_dragging.read();
    let container_class = match (dragging, *drop_mode.read()) {
        (true, _) => "map-container dragging",
        (false, true) => "map-container drop-mode",
        (false, false) => "map-container",
    };

    rsx! {
        div {
            id: MAP_CONTAINER_ID,
            class: "{container_class}",

            onmounted: move |_| {
                let Some(rect) = container_rect() else { return };
                with_pins(session, |manager| {
                    manager.surface_mut().viewport_mut().resize(rect.width(), rect.height());
                });
                refresh_markers(session, markers);
            },

            onwheel: move |evt: Event<WheelData>| {
                evt.prevent_default();

                let delta_y = wheel_delta_y(evt.data().delta());
                let client = evt.data().client_coordinates();
                let Some(anchor) = container_point(client.x, client.y) else { return };

                let changed = with_pins(session, |manager| {
                    let viewport = manager.surface_mut().viewport_mut();
                    let old_zoom = viewport.zoom;
                    viewport.zoom_at(anchor, next_zoom(old_zoom, delta_y));
                    (viewport.zoom - old_zoom).abs() > 1e-9
                });
                if changed == Some(true) {
                    refresh_markers(session, markers);
                }
            },

            onmousedown: move |evt: Event<MouseData>| {
                if evt.trigger_button() != Some(MouseButton::Primary) {
                    return;
                }
                let client = evt.client_coordinates();
                is_dragging.set(true);
                did_drag.set(false);
                drag_start.set((client.x, client.y));
                drag_last.set((client.x, client.y));
            },

            onmousemove: move |evt: Event<MouseData>| {
                if !*is_dragging.read() {
                    return;
                }
                let client = evt.client_coordinates();
                let (start_x, start_y) = *drag_start.read();
                let dx = client.x - start_x;
                let dy = client.y - start_y;

                if !*did_drag.read() && (dx.abs() > DRAG_THRESHOLD || dy.abs() > DRAG_THRESHOLD) {
                    did_drag.set(true);
                }
                if *did_drag.read() {
                    let (last_x, last_y) = *drag_last.read();
                    with_pins(session, |manager| {
                        manager
                            .surface_mut()
                            .viewport_mut()
                            .pan_by(client.x - last_x, client.y - last_y);
                    });
                    drag_last.set((client.x, client.y));
                }
            },

            onmouseup: move |evt: Event<MouseData>| {
                let was_dragging = *is_dragging.read();
                let was_drag = *did_drag.read();
                is_dragging.set(false);

                // A mouseup without drag movement = a click on the map itself
                if !was_dragging || was_drag {
                    return;
                }
                if *drop_mode.read() {
                    let client = evt.client_coordinates();
                    let Some(point) = container_point(client.x, client.y) else { return };
                    with_pins(session, |manager| {
                        let coordinate = manager.surface().viewport().unproject(point);
                        tracing::info!(
                            latitude = coordinate.latitude,
                            longitude = coordinate.longitude,
                            "Dropped pending pin"
                        );
                        manager.show_temporary(data::pending_marker(coordinate));
                        manager
                            .surface_mut()
                            .click_annotation(&AnnotationId::new(data::PENDING_PIN_ID));
                        dispatch_events(manager);
                    });
                    drop_mode.set(false);
                } else {
                    with_pins(session, |manager| {
                        manager.surface_mut().click_background();
                        dispatch_events(manager);
                    });
                }
            },

            onmouseleave: move |_| {
                is_dragging.set(false);
            },

            div { class: "map-grid" }

            for pin in pins {
                div {
                    key: "{pin.key}",
                    class: "{pin_class(&pin)}",
                    title: "{pin.title}",
                    style: "left: {pin.point.x}px; top: {pin.point.y}px; z-index: {pin.priority};",
                    onmousedown: move |evt: Event<MouseData>| evt.stop_propagation(),
                    onmouseup: move |evt: Event<MouseData>| evt.stop_propagation(),
                    onclick: {
                        let id = pin.id.clone();
                        move |evt: Event<MouseData>| {
                            evt.stop_propagation();
                            with_pins(session, |manager| {
                                manager.surface_mut().click_annotation(&id);
                                dispatch_events(manager);
                            });
                        }
                    },
                    span { class: "pin-glyph", "{pin.glyph}" }
                }
            }

            if let Some((content, anchor)) = callout {
                Callout {
                    content,
                    x: anchor.x,
                    y: anchor.y,
                    on_action: move |action: CalloutAction| {
                        run_action(session, markers, action, on_forward);
                    },
                    on_close: move |_| {
                        with_pins(session, |manager| {
                            manager.surface_mut().close_callout();
                            dispatch_events(manager);
                        });
                    },
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use finding_players_shared::models::Coordinate;

    use super::*;

    fn pin(id: &str, x: f64, y: f64, kind: PinKind, selected: bool) -> PinView {
        let id = AnnotationId::new(id);
        PinView {
            key: id.render_key(),
            title: id.to_string(),
            id,
            point: ScreenPoint::new(x, y),
            kind,
            glyph: String::new(),
            priority: 500,
            selected,
        }
    }

    #[test]
    fn test_next_zoom_direction() {
        assert!((next_zoom(12.0, -100.0) - 12.5).abs() < 1e-9);
        assert!((next_zoom(12.0, 3.0) - 11.5).abs() < 1e-9);
        assert!((next_zoom(12.0, 0.0) - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_pin_class() {
        assert_eq!(pin_class(&pin("a", 0.0, 0.0, PinKind::Community, false)), "pin");
        assert_eq!(
            pin_class(&pin("c", 0.0, 0.0, PinKind::Cluster { count: 3 }, true)),
            "pin cluster selected"
        );
        assert_eq!(pin_class(&pin("p", 0.0, 0.0, PinKind::Pending, false)), "pin pending");
    }

    #[test]
    fn test_callout_anchor_sits_above_pin() {
        let pins = vec![
            pin("a", 10.0, 100.0, PinKind::Community, false),
            pin("b", 200.0, 300.0, PinKind::Community, true),
        ];
        let anchor = callout_anchor(&pins, &AnnotationId::new("b")).unwrap();
        assert!((anchor.x - 200.0).abs() < 1e-9);
        assert!((anchor.y - (300.0 - CALLOUT_OFFSET_PX)).abs() < 1e-9);
        assert!(callout_anchor(&pins, &AnnotationId::new("zz")).is_none());
    }

    #[test]
    fn test_pending_pin_replaces_previous() {
        let viewport = Viewport::new(Coordinate::new(51.505, -0.09), 12.0, 800.0, 600.0);
        let mut manager = MapPinManager::configure(
            ViewportSurface::new(viewport),
            Default::default(),
        )
        .unwrap();
        manager.show_temporary(data::pending_marker(Coordinate::new(51.50, -0.10)));
        manager.show_temporary(data::pending_marker(Coordinate::new(51.51, -0.08)));
        let pins = manager.surface().pins();
        assert_eq!(pins.len(), 1);
        assert_eq!(pins[0].kind, PinKind::Pending);
    }
}
