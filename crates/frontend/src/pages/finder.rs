use dioxus::prelude::*;
use finding_players_shared::models::Community;
use finding_players_shared::pins::{CalloutAction, MapPinManager, Marker, PinError};

use crate::components::cluster_panel::ClusterPanel;
use crate::components::community_panel::{CommunityPanel, PanelTab};
use crate::components::map_view::{run_action, with_pins, MapView, PinSession};
use crate::config::{self, AppConfig};
use crate::data;
use crate::surface::{dispatch_events, ViewportSurface};

fn load_app() -> Result<(AppConfig, Vec<Community>), String> {
    let config = config::load_config()?;
    let communities = data::load_communities()?;
    Ok((config, communities))
}

/// Configure the pin manager over a fresh viewport surface. Opening a cluster
/// fills `cluster_members` for the side panel.
fn start_pins(
    config: AppConfig,
    cluster_members: Signal<Vec<Marker>>,
) -> Result<MapPinManager<ViewportSurface>, PinError> {
    let surface = ViewportSurface::new(config.initial_viewport());
    let mut manager = MapPinManager::configure(surface, config.pins)?;
    manager.set_cluster_selection_callback(move |members| {
        let mut cluster_members = cluster_members;
        cluster_members.set(members.to_vec());
    });
    Ok(manager)
}

#[component]
pub fn Finder() -> Element {
    let loaded = use_hook(load_app);

    match loaded {
        Ok((config, communities)) => rsx! {
            FinderWorkspace { config, communities }
        },
        Err(message) => {
            tracing::error!(%message, "Failed to load app data");
            rsx! {
                div { class: "app-error",
                    h2 { "Could not start Finding Players" }
                    p { "{message}" }
                }
            }
        }
    }
}

#[component]
fn FinderWorkspace(config: AppConfig, communities: Vec<Community>) -> Element {
    let markers = use_signal(|| data::community_markers(&communities));
    let cluster_members = use_signal(Vec::<Marker>::new);
    let mut drop_mode = use_signal(|| false);
    let mut reset_view_counter = use_signal(|| 0u64);
    let mut detail = use_signal(|| None::<String>);
    let mut detail_tab = use_signal(|| PanelTab::Details);

    let session: PinSession = use_signal(move || start_pins(config, cluster_members));

    use_drop(move || {
        let mut session = session;
        if let Ok(mut guard) = session.try_write() {
            if let Ok(manager) = guard.as_mut() {
                manager.destroy();
            }
        };
    });

    // Details / Reviews from a callout open the side panel.
    let on_forward = use_callback(move |action: CalloutAction| match action {
        CalloutAction::Details(id) => {
            detail_tab.set(PanelTab::Details);
            detail.set(Some(id.to_string()));
        }
        CalloutAction::Reviews(id) => {
            detail_tab.set(PanelTab::Reviews);
            detail.set(Some(id.to_string()));
        }
        other => tracing::debug!(?other, "unexpected forwarded action"),
    });

    let setup_error = session.read().as_ref().err().map(|e| e.to_string());
    if let Some(message) = setup_error {
        return rsx! {
            div { class: "app-error",
                h2 { "Map unavailable" }
                p { "{message}" }
            }
        };
    }

    let has_pending_pin = session
        .read()
        .as_ref()
        .ok()
        .is_some_and(|manager| manager.temporary_marker().is_some());
    let dropping = *drop_mode.read();

    let detail_community = detail
        .read()
        .as_ref()
        .and_then(|id| communities.iter().find(|c| &c.id == id))
        .cloned();

    rsx! {
        div { class: "app",
            div { class: "header",
                h1 { "Finding Players" }
                div { class: "toolbar",
                    button {
                        class: if dropping { "active" } else { "" },
                        onclick: move |_| drop_mode.toggle(),
                        if dropping { "Click the map…" } else { "Drop pin" }
                    }
                    if has_pending_pin {
                        button {
                            class: "secondary",
                            onclick: move |_| {
                                with_pins(session, |manager| {
                                    manager.discard_temporary();
                                    dispatch_events(manager);
                                });
                            },
                            "Discard pin"
                        }
                    }
                    button {
                        class: "secondary",
                        onclick: move |_| reset_view_counter += 1,
                        "Reset view"
                    }
                }
            }

            div { class: "sidebar",
                div { class: "panel",
                    h3 { "Communities" }
                    p { class: "muted", "{communities.len()} groups near you. Click a pin or cluster to explore." }
                }

                ClusterPanel {
                    members: cluster_members,
                    on_view: move |marker: Marker| {
                        run_action(session, markers, CalloutAction::View(marker.id), on_forward);
                    },
                }

                if let Some(community) = detail_community {
                    CommunityPanel {
                        community,
                        tab: detail_tab,
                        on_close: move |_| detail.set(None),
                    }
                }
            }

            MapView {
                session,
                markers,
                drop_mode,
                initial_view: config.initial_viewport(),
                reset_view_counter,
                on_forward,
            }
        }
    }
}
