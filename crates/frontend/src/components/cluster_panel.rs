use dioxus::prelude::*;
use finding_players_shared::pins::Marker;

/// Side panel listing the members of the last opened cluster.
#[component]
pub fn ClusterPanel(
    members: Signal<Vec<Marker>>,
    on_view: EventHandler<Marker>,
) -> Element {
    let mut members = members;
    let current = members.read().clone();
    if current.is_empty() {
        return rsx! {};
    }

    rsx! {
        div { class: "panel cluster-panel",
            div { class: "panel-header",
                h3 { "{current.len()} communities here" }
                button {
                    class: "secondary",
                    onclick: move |_| members.set(Vec::new()),
                    "Clear"
                }
            }
            ul {
                for marker in current {
                    li { key: "{marker.id}",
                        button {
                            class: "link",
                            onclick: {
                                let marker = marker.clone();
                                move |_| on_view.call(marker.clone())
                            },
                            "{marker.display_title()}"
                        }
                        if let Some(subtitle) = &marker.subtitle {
                            span { class: "muted", " {subtitle}" }
                        }
                    }
                }
            }
        }
    }
}
