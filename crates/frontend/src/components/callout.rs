use dioxus::prelude::*;
use finding_players_shared::pins::{CalloutAction, CalloutContent};

/// Popup anchored above the selected pin.
#[component]
pub fn Callout(
    content: CalloutContent,
    x: f64,
    y: f64,
    on_action: EventHandler<CalloutAction>,
    on_close: EventHandler<()>,
) -> Element {
    let style = format!("left: {x}px; top: {y}px;");

    rsx! {
        div {
            class: "callout",
            style: "{style}",
            // Keep clicks inside the popup from reaching the map.
            onmousedown: move |evt: Event<MouseData>| evt.stop_propagation(),
            onmouseup: move |evt: Event<MouseData>| evt.stop_propagation(),

            button {
                class: "callout-close",
                title: "Close",
                onclick: move |_| on_close.call(()),
                "×"
            }

            match content {
                CalloutContent::Location { title, subtitle, body, actions } => rsx! {
                    h4 { "{title}" }
                    if let Some(subtitle) = subtitle {
                        div { class: "callout-subtitle", "{subtitle}" }
                    }
                    if let Some(body) = body {
                        for line in body.lines().map(str::to_string).collect::<Vec<_>>() {
                            p { class: "callout-body", "{line}" }
                        }
                    }
                    if !actions.is_empty() {
                        div { class: "callout-actions",
                            for action in actions {
                                button {
                                    class: if matches!(action, CalloutAction::Details(_)) { "" } else { "secondary" },
                                    onclick: {
                                        let action = action.clone();
                                        move |_| on_action.call(action.clone())
                                    },
                                    "{action.label()}"
                                }
                            }
                        }
                    }
                },
                CalloutContent::ClusterList { heading, entries, zoom_action } => rsx! {
                    h4 { "{heading}" }
                    ul { class: "callout-list",
                        for entry in entries {
                            li { key: "{entry.marker_id}",
                                div { class: "callout-entry",
                                    span { class: "callout-entry-title", "{entry.title}" }
                                    if let Some(subtitle) = &entry.subtitle {
                                        span { class: "callout-subtitle", "{subtitle}" }
                                    }
                                }
                                button {
                                    class: "secondary",
                                    onclick: {
                                        let action = entry.action.clone();
                                        move |_| on_action.call(action.clone())
                                    },
                                    "{entry.action.label()}"
                                }
                            }
                        }
                    }
                    button {
                        class: "callout-zoom",
                        onclick: {
                            let action = zoom_action.clone();
                            move |_| on_action.call(action.clone())
                        },
                        "{zoom_action.label()}"
                    }
                },
            }
        }
    }
}
