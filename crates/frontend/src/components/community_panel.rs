use dioxus::prelude::*;
use finding_players_shared::games;
use finding_players_shared::models::Community;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PanelTab {
    Details,
    Reviews,
}

/// "★★★★☆ 4.2" style rating line.
pub fn rating_stars(rating: f64) -> String {
    let filled = rating.round().clamp(0.0, 5.0) as usize;
    format!("{}{} {rating:.1}", "★".repeat(filled), "☆".repeat(5 - filled))
}

/// Read-only details and reviews for the community picked from a callout.
#[component]
pub fn CommunityPanel(
    community: Community,
    tab: Signal<PanelTab>,
    on_close: EventHandler<()>,
) -> Element {
    let mut tab = tab;
    let current = *tab.read();
    let label = games::game_label(&community.game);
    let open_roles: Vec<_> = community.open_roles().cloned().collect();

    rsx! {
        div { class: "panel community-panel",
            div { class: "panel-header",
                h3 { "{community.name}" }
                button {
                    class: "secondary",
                    onclick: move |_| on_close.call(()),
                    "Close"
                }
            }
            div { class: "muted", "{label}" }

            div { class: "tabs",
                button {
                    class: if current == PanelTab::Details { "active" } else { "" },
                    onclick: move |_| tab.set(PanelTab::Details),
                    "Details"
                }
                button {
                    class: if current == PanelTab::Reviews { "active" } else { "" },
                    onclick: move |_| tab.set(PanelTab::Reviews),
                    "Reviews"
                }
            }

            match current {
                PanelTab::Details => rsx! {
                    if !community.description.is_empty() {
                        p { "{community.description}" }
                    }
                    if let Some(address) = &community.location.address {
                        div { class: "detail-row",
                            span { class: "detail-label", "Where" }
                            span { "{address}" }
                        }
                    }
                    if !community.schedule.is_empty() {
                        div { class: "detail-row",
                            span { class: "detail-label", "When" }
                            span { "{community.schedule.summary()}" }
                        }
                    }
                    div { class: "detail-row",
                        span { class: "detail-label", "Visibility" }
                        span { "{community.visibility}" }
                    }
                    div { class: "detail-row",
                        span { class: "detail-label", "Players needed" }
                        span { "{community.players_needed}" }
                    }
                    if let Some(level) = &community.experience_level {
                        div { class: "detail-row",
                            span { class: "detail-label", "Level" }
                            span { "{level}" }
                        }
                    }
                    if !open_roles.is_empty() {
                        h4 { "Open roles" }
                        ul {
                            for role in open_roles {
                                li {
                                    "{role.name}"
                                    if let Some(req) = &role.requirements {
                                        span { class: "muted", " ({req})" }
                                    }
                                }
                            }
                        }
                    }
                },
                PanelTab::Reviews => rsx! {
                    match community.rating {
                        Some(rating) => rsx! {
                            div { class: "rating", "{rating_stars(rating)}" }
                        },
                        None => rsx! {
                            p { class: "muted", "No reviews yet." }
                        },
                    }
                },
            }
        }
    }
}
