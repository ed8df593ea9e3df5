use finding_players_shared::games;
use finding_players_shared::models::{Community, Coordinate};
use finding_players_shared::pins::{CalloutAction, CalloutContent, Marker};

const COMMUNITIES_JSON: &str = include_str!("../assets/communities.json");

/// Id of the provisional pin shown in drop-pin mode.
pub const PENDING_PIN_ID: &str = "pending-community";

/// Load the bundled community seed data.
pub fn load_communities() -> Result<Vec<Community>, String> {
    parse_communities(COMMUNITIES_JSON)
}

fn parse_communities(json: &str) -> Result<Vec<Community>, String> {
    let communities: Vec<Community> = serde_json::from_str(json)
        .map_err(|e| format!("Failed to parse communities.json: {e}"))?;
    tracing::info!(communities = communities.len(), "Loaded community data");
    Ok(communities)
}

/// Text shown in a community's callout below the title.
pub fn callout_body(community: &Community) -> String {
    let mut lines = Vec::new();
    if !community.description.trim().is_empty() {
        lines.push(community.description.trim().to_string());
    }
    lines.push(match community.players_needed {
        1 => "1 player needed".to_string(),
        n => format!("{n} players needed"),
    });
    if !community.schedule.is_empty() {
        lines.push(community.schedule.summary());
    }
    lines.join("\n")
}

pub fn community_marker(community: &Community) -> Marker {
    let body = callout_body(community);
    Marker::new(
        community.id.as_str(),
        community.coordinate(),
        community.name.as_str(),
    )
    .with_subtitle(games::game_label(&community.game))
    .with_callout(move |marker| CalloutContent::Location {
        title: marker.display_title().to_string(),
        subtitle: marker.subtitle.clone(),
        body: Some(body.clone()),
        actions: vec![
            CalloutAction::Details(marker.id.clone()),
            CalloutAction::Reviews(marker.id.clone()),
        ],
    })
}

pub fn community_markers(communities: &[Community]) -> Vec<Marker> {
    communities.iter().map(community_marker).collect()
}

/// Provisional pin for a community that has not been created yet.
pub fn pending_marker(coordinate: Coordinate) -> Marker {
    let position = format!("{:.5}, {:.5}", coordinate.latitude, coordinate.longitude);
    Marker::new(PENDING_PIN_ID, coordinate, "New Game Community")
        .with_subtitle(position)
        .into_temporary()
        .with_callout(|marker| CalloutContent::Location {
            title: marker.display_title().to_string(),
            subtitle: marker.subtitle.clone(),
            body: Some("Pin dropped. Use Discard pin to remove it.".to_string()),
            actions: Vec::new(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_communities_parse() {
        let communities = load_communities().unwrap();
        assert!(communities.len() >= 5);
        let mut ids: Vec<&str> = communities.iter().map(|c| c.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), communities.len(), "community ids must be unique");
    }

    #[test]
    fn test_malformed_json_is_reported() {
        let err = parse_communities("[{").unwrap_err();
        assert!(err.starts_with("Failed to parse communities.json"));
    }

    #[test]
    fn test_marker_from_community() {
        let communities = load_communities().unwrap();
        let dragons = communities.iter().find(|c| c.id == "soho-dragons").unwrap();
        let marker = community_marker(dragons);
        assert_eq!(marker.id.as_str(), "soho-dragons");
        assert_eq!(marker.subtitle.as_deref(), Some("DnD · TTRPG"));
        assert!(!marker.temporary);

        match marker.callout() {
            CalloutContent::Location { body, actions, .. } => {
                let body = body.unwrap();
                assert!(body.contains("1 player needed"));
                assert!(body.contains("Fortnightly · Sunday · Afternoon"));
                assert_eq!(actions.len(), 2);
            }
            other => panic!("unexpected content: {other:?}"),
        }
    }

    #[test]
    fn test_body_without_description_or_schedule() {
        let community: Community = serde_json::from_str(
            r#"{ "id": "x", "name": "X", "game": "Chess",
                 "location": { "lat": 0, "lng": 0 }, "playersNeeded": 3 }"#,
        )
        .unwrap();
        assert_eq!(callout_body(&community), "3 players needed");
    }

    #[test]
    fn test_pending_marker_is_temporary_without_actions() {
        let marker = pending_marker(Coordinate::new(51.5, -0.1));
        assert!(marker.temporary);
        assert_eq!(marker.subtitle.as_deref(), Some("51.50000, -0.10000"));
        match marker.callout() {
            CalloutContent::Location { actions, .. } => assert!(actions.is_empty()),
            other => panic!("unexpected content: {other:?}"),
        }
    }
}
