use serde::{Deserialize, Serialize};

use crate::games;

/// Geographic position in degrees (WGS84).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }
}

/// Point on the rendered map, in CSS pixels relative to the map container.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Euclidean distance between two screen points.
    pub fn distance_to(&self, other: ScreenPoint) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Visibility {
    #[default]
    Public,
    Private,
    InviteOnly,
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Visibility::Public => write!(f, "Public"),
            Visibility::Private => write!(f, "Private"),
            Visibility::InviteOnly => write!(f, "Invite only"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityRole {
    pub name: String,
    #[serde(default)]
    pub requirements: Option<String>,
    pub available: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    #[serde(default)]
    pub days: Vec<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub frequency: Option<String>,
}

impl Schedule {
    pub fn is_empty(&self) -> bool {
        self.days.is_empty() && self.time.is_none() && self.frequency.is_none()
    }

    /// Human-readable one-liner, e.g. "Weekly · Friday, Saturday · Evening".
    pub fn summary(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if let Some(frequency) = &self.frequency {
            parts.push(frequency.clone());
        }
        if !self.days.is_empty() {
            parts.push(self.days.join(", "));
        }
        if let Some(time) = &self.time {
            parts.push(time.clone());
        }
        parts.join(" · ")
    }
}

fn default_players_needed() -> u32 {
    1
}

/// A game community meetup pinned on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Community {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub game: String,
    pub location: Location,
    #[serde(default)]
    pub roles: Vec<CommunityRole>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub schedule: Schedule,
    #[serde(default = "default_players_needed")]
    pub players_needed: u32,
    #[serde(default)]
    pub experience_level: Option<String>,
}

impl Community {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.location.lat, self.location.lng)
    }

    /// Genre of the community's game, if the game is in the catalog.
    pub fn genre(&self) -> Option<&'static str> {
        games::genre_for_game(&self.game)
    }

    pub fn open_roles(&self) -> impl Iterator<Item = &CommunityRole> {
        self.roles.iter().filter(|r| r.available)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_screen_distance_diagonal() {
        let a = ScreenPoint::new(0.0, 0.0);
        let b = ScreenPoint::new(3.0, 4.0);
        assert!((a.distance_to(b) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_screen_point_nan_is_not_finite() {
        assert!(!ScreenPoint::new(f64::NAN, 1.0).is_finite());
        assert!(ScreenPoint::new(-10.0, 1.0).is_finite());
    }

    #[test]
    fn test_schedule_summary_orders_parts() {
        let schedule = Schedule {
            days: vec!["Friday".to_string(), "Saturday".to_string()],
            time: Some("Evening".to_string()),
            frequency: Some("Weekly".to_string()),
        };
        assert_eq!(schedule.summary(), "Weekly · Friday, Saturday · Evening");
    }

    #[test]
    fn test_schedule_summary_empty() {
        let schedule = Schedule::default();
        assert!(schedule.is_empty());
        assert_eq!(schedule.summary(), "");
    }

    #[test]
    fn test_community_deserialize_with_defaults() {
        let json = r#"{
            "id": "c1",
            "name": "Dragons of Soho",
            "game": "DnD",
            "location": { "lat": 51.51, "lng": -0.13 },
            "visibility": "invite-only"
        }"#;
        let community: Community = serde_json::from_str(json).unwrap();
        assert_eq!(community.players_needed, 1);
        assert_eq!(community.visibility, Visibility::InviteOnly);
        assert!(community.roles.is_empty());
        assert_eq!(community.genre(), Some("TTRPG"));
        assert_eq!(community.coordinate(), Coordinate::new(51.51, -0.13));
    }

    #[test]
    fn test_open_roles_filters_unavailable() {
        let json = r#"{
            "id": "c2",
            "name": "Catan Club",
            "game": "Catan",
            "location": { "lat": 0.0, "lng": 0.0 },
            "roles": [
                { "name": "Player", "available": true },
                { "name": "Host", "available": false }
            ]
        }"#;
        let community: Community = serde_json::from_str(json).unwrap();
        let open: Vec<&str> = community.open_roles().map(|r| r.name.as_str()).collect();
        assert_eq!(open, vec!["Player"]);
    }
}
