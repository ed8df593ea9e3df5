use finding_players_shared::geo::Viewport;
use finding_players_shared::models::Coordinate;
use finding_players_shared::pins::PinManagerOptions;
use serde::Deserialize;

const CONFIG_JSON: &str = include_str!("../assets/config.json");

/// Where the map starts before the container has been measured.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct MapSettings {
    pub center: Coordinate,
    pub zoom: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            center: Coordinate::new(51.505, -0.09),
            zoom: 12.0,
            width: 960.0,
            height: 640.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub map: MapSettings,
    pub pins: PinManagerOptions,
}

impl AppConfig {
    pub fn initial_viewport(&self) -> Viewport {
        Viewport::new(
            self.map.center,
            self.map.zoom,
            self.map.width,
            self.map.height,
        )
    }
}

/// Parse the configuration bundled with the app.
pub fn load_config() -> Result<AppConfig, String> {
    parse_config(CONFIG_JSON)
}

fn parse_config(json: &str) -> Result<AppConfig, String> {
    let config: AppConfig =
        serde_json::from_str(json).map_err(|e| format!("Failed to parse config.json: {e}"))?;
    config
        .pins
        .validate()
        .map_err(|e| format!("Invalid pin settings in config.json: {e}"))?;
    Ok(config)
}
