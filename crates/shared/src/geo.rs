//! Web-Mercator viewport math and coordinate regions.
//!
//! World coordinates are normalized Mercator: x and y in [0, 1], origin at
//! the top-left (lng -180, lat +85.05). At zoom `z` the world is
//! `TILE_SIZE_PX * 2^z` CSS pixels wide.
use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::models::{Coordinate, ScreenPoint};

pub const TILE_SIZE_PX: f64 = 256.0;

/// Latitude limit of the square Mercator world.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

pub const MIN_ZOOM: f64 = 1.0;
pub const MAX_ZOOM: f64 = 20.0;

/// Convert a coordinate to normalized Mercator world space.
/// Returns `None` for non-finite input or latitudes outside the projectable band.
pub fn to_world(coordinate: Coordinate) -> Option<(f64, f64)> {
    if !coordinate.is_finite() || coordinate.latitude.abs() > MAX_LATITUDE {
        return None;
    }
    let x = (coordinate.longitude + 180.0) / 360.0;
    let lat = coordinate.latitude.to_radians();
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0;
    Some((x, y))
}

/// Convert normalized Mercator world space back to a coordinate.
/// `y` is clamped to the world; longitude is wrapped into [-180, 180).
pub fn from_world(x: f64, y: f64) -> Coordinate {
    let y = y.clamp(0.0, 1.0);
    let latitude = (PI * (1.0 - 2.0 * y)).sinh().atan().to_degrees();
    Coordinate::new(latitude, wrap_longitude(x * 360.0 - 180.0))
}

pub fn wrap_longitude(longitude: f64) -> f64 {
    (longitude + 180.0).rem_euclid(360.0) - 180.0
}

fn clamp_to_world(coordinate: Coordinate) -> Coordinate {
    Coordinate::new(
        coordinate.latitude.clamp(-MAX_LATITUDE, MAX_LATITUDE),
        coordinate.longitude,
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Span {
    pub latitude_delta: f64,
    pub longitude_delta: f64,
}

/// A rectangular area of the map: a center plus the degrees it covers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub center: Coordinate,
    pub span: Span,
}

impl Region {
    /// Smallest region containing every point, grown by `padding` (a fraction
    /// of the raw extent, 0.2 = 20%) and never narrower than `min_span` degrees
    /// on either axis.
    pub fn bounding(points: &[Coordinate], padding: f64, min_span: f64) -> Option<Self> {
        let first = points.first()?;
        let mut min_lat = first.latitude;
        let mut max_lat = first.latitude;
        let mut min_lng = first.longitude;
        let mut max_lng = first.longitude;
        for point in &points[1..] {
            min_lat = min_lat.min(point.latitude);
            max_lat = max_lat.max(point.latitude);
            min_lng = min_lng.min(point.longitude);
            max_lng = max_lng.max(point.longitude);
        }

        let lat_extent = max_lat - min_lat;
        let lng_extent = max_lng - min_lng;

        Some(Self {
            center: Coordinate::new((min_lat + max_lat) / 2.0, (min_lng + max_lng) / 2.0),
            span: Span {
                latitude_delta: (lat_extent + lat_extent * padding).max(min_span),
                longitude_delta: (lng_extent + lng_extent * padding).max(min_span),
            },
        })
    }
}

/// What the map currently shows: center, zoom and container size in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub center: Coordinate,
    pub zoom: f64,
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(center: Coordinate, zoom: f64, width: f64, height: f64) -> Self {
        Self {
            center: clamp_to_world(center),
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            width,
            height,
        }
    }

    pub fn has_area(&self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
    }

    /// World width in CSS pixels at the current zoom.
    pub fn world_size(&self) -> f64 {
        TILE_SIZE_PX * self.zoom.exp2()
    }

    fn center_world(&self) -> (f64, f64) {
        // The center is clamped on every write, so this cannot fail for finite input.
        to_world(clamp_to_world(self.center)).unwrap_or((0.5, 0.5))
    }

    /// Project a coordinate to container pixels.
    pub fn project(&self, coordinate: Coordinate) -> Option<ScreenPoint> {
        let (x, y) = to_world(coordinate)?;
        let (cx, cy) = self.center_world();
        let scale = self.world_size();
        let point = ScreenPoint::new(
            (x - cx) * scale + self.width / 2.0,
            (y - cy) * scale + self.height / 2.0,
        );
        point.is_finite().then_some(point)
    }

    /// Container pixels back to a coordinate.
    pub fn unproject(&self, point: ScreenPoint) -> Coordinate {
        let (cx, cy) = self.center_world();
        let scale = self.world_size();
        from_world(
            cx + (point.x - self.width / 2.0) / scale,
            cy + (point.y - self.height / 2.0) / scale,
        )
    }

    /// Change zoom while keeping the coordinate under `anchor` fixed on screen.
    pub fn zoom_at(&mut self, anchor: ScreenPoint, new_zoom: f64) {
        let anchor_coordinate = self.unproject(anchor);
        self.zoom = new_zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        let Some((ax, ay)) = to_world(clamp_to_world(anchor_coordinate)) else {
            return;
        };
        let scale = self.world_size();
        self.center = clamp_to_world(from_world(
            ax - (anchor.x - self.width / 2.0) / scale,
            ay - (anchor.y - self.height / 2.0) / scale,
        ));
    }

    /// Move the map content by a drag of (`dx`, `dy`) pixels.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        let (cx, cy) = self.center_world();
        let scale = self.world_size();
        self.center = clamp_to_world(from_world(cx - dx / scale, cy - dy / scale));
    }

    pub fn set_center(&mut self, center: Coordinate) {
        if center.is_finite() {
            self.center = clamp_to_world(center);
        }
    }

    /// Center on `region` and pick the largest zoom at which all of it is visible.
    pub fn fit_region(&mut self, region: Region) {
        if !region.center.is_finite() || !self.has_area() {
            return;
        }
        self.center = clamp_to_world(region.center);

        let lng_span = region.span.longitude_delta.abs().max(f64::EPSILON);
        let zoom_x = (self.width * 360.0 / (lng_span * TILE_SIZE_PX)).log2();

        let half_lat = region.span.latitude_delta.abs() / 2.0;
        let north = clamp_to_world(Coordinate::new(
            region.center.latitude + half_lat,
            region.center.longitude,
        ));
        let south = clamp_to_world(Coordinate::new(
            region.center.latitude - half_lat,
            region.center.longitude,
        ));
        let zoom_y = match (to_world(north), to_world(south)) {
            (Some((_, y_north)), Some((_, y_south))) => {
                let dy = (y_south - y_north).abs().max(f64::EPSILON);
                (self.height / (dy * TILE_SIZE_PX)).log2()
            }
            _ => zoom_x,
        };

        self.zoom = zoom_x.min(zoom_y).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        if width > 0.0 && height > 0.0 {
            self.width = width;
            self.height = height;
        }
    }
}
