use serde::{Deserialize, Serialize};

/// Web-Mercator tile edge in pixels at zoom 0.
pub const TILE_SIZE_PX: f64 = 256.0;

/// Latitude limit of the square Web-Mercator world.
pub const MAX_MERCATOR_LAT: f64 = 85.051_128_779_806_59;

/// WGS84 point in degrees.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// GeoJSON positions are `[lon, lat]`.
    pub fn from_geojson_position(position: &[f64]) -> Option<Self> {
        let (lon, lat) = match position {
            [lon, lat, ..] => (*lon, *lat),
            _ => return None,
        };
        if !lon.is_finite() || !lat.is_finite() {
            return None;
        }
        Some(Self::new(lat, lon))
    }

    /// Projects into global Web-Mercator pixel space at `zoom`.
    ///
    /// Origin is the north-west corner; y grows southwards.
    pub fn to_pixel(self, zoom: f64) -> PixelPoint {
        let scale = TILE_SIZE_PX * zoom.exp2();
        let lat = self.lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT).to_radians();
        let x = (self.lon + 180.0) / 360.0 * scale;
        let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / std::f64::consts::PI) / 2.0 * scale;
        PixelPoint { x, y }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub fn distance_sq(self, other: PixelPoint) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

/// Arithmetic mean of a set of points. Adequate for clusters spanning a few
/// hundred pixels, which never straddle the antimeridian in practice.
pub fn mean_position(points: impl IntoIterator<Item = LatLon>) -> Option<LatLon> {
    let mut n = 0usize;
    let mut lat = 0.0;
    let mut lon = 0.0;
    for p in points {
        n += 1;
        lat += p.lat;
        lon += p.lon;
    }
    if n == 0 {
        return None;
    }
    Some(LatLon::new(lat / n as f64, lon / n as f64))
}
