//! Geo Math
//!
//! Bounding boxes, great-circle distance, and the distance strings shown to
//! callers.

use serde::{Deserialize, Serialize};

/// Mean Earth radius used for haversine distance
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Kilometers per degree of latitude (and of longitude at the equator)
pub const KM_PER_DEGREE: f64 = 111.32;

/// A point on the globe in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Finite and inside the WGS84 ranges. Zero is a valid coordinate.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Axis-aligned box in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lng: f64,
    pub min_lat: f64,
    pub max_lng: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Box extending `radius_km` in each direction from `center`.
    ///
    /// Uses the equirectangular approximation: one degree of latitude is
    /// 111.32 km, one degree of longitude is 111.32 km times cos(latitude).
    pub fn around(center: Coordinates, radius_km: f64) -> Self {
        let lat_delta = radius_km / KM_PER_DEGREE;
        // cos approaches 0 at the poles; keep the divisor away from it
        let cos_lat = center.lat.to_radians().cos().abs().max(1e-6);
        let lng_delta = radius_km / (KM_PER_DEGREE * cos_lat);

        Self {
            min_lng: (center.lng - lng_delta).max(-180.0),
            min_lat: (center.lat - lat_delta).max(-90.0),
            max_lng: (center.lng + lng_delta).min(180.0),
            max_lat: (center.lat + lat_delta).min(90.0),
        }
    }

    pub fn contains(&self, point: Coordinates) -> bool {
        (self.min_lat..=self.max_lat).contains(&point.lat)
            && (self.min_lng..=self.max_lng).contains(&point.lng)
    }

    /// `min_lng,max_lat,max_lng,min_lat` as geocoding viewboxes expect it
    pub fn to_viewbox(&self) -> String {
        format!(
            "{},{},{},{}",
            self.min_lng, self.max_lat, self.max_lng, self.min_lat
        )
    }
}

/// Great-circle distance in kilometers
pub fn haversine_km(from: Coordinates, to: Coordinates) -> f64 {
    let d_lat = (to.lat - from.lat).to_radians();
    let d_lng = (to.lng - from.lng).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + from.lat.to_radians().cos() * to.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// `"850m"` below one kilometer, `"3.2km"` otherwise
pub fn format_distance(km: f64) -> String {
    if km < 1.0 {
        format!("{}m", (km * 1000.0).round() as i64)
    } else {
        format!("{km:.1}km")
    }
}

/// Read a string produced by [`format_distance`] back into meters.
///
/// Unparseable input sorts last.
pub fn parse_distance_meters(formatted: &str) -> f64 {
    let s = formatted.trim();
    let parsed = if let Some(km) = s.strip_suffix("km") {
        km.trim().parse::<f64>().map(|v| v * 1000.0)
    } else if let Some(m) = s.strip_suffix('m') {
        m.trim().parse::<f64>()
    } else {
        s.parse::<f64>()
    };
    parsed.unwrap_or(f64::INFINITY)
}
