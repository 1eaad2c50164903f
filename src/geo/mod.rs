//! Geospatial primitives: coordinates, great-circle distance, and
//! point-in-polygon containment.
//!
//! Distances use the haversine formula with a spherical Earth
//! (R = 6,371,000 m), accurate to well under a meter at the 50-100 m
//! scales the engine cares about. Containment uses even-odd ray casting
//! over the polygon's vertex list; zones are small enough that planar
//! lat/lon treatment is fine.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A WGS-84 latitude/longitude pair.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// True if both components are finite and within WGS-84 bounds.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

/// Great-circle distance between two coordinates in meters (haversine).
#[must_use]
pub fn haversine_m(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

/// A closed polygon over lat/lon vertices.
///
/// The vertex list is treated as implicitly closed (last connects back
/// to first); a trailing duplicate of the first vertex is tolerated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Polygon {
    vertices: Vec<Coordinate>,
}

impl Polygon {
    /// Build a polygon from a vertex list. Fewer than 3 vertices cannot
    /// enclose any point; such polygons are kept but contain nothing.
    #[must_use]
    pub fn new(vertices: Vec<Coordinate>) -> Self {
        Self { vertices }
    }

    #[must_use]
    pub fn vertices(&self) -> &[Coordinate] {
        &self.vertices
    }

    /// Even-odd ray-cast containment test.
    ///
    /// Points exactly on an edge may land on either side; zone borders
    /// are not survey-grade so this is acceptable.
    #[must_use]
    pub fn contains(&self, point: Coordinate) -> bool {
        let n = self.vertices.len();
        if n < 3 {
            return false;
        }

        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let vi = self.vertices[i];
            let vj = self.vertices[j];
            let crosses = (vi.lat > point.lat) != (vj.lat > point.lat);
            if crosses {
                let intersect_lon =
                    vj.lon + (point.lat - vj.lat) / (vi.lat - vj.lat) * (vi.lon - vj.lon);
                if point.lon < intersect_lon {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }
}
