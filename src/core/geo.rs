//! Great-circle helpers and bounding boxes

use serde::{Deserialize, Serialize};

use crate::core::types::Coordinate;

/// Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance between two coordinates in kilometers.
pub fn haversine_km(from: &Coordinate, to: &Coordinate) -> f64 {
    let lat1_rad = from.lat.to_radians();
    let lat2_rad = to.lat.to_radians();
    let delta_lat = (to.lat - from.lat).to_radians();
    let delta_lon = (to.lon - from.lon).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Mean of the latitudes and longitudes. `None` for an empty slice.
pub fn centroid(coords: &[Coordinate]) -> Option<Coordinate> {
    if coords.is_empty() {
        return None;
    }
    let n = coords.len() as f64;
    let (lon, lat) = coords
        .iter()
        .fold((0.0, 0.0), |(lon, lat), c| (lon + c.lon, lat + c.lat));
    Some(Coordinate::new(lon / n, lat / n))
}

/// Largest haversine distance between any two coordinates, 0 when fewer than two
pub fn max_pairwise_distance_km(coords: &[Coordinate]) -> f64 {
    let mut max_distance = 0.0f64;
    for (i, a) in coords.iter().enumerate() {
        for b in &coords[i + 1..] {
            max_distance = max_distance.max(haversine_km(a, b));
        }
    }
    max_distance
}

/// Geographic rectangle, edges inclusive
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub north: f64,
    pub south: f64,
    pub west: f64,
    pub east: f64,
}

impl BoundingBox {
    pub fn contains(&self, coord: &Coordinate) -> bool {
        coord.lat >= self.south
            && coord.lat <= self.north
            && coord.lon >= self.west
            && coord.lon <= self.east
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_same_point() {
        let p = Coordinate::new(2.35, 48.85);
        assert!(haversine_km(&p, &p) < 1e-9, "Same point should have ~0 distance");
    }

    #[test]
    fn test_haversine_known_distance() {
        // Paris to Lyon is ~392 km as the crow flies
        let paris = Coordinate::new(2.3522, 48.8566);
        let lyon = Coordinate::new(4.8357, 45.7640);
        let dist = haversine_km(&paris, &lyon);
        assert!(dist > 380.0 && dist < 400.0, "Paris to Lyon should be ~392km, got {dist}");
    }

    #[test]
    fn test_haversine_symmetric() {
        let a = Coordinate::new(2.35, 48.85);
        let b = Coordinate::new(2.36, 48.86);
        assert_eq!(haversine_km(&a, &b), haversine_km(&b, &a));
    }

    #[test]
    fn test_centroid() {
        let coords = [Coordinate::new(2.0, 48.0), Coordinate::new(4.0, 50.0)];
        assert_eq!(centroid(&coords), Some(Coordinate::new(3.0, 49.0)));
        assert_eq!(centroid(&[]), None);
    }

    #[test]
    fn test_max_pairwise_distance() {
        let a = Coordinate::new(2.35, 48.85);
        let b = Coordinate::new(2.36, 48.86);
        let c = Coordinate::new(2.50, 48.90);
        let expected = haversine_km(&a, &c);
        assert_eq!(max_pairwise_distance_km(&[a, b, c]), expected);
        assert_eq!(max_pairwise_distance_km(&[a]), 0.0);
    }

    #[test]
    fn test_bounding_box_contains_edges() {
        let bbox = BoundingBox { north: 51.2, south: 41.3, west: -5.3, east: 9.7 };
        assert!(bbox.contains(&Coordinate::new(2.35, 48.85)));
        assert!(bbox.contains(&Coordinate::new(9.7, 41.3)));
        assert!(!bbox.contains(&Coordinate::new(13.4, 52.5)));
    }
}
