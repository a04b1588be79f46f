//! Domain types shared by the estimator, the scorer and the venue search

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::error::{suggest_correction, Error, Result};

/// A (longitude, latitude) pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lon: f64,
    pub lat: f64,
}

impl Coordinate {
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Build from a latitude-first pair, the order most geocoders and humans use
    pub const fn from_lat_lon(lat: f64, lon: f64) -> Self {
        Self { lon, lat }
    }

    /// Linear interpolation in lon/lat space, `t` in [0, 1]
    pub fn lerp(&self, other: &Coordinate, t: f64) -> Coordinate {
        Coordinate {
            lon: self.lon + (other.lon - self.lon) * t,
            lat: self.lat + (other.lat - self.lat) * t,
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5},{:.5}", self.lat, self.lon)
    }
}

/// Participant-facing travel mode
///
/// Each mode maps to one speed grid profile (`car`, `bike`, `foot`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    #[default]
    #[serde(alias = "car")]
    Driving,
    #[serde(alias = "bike")]
    Cycling,
    #[serde(alias = "foot")]
    Walking,
}

const MODE_NAMES: &[&str] = &["driving", "cycling", "walking", "car", "bike", "foot"];

impl TravelMode {
    pub const ALL: [TravelMode; 3] = [TravelMode::Driving, TravelMode::Cycling, TravelMode::Walking];

    /// Grid profile name used in resource names and logs
    pub fn grid_key(&self) -> &'static str {
        match self {
            TravelMode::Driving => "car",
            TravelMode::Cycling => "bike",
            TravelMode::Walking => "foot",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TravelMode::Driving => "driving",
            TravelMode::Cycling => "cycling",
            TravelMode::Walking => "walking",
        }
    }
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TravelMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "driving" | "car" => Ok(TravelMode::Driving),
            "cycling" | "bike" => Ok(TravelMode::Cycling),
            "walking" | "foot" => Ok(TravelMode::Walking),
            other => {
                let message = match suggest_correction(other, MODE_NAMES) {
                    Some(suggestion) => {
                        format!("Unknown travel mode '{other}'. Did you mean '{suggestion}'?")
                    }
                    None => format!(
                        "Unknown travel mode '{other}'. Expected one of: driving, cycling, walking"
                    ),
                };
                Err(Error::InvalidInput(message))
            }
        }
    }
}

/// A member of the group, located and with their own travel mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: u64,
    pub name: String,
    pub address: String,
    pub location: Coordinate,
    #[serde(default)]
    pub mode: TravelMode,
}

/// A candidate meeting place
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Venue {
    pub id: u64,
    pub osm_id: Option<u64>,
    pub name: Option<String>,
    pub location: Coordinate,
    pub address: Option<String>,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub opening_hours: Option<String>,
    pub amenity: Option<String>,
}

impl Venue {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Unnamed venue")
    }
}

/// Estimated travel between two coordinates for one mode
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteEstimate {
    /// Estimated road distance in km
    pub distance_km: f64,
    /// Estimated duration in minutes
    pub duration_min: f64,
    pub avg_speed_kmh: f64,
    pub detour_factor: f64,
    pub straight_distance_km: f64,
    pub mode: TravelMode,
}

/// A venue together with the group's travel burden and its score
#[derive(Debug, Clone, Serialize)]
pub struct ScoredVenue {
    pub venue: Venue,
    /// Bounded score in [1, 100], higher is better
    pub score: f64,
    pub avg_duration_min: f64,
    pub max_duration_min: f64,
    /// Per-participant durations, aligned with the participant list
    pub durations: Vec<f64>,
    /// Per-participant deviation from the mean duration (negative = advantaged)
    pub participant_notes: Vec<f64>,
    pub routes: Vec<RouteEstimate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_travel_mode_parsing() {
        assert_eq!("driving".parse::<TravelMode>().unwrap(), TravelMode::Driving);
        assert_eq!("BIKE".parse::<TravelMode>().unwrap(), TravelMode::Cycling);
        assert_eq!(" foot ".parse::<TravelMode>().unwrap(), TravelMode::Walking);
    }

    #[test]
    fn test_travel_mode_parsing_suggests() {
        let err = "cyclng".parse::<TravelMode>().unwrap_err();
        assert!(err.to_string().contains("Did you mean 'cycling'"), "{err}");
    }

    #[test]
    fn test_travel_mode_serde_aliases() {
        let mode: TravelMode = serde_json::from_str("\"foot\"").unwrap();
        assert_eq!(mode, TravelMode::Walking);
        assert_eq!(serde_json::to_string(&TravelMode::Cycling).unwrap(), "\"cycling\"");
    }

    #[test]
    fn test_grid_keys() {
        let keys: Vec<_> = TravelMode::ALL.iter().map(|m| m.grid_key()).collect();
        assert_eq!(keys, vec!["car", "bike", "foot"]);
    }

    #[test]
    fn test_lerp_endpoints() {
        let a = Coordinate::new(2.0, 48.0);
        let b = Coordinate::new(3.0, 49.0);
        assert_eq!(a.lerp(&b, 0.0), a);
        assert_eq!(a.lerp(&b, 1.0), b);
        assert_eq!(a.lerp(&b, 0.5), Coordinate::new(2.5, 48.5));
    }
}
