//! Meeting session: the group of participants and what they are looking for

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{Error, Result};
use crate::core::geo::{centroid, max_pairwise_distance_km};
use crate::core::geocode::Geocoder;
use crate::core::types::{Coordinate, Participant, TravelMode};

/// Smallest search radius, in meters
pub const MIN_SEARCH_RADIUS_M: f64 = 3000.0;
/// Margin added to half the group spread, in meters
pub const SEARCH_RADIUS_MARGIN_M: f64 = 2000.0;

fn default_amenity_types() -> Vec<String> {
    vec!["bar".to_string(), "pub".to_string()]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub participants: Vec<Participant>,
    /// Mode given to participants added without an explicit one
    #[serde(default)]
    pub mode: TravelMode,
    #[serde(default = "default_amenity_types")]
    pub amenity_types: Vec<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            participants: Vec::new(),
            mode: TravelMode::default(),
            amenity_types: default_amenity_types(),
        }
    }
}

impl Session {
    pub fn new(mode: TravelMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    fn next_id(&self) -> u64 {
        self.participants.iter().map(|p| p.id).max().map_or(1, |id| id + 1)
    }

    /// Geocode `address` and add the participant
    ///
    /// The stored address is the geocoder's display name. On failure the
    /// session is left unchanged.
    pub async fn add_participant<G: Geocoder>(
        &mut self,
        name: &str,
        address: &str,
        mode: Option<TravelMode>,
        geocoder: &G,
    ) -> Result<&Participant> {
        let name = validate_name(name)?;
        let resolved = geocoder.geocode(address).await?;
        Ok(self.push(name, resolved.display_name, resolved.location, mode))
    }

    /// Add a participant whose coordinates are already known
    pub fn add_located(
        &mut self,
        name: &str,
        label: &str,
        location: Coordinate,
        mode: Option<TravelMode>,
    ) -> Result<&Participant> {
        let name = validate_name(name)?;
        if !(-90.0..=90.0).contains(&location.lat) || !(-180.0..=180.0).contains(&location.lon) {
            return Err(Error::InvalidInput(format!("coordinate {location} is out of range")));
        }
        Ok(self.push(name, label.to_string(), location, mode))
    }

    fn push(&mut self, name: String, address: String, location: Coordinate, mode: Option<TravelMode>) -> &Participant {
        let participant = Participant {
            id: self.next_id(),
            name,
            address,
            location,
            mode: mode.unwrap_or(self.mode),
        };
        log::debug!("Added participant {} ({}) at {}", participant.name, participant.mode, participant.location);
        self.participants.push(participant);
        &self.participants[self.participants.len() - 1]
    }

    /// Remove by id, returning whether a participant was removed
    pub fn remove_participant(&mut self, id: u64) -> bool {
        let before = self.participants.len();
        self.participants.retain(|p| p.id != id);
        self.participants.len() != before
    }

    pub fn locations(&self) -> Vec<Coordinate> {
        self.participants.iter().map(|p| p.location).collect()
    }

    pub fn search_center(&self) -> Option<Coordinate> {
        centroid(&self.locations())
    }

    pub fn search_radius_m(&self) -> f64 {
        let spread_m = max_pairwise_distance_km(&self.locations()) * 1000.0;
        (spread_m / 2.0 + SEARCH_RADIUS_MARGIN_M).max(MIN_SEARCH_RADIUS_M)
    }

    /// A search needs at least two participants and one amenity type
    pub fn ensure_searchable(&self) -> Result<()> {
        if self.participants.len() < 2 {
            return Err(Error::InvalidInput(format!(
                "at least 2 participants are required, got {}",
                self.participants.len()
            )));
        }
        if self.amenity_types.is_empty() {
            return Err(Error::InvalidInput("at least one amenity type is required".to_string()));
        }
        Ok(())
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = tokio::fs::read(path.as_ref()).await?;
        Ok(serde_json::from_slice(&data)?)
    }

    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let data = serde_json::to_vec_pretty(self)?;
        tokio::fs::write(path.as_ref(), data).await?;
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::InvalidInput("participant name must not be empty".to_string()));
    }
    Ok(name.to_string())
}
