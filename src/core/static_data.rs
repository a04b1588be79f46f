//! Preloaded regional venue dataset
//!
//! The dataset is a compressed GeoJSON FeatureCollection loaded at most once
//! per store and filtered in process.

use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::OnceCell;

use crate::core::error::{Error, Result};
use crate::core::fetch::{ResourceFetcher, ResourceLoader};
use crate::core::geo::haversine_km;
use crate::core::payload::decode_json;
use crate::core::source::ResourceLocation;
use crate::core::types::{Coordinate, Venue};

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    /// Kept raw so one malformed feature does not reject the whole collection
    #[serde(default)]
    features: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    properties: FeatureProperties,
    #[serde(default)]
    geometry: Option<PointGeometry>,
}

/// Feature ids are numbers in most exports, strings like `node/123` in others
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FeatureId {
    Number(u64),
    Text(String),
}

impl FeatureId {
    /// Numeric part of the id, `node/123` giving 123
    fn numeric(&self) -> Option<u64> {
        match self {
            FeatureId::Number(id) => Some(*id),
            FeatureId::Text(text) => text.rsplit('/').next().and_then(|tail| tail.trim().parse().ok()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FeatureProperties {
    id: Option<FeatureId>,
    #[serde(rename = "osmId")]
    osm_id: Option<FeatureId>,
    name: Option<String>,
    address: Option<String>,
    website: Option<String>,
    phone: Option<String>,
    opening_hours: Option<String>,
    amenity: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PointGeometry {
    /// `[lon, lat]`
    coordinates: Vec<f64>,
}

/// Parse a (possibly gzipped) GeoJSON venue collection
///
/// Features without a usable point geometry are skipped, as are features
/// that do not deserialize at all.
pub fn parse_dataset(data: &[u8]) -> Result<Vec<Venue>> {
    let collection: FeatureCollection = decode_json(data)?;
    let mut skipped = 0usize;
    let venues: Vec<Venue> = collection
        .features
        .into_iter()
        .enumerate()
        .filter_map(|(index, raw)| {
            let feature: Feature = match serde_json::from_value(raw) {
                Ok(feature) => feature,
                Err(e) => {
                    log::debug!("Skipping venue feature #{index}: {e}");
                    skipped += 1;
                    return None;
                }
            };
            let geometry = feature.geometry?;
            let (lon, lat) = match geometry.coordinates.as_slice() {
                [lon, lat, ..] => (*lon, *lat),
                _ => return None,
            };
            let props = feature.properties;
            let osm_id = props.osm_id.as_ref().and_then(FeatureId::numeric);
            Some(Venue {
                id: props
                    .id
                    .as_ref()
                    .and_then(FeatureId::numeric)
                    .or(osm_id)
                    .unwrap_or(index as u64),
                osm_id,
                name: props.name,
                location: Coordinate::new(lon, lat),
                address: props.address,
                website: props.website,
                phone: props.phone,
                opening_hours: props.opening_hours,
                amenity: props.amenity,
            })
        })
        .collect();
    if skipped > 0 {
        log::warn!("Skipped {skipped} malformed venue features");
    }
    Ok(venues)
}

/// Venues of one of `amenities` within `radius_m` of `center`
pub fn filter_venues(venues: &[Venue], center: &Coordinate, radius_m: f64, amenities: &[String]) -> Vec<Venue> {
    let radius_km = radius_m / 1000.0;
    venues
        .iter()
        .filter(|venue| {
            venue
                .amenity
                .as_ref()
                .is_some_and(|amenity| amenities.iter().any(|wanted| wanted == amenity))
        })
        .filter(|venue| haversine_km(center, &venue.location) <= radius_km)
        .cloned()
        .collect()
}

/// Lazily loaded, in-memory copy of the regional dataset
///
/// A failed load leaves the cache empty so the next call tries again.
pub struct StaticVenueStore<F: ResourceFetcher = ResourceLoader> {
    fetcher: Arc<F>,
    location: ResourceLocation,
    venues: OnceCell<Arc<Vec<Venue>>>,
}

impl StaticVenueStore<ResourceLoader> {
    pub fn new(location: ResourceLocation) -> Self {
        Self::with_fetcher(ResourceLoader::new(), location)
    }
}

impl<F: ResourceFetcher> StaticVenueStore<F> {
    pub fn with_fetcher(fetcher: F, location: ResourceLocation) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            location,
            venues: OnceCell::new(),
        }
    }

    pub fn location(&self) -> &ResourceLocation {
        &self.location
    }

    pub fn is_loaded(&self) -> bool {
        self.venues.initialized()
    }

    pub async fn load(&self) -> Result<Arc<Vec<Venue>>> {
        let venues = self
            .venues
            .get_or_try_init(|| async {
                log::info!("Loading static venue dataset from {}", self.location);
                let data = self.fetcher.fetch(&self.location).await?;
                let venues = parse_dataset(&data)?;
                log::info!("Static venue dataset ready ({} venues)", venues.len());
                Ok::<_, Error>(Arc::new(venues))
            })
            .await?;
        Ok(Arc::clone(venues))
    }

    /// Load if needed, then filter by amenity and distance
    pub async fn search(&self, center: &Coordinate, radius_m: f64, amenities: &[String]) -> Result<Vec<Venue>> {
        let venues = self.load().await?;
        Ok(filter_venues(&venues, center, radius_m, amenities))
    }
}
