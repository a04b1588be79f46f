//! Address geocoding through a Nominatim-compatible service

use std::future::Future;
use std::time::Duration;

use serde::Deserialize;

use crate::core::error::{Error, Result};
use crate::core::fetch::http_client;
use crate::core::types::Coordinate;

pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";

/// A resolved address
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodedAddress {
    pub location: Coordinate,
    pub display_name: String,
}

/// Turns a free-form address into coordinates
pub trait Geocoder: Send + Sync {
    fn geocode(&self, address: &str) -> impl Future<Output = Result<GeocodedAddress>> + Send;
}

#[derive(Debug, Clone)]
pub struct GeocoderConfig {
    pub endpoint: String,
    pub timeout: Duration,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_NOMINATIM_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Nominatim returns coordinates as strings
#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
    display_name: String,
}

#[derive(Debug, Clone, Default)]
pub struct NominatimGeocoder {
    config: GeocoderConfig,
}

impl NominatimGeocoder {
    pub fn new(config: GeocoderConfig) -> Self {
        Self { config }
    }
}

impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, address: &str) -> Result<GeocodedAddress> {
        let address = address.trim();
        if address.is_empty() {
            return Err(Error::InvalidInput("address must not be empty".to_string()));
        }

        let url = format!("{}/search", self.config.endpoint.trim_end_matches('/'));
        log::debug!("Geocoding '{address}' via {url}");
        let response = http_client()
            .get(&url)
            .query(&[("format", "json"), ("limit", "1"), ("q", address)])
            .timeout(self.config.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpError(format!("geocoder answered HTTP {status}")));
        }

        let places: Vec<Place> = serde_json::from_slice(&response.bytes().await?)?;
        let place = places
            .into_iter()
            .next()
            .ok_or_else(|| Error::AddressNotFound(address.to_string()))?;

        let parse = |value: &str| {
            value
                .parse::<f64>()
                .map_err(|_| Error::ParseError(format!("invalid coordinate '{value}' from geocoder")))
        };
        let location = Coordinate::from_lat_lon(parse(place.lat.as_str())?, parse(place.lon.as_str())?);

        log::info!("Geocoded '{address}' to {location}");
        Ok(GeocodedAddress {
            location,
            display_name: place.display_name,
        })
    }
}
