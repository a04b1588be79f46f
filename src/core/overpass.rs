//! Live venue search against an Overpass API endpoint

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::core::error::{Error, Result};
use crate::core::fetch::{http_client, retry_transient, RetryCallback, RetryPolicy};
use crate::core::types::{Coordinate, Venue};

pub const DEFAULT_OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";

/// Live point-of-interest search
pub trait LiveSearch: Send + Sync {
    fn query(
        &self,
        center: &Coordinate,
        radius_m: f64,
        amenities: &[String],
        on_retry: Option<&RetryCallback>,
    ) -> impl Future<Output = Result<Vec<Venue>>> + Send;
}

#[derive(Debug, Clone)]
pub struct OverpassConfig {
    pub endpoint: String,
    pub retry: RetryPolicy,
    /// Client-side cap on a single attempt
    pub request_timeout: Duration,
    /// `[timeout:N]` asked of the server, in seconds
    pub server_timeout_secs: u32,
}

impl Default for OverpassConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_OVERPASS_URL.to_string(),
            retry: RetryPolicy::default(),
            request_timeout: Duration::from_secs(30),
            server_timeout_secs: 25,
        }
    }
}

/// Escape a value for a double-quoted Overpass QL string
fn escape_ql(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\t' => escaped.push_str("\\t"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Build an Overpass QL query with one `around` clause per amenity type
pub fn build_query(center: &Coordinate, radius_m: f64, amenities: &[String], server_timeout_secs: u32) -> String {
    let clauses: String = amenities
        .iter()
        .map(|amenity| {
            format!(
                "node[\"amenity\"=\"{}\"](around:{radius_m:.0},{},{});",
                escape_ql(amenity),
                center.lat,
                center.lon
            )
        })
        .collect();
    format!("[out:json][timeout:{server_timeout_secs}];({clauses});out body;")
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
struct OverpassElement {
    id: u64,
    lat: Option<f64>,
    lon: Option<f64>,
    #[serde(default)]
    tags: HashMap<String, String>,
}

impl OverpassElement {
    fn into_venue(mut self) -> Option<Venue> {
        let location = Coordinate::new(self.lon?, self.lat?);
        Some(Venue {
            id: self.id,
            osm_id: Some(self.id),
            name: self.tags.remove("name"),
            location,
            address: self.tags.remove("addr:street"),
            website: self.tags.remove("website"),
            phone: self.tags.remove("phone"),
            opening_hours: self.tags.remove("opening_hours"),
            amenity: self.tags.remove("amenity"),
        })
    }
}

/// Parse an Overpass JSON body into venues, skipping elements without a position
pub fn parse_elements(body: &[u8]) -> Result<Vec<Venue>> {
    let response: OverpassResponse = serde_json::from_slice(body)?;
    Ok(response
        .elements
        .into_iter()
        .filter_map(OverpassElement::into_venue)
        .collect())
}

#[derive(Debug, Clone, Default)]
pub struct OverpassClient {
    config: OverpassConfig,
}

impl OverpassClient {
    pub fn new(config: OverpassConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OverpassConfig {
        &self.config
    }

    async fn attempt(&self, query: &str) -> Result<Vec<Venue>> {
        let response = http_client()
            .get(&self.config.endpoint)
            .query(&[("data", query)])
            .timeout(self.config.request_timeout)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::GATEWAY_TIMEOUT {
            return Err(Error::NetworkError(format!("Overpass answered HTTP {status}")));
        }
        if !status.is_success() {
            return Err(Error::HttpError(format!("Overpass answered HTTP {status}")));
        }

        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.contains("application/json"));
        if !is_json {
            let body = response.text().await.unwrap_or_default();
            let preview: String = body.chars().take(200).collect();
            log::warn!("Overpass returned a non-JSON response: {preview}");
            return Err(Error::HttpError(
                "Overpass service temporarily unavailable (non-JSON response)".to_string(),
            ));
        }

        let body = response.bytes().await?;
        parse_elements(&body)
    }
}

impl LiveSearch for OverpassClient {
    async fn query(
        &self,
        center: &Coordinate,
        radius_m: f64,
        amenities: &[String],
        on_retry: Option<&RetryCallback>,
    ) -> Result<Vec<Venue>> {
        let query = build_query(center, radius_m, amenities, self.config.server_timeout_secs);
        log::info!("Querying Overpass around {center} within {radius_m:.0} m");
        log::debug!("Overpass query: {query}");

        let venues = retry_transient(&self.config.retry, on_retry, |_| self.attempt(&query))
            .await
            .map_err(|e| {
                if e.is_transient() {
                    Error::SearchUnavailable(format!(
                        "Overpass unavailable after {} attempts: {e}",
                        self.config.retry.total_attempts()
                    ))
                } else {
                    e
                }
            })?;

        log::info!("Overpass returned {} venues", venues.len());
        Ok(venues)
    }
}
