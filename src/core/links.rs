//! Links to external map services for a venue or a participant's leg

use reqwest::Url;

use crate::core::types::{Coordinate, TravelMode, Venue};

const GOOGLE_SEARCH_URL: &str = "https://www.google.com/maps/search/";

fn google_travel_mode(mode: TravelMode) -> &'static str {
    match mode {
        TravelMode::Driving => "driving",
        TravelMode::Cycling => "bicycling",
        TravelMode::Walking => "walking",
    }
}

fn osrm_profile(mode: TravelMode) -> u8 {
    match mode {
        TravelMode::Driving => 0,
        TravelMode::Cycling => 1,
        TravelMode::Walking => 2,
    }
}

/// Google Maps directions between two points
pub fn google_directions_url(from: &Coordinate, to: &Coordinate, mode: TravelMode) -> String {
    format!(
        "https://www.google.com/maps/dir/{},{}/{},{}?travelmode={}",
        from.lat,
        from.lon,
        to.lat,
        to.lon,
        google_travel_mode(mode)
    )
}

/// OSRM demo map centered on the midpoint of the leg
pub fn osrm_url(from: &Coordinate, to: &Coordinate, mode: TravelMode) -> String {
    let mid = from.lerp(to, 0.5);
    format!(
        "https://map.project-osrm.org/?z=12&center={:.5},{:.5}&loc={},{}&loc={},{}&hl=fr&srv={}",
        mid.lat,
        mid.lon,
        from.lat,
        from.lon,
        to.lat,
        to.lon,
        osrm_profile(mode)
    )
}

/// Google Maps place search for the venue name, plus its address when known
pub fn google_search_url(venue: &Venue) -> String {
    let query = match venue.address.as_deref() {
        Some(address) if !address.is_empty() => format!("{} {address}", venue.display_name()),
        _ => venue.display_name().to_string(),
    };
    match Url::parse_with_params(GOOGLE_SEARCH_URL, &[("api", "1"), ("query", query.as_str())]) {
        Ok(url) => url.to_string(),
        Err(e) => {
            log::warn!("Could not build search link: {e}");
            GOOGLE_SEARCH_URL.to_string()
        }
    }
}

/// OpenStreetMap page of the venue node, when the venue comes from OSM
pub fn osm_node_url(venue: &Venue) -> Option<String> {
    venue
        .osm_id
        .map(|id| format!("https://www.openstreetmap.org/node/{id}"))
}
