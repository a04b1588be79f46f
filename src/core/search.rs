//! Venue search: static regional dataset first, live Overpass query second

use std::sync::Arc;

use crate::core::error::Result;
use crate::core::fetch::{ResourceFetcher, ResourceLoader, RetryCallback};
use crate::core::geo::BoundingBox;
use crate::core::overpass::{LiveSearch, OverpassClient, OverpassConfig};
use crate::core::source::{resolve_static_dataset, SourceConfig};
use crate::core::static_data::StaticVenueStore;
use crate::core::types::{Coordinate, Venue};

/// Region covered by the static dataset (metropolitan France)
pub const STATIC_DATASET_BOUNDS: BoundingBox = BoundingBox {
    north: 51.2,
    south: 41.3,
    west: -5.3,
    east: 9.7,
};

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub static_bounds: BoundingBox,
    pub overpass: OverpassConfig,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            static_bounds: STATIC_DATASET_BOUNDS,
            overpass: OverpassConfig::default(),
        }
    }
}

/// Result of the static stage
#[derive(Debug, Clone, PartialEq)]
pub enum StaticOutcome {
    /// The static dataset answered the query
    Served(Vec<Venue>),
    /// Outside the region, dataset unavailable, or no match
    NeedsFallback,
}

pub struct VenueSearch<F: ResourceFetcher = ResourceLoader, L: LiveSearch = OverpassClient> {
    static_store: Arc<StaticVenueStore<F>>,
    live: L,
    static_bounds: BoundingBox,
}

impl VenueSearch<ResourceLoader, OverpassClient> {
    pub fn new(sources: &SourceConfig, config: SearchConfig) -> Self {
        let store = StaticVenueStore::new(resolve_static_dataset(sources));
        Self::with_parts(Arc::new(store), OverpassClient::new(config.overpass), config.static_bounds)
    }
}

impl<F: ResourceFetcher, L: LiveSearch> VenueSearch<F, L> {
    pub fn with_parts(static_store: Arc<StaticVenueStore<F>>, live: L, static_bounds: BoundingBox) -> Self {
        Self {
            static_store,
            live,
            static_bounds,
        }
    }

    pub fn live(&self) -> &L {
        &self.live
    }

    /// Answer from the static dataset when possible
    ///
    /// Dataset load failures are logged and turn into `NeedsFallback`.
    pub async fn search_static(&self, center: &Coordinate, radius_m: f64, amenities: &[String]) -> StaticOutcome {
        if !self.static_bounds.contains(center) {
            log::debug!("{center} is outside the static dataset region");
            return StaticOutcome::NeedsFallback;
        }

        match self.static_store.search(center, radius_m, amenities).await {
            Ok(venues) if !venues.is_empty() => {
                log::info!("Static dataset served {} venues", venues.len());
                StaticOutcome::Served(venues)
            }
            Ok(_) => {
                log::debug!("No static venue within {radius_m:.0} m of {center}");
                StaticOutcome::NeedsFallback
            }
            Err(e) => {
                log::warn!("Static venue dataset unavailable: {e}");
                StaticOutcome::NeedsFallback
            }
        }
    }

    /// Find venues of the given amenity types within `radius_m` of `center`
    pub async fn search(
        &self,
        center: &Coordinate,
        radius_m: f64,
        amenities: &[String],
        on_retry: Option<&RetryCallback>,
    ) -> Result<Vec<Venue>> {
        match self.search_static(center, radius_m, amenities).await {
            StaticOutcome::Served(venues) => Ok(venues),
            StaticOutcome::NeedsFallback => self.live.query(center, radius_m, amenities, on_retry).await,
        }
    }
}
