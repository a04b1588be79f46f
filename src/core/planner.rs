//! End-to-end meeting point search for a session

use std::sync::Arc;

use serde::Serialize;

use crate::core::error::{Error, Result};
use crate::core::estimator::{EstimatorConfig, GridEstimator};
use crate::core::fetch::{ResourceFetcher, ResourceLoader, RetryCallback};
use crate::core::grid::{GridConfig, GridStore};
use crate::core::overpass::{LiveSearch, OverpassClient};
use crate::core::scoring::{Scorer, ScoringWeights};
use crate::core::search::{SearchConfig, VenueSearch};
use crate::core::session::Session;
use crate::core::source::{resolve_static_dataset, SourceConfig};
use crate::core::static_data::StaticVenueStore;
use crate::core::types::{Coordinate, ScoredVenue};

/// Everything needed to assemble a planner
#[derive(Debug, Clone, Default)]
pub struct PlannerConfig {
    pub sources: SourceConfig,
    pub grid: GridConfig,
    pub estimator: EstimatorConfig,
    pub scoring: ScoringWeights,
    pub search: SearchConfig,
}

/// Ranked venues for one search
#[derive(Debug, Clone, Serialize)]
pub struct MeetingPlan {
    pub center: Coordinate,
    pub radius_m: f64,
    /// Best first
    pub venues: Vec<ScoredVenue>,
}

pub struct MeetingPlanner<F: ResourceFetcher = ResourceLoader, L: LiveSearch = OverpassClient> {
    search: VenueSearch<F, L>,
    scorer: Scorer<F>,
}

impl MeetingPlanner<ResourceLoader, OverpassClient> {
    pub fn new(config: PlannerConfig) -> Self {
        let live = OverpassClient::new(config.search.overpass.clone());
        Self::with_parts(ResourceLoader::new(), live, config)
    }
}

impl<F: ResourceFetcher + Clone, L: LiveSearch> MeetingPlanner<F, L> {
    /// Assemble a planner around a custom fetcher and live search
    pub fn with_parts(fetcher: F, live: L, config: PlannerConfig) -> Self {
        let dataset = StaticVenueStore::with_fetcher(fetcher.clone(), resolve_static_dataset(&config.sources));
        let search = VenueSearch::with_parts(Arc::new(dataset), live, config.search.static_bounds);

        let grids = GridStore::with_fetcher(fetcher, config.sources, config.grid);
        let estimator = GridEstimator::with_config(Arc::new(grids), config.estimator);
        let scorer = Scorer::with_weights(estimator, config.scoring);

        Self { search, scorer }
    }
}

impl<F: ResourceFetcher, L: LiveSearch> MeetingPlanner<F, L> {
    pub fn search(&self) -> &VenueSearch<F, L> {
        &self.search
    }

    pub fn scorer(&self) -> &Scorer<F> {
        &self.scorer
    }

    /// Search around the group and rank every venue found
    pub async fn find(&self, session: &Session, on_retry: Option<&RetryCallback>) -> Result<MeetingPlan> {
        session.ensure_searchable()?;
        let center = session
            .search_center()
            .ok_or_else(|| Error::InvalidInput("session has no participants".to_string()))?;
        let radius_m = session.search_radius_m();

        let candidates = self
            .search
            .search(&center, radius_m, &session.amenity_types, on_retry)
            .await?;
        if candidates.is_empty() {
            log::info!("No venue found within {radius_m:.0} m of {center}");
            return Ok(MeetingPlan {
                center,
                radius_m,
                venues: Vec::new(),
            });
        }

        let venues = self.scorer.rank(&candidates, &session.participants).await?;
        Ok(MeetingPlan {
            center,
            radius_m,
            venues,
        })
    }
}
