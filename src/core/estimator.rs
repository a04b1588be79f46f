//! Grid-based route estimation
//!
//! Approximates travel between two coordinates without a routing engine: the
//! straight line is sampled through the speed grid to get an average speed,
//! and a distance-tiered detour factor turns the great-circle distance into an
//! estimated road distance.

use std::sync::Arc;

use crate::core::error::Result;
use crate::core::fetch::{ResourceFetcher, ResourceLoader};
use crate::core::geo::haversine_km;
use crate::core::grid::{GridStore, SpeedGrid};
use crate::core::types::{Coordinate, RouteEstimate, TravelMode};

/// Detour multipliers for short, medium and long trips
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetourTiers {
    pub short: f64,
    pub medium: f64,
    pub long: f64,
}

/// Tunable constants of the estimator
#[derive(Debug, Clone, PartialEq)]
pub struct EstimatorConfig {
    /// Samples per straight-line km
    pub samples_per_km: f64,
    /// Lower bound on the number of samples
    pub min_samples: usize,
    /// Weight of the first and last sample
    pub endpoint_weight: f64,
    /// Trips shorter than this (km) use the short tier
    pub short_trip_km: f64,
    /// Trips shorter than this (km) use the medium tier
    pub medium_trip_km: f64,
    pub car_detour: DetourTiers,
    pub bike_detour: DetourTiers,
    pub foot_detour: DetourTiers,
    pub car_default_speed_kmh: f64,
    pub bike_default_speed_kmh: f64,
    pub foot_default_speed_kmh: f64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            samples_per_km: 3.0,
            min_samples: 8,
            endpoint_weight: 1.5,
            short_trip_km: 2.0,
            medium_trip_km: 10.0,
            car_detour: DetourTiers { short: 1.5, medium: 1.3, long: 1.2 },
            bike_detour: DetourTiers { short: 1.45, medium: 1.35, long: 1.25 },
            foot_detour: DetourTiers { short: 1.35, medium: 1.25, long: 1.15 },
            car_default_speed_kmh: 60.0,
            bike_default_speed_kmh: 15.0,
            foot_default_speed_kmh: 5.0,
        }
    }
}

impl EstimatorConfig {
    pub fn default_speed_kmh(&self, mode: TravelMode) -> f64 {
        match mode {
            TravelMode::Driving => self.car_default_speed_kmh,
            TravelMode::Cycling => self.bike_default_speed_kmh,
            TravelMode::Walking => self.foot_default_speed_kmh,
        }
    }

    pub fn detour_factor(&self, mode: TravelMode, straight_km: f64) -> f64 {
        let tiers = match mode {
            TravelMode::Driving => &self.car_detour,
            TravelMode::Cycling => &self.bike_detour,
            TravelMode::Walking => &self.foot_detour,
        };
        if straight_km < self.short_trip_km {
            tiers.short
        } else if straight_km < self.medium_trip_km {
            tiers.medium
        } else {
            tiers.long
        }
    }

    pub fn sample_count(&self, straight_km: f64) -> usize {
        let by_distance = (straight_km * self.samples_per_km).ceil() as usize;
        by_distance.max(self.min_samples).max(2)
    }
}

/// Estimate a single leg against an already loaded grid
///
/// Pure function of its inputs: the same grid and coordinates always yield the
/// same estimate.
pub fn estimate_with_grid(
    grid: &SpeedGrid,
    config: &EstimatorConfig,
    origin: &Coordinate,
    destination: &Coordinate,
) -> RouteEstimate {
    let mode = grid.mode();
    let default_speed = config.default_speed_kmh(mode);
    let straight_km = haversine_km(origin, destination);
    let samples = config.sample_count(straight_km);

    let mut weighted_speed = 0.0;
    let mut total_weight = 0.0;
    for i in 0..samples {
        let t = i as f64 / (samples - 1) as f64;
        let point = origin.lerp(destination, t);
        let speed = grid.speed_at(&point, default_speed);
        let weight = if i == 0 || i == samples - 1 { config.endpoint_weight } else { 1.0 };
        weighted_speed += speed * weight;
        total_weight += weight;
    }
    let avg_speed = weighted_speed / total_weight;

    let detour_factor = config.detour_factor(mode, straight_km);
    let distance_km = straight_km * detour_factor;
    let duration_min = distance_km / avg_speed * 60.0;

    RouteEstimate {
        distance_km,
        duration_min,
        avg_speed_kmh: avg_speed,
        detour_factor,
        straight_distance_km: straight_km,
        mode,
    }
}

/// Route estimator backed by a shared grid store
pub struct GridEstimator<F: ResourceFetcher = ResourceLoader> {
    store: Arc<GridStore<F>>,
    config: EstimatorConfig,
}

impl<F: ResourceFetcher> Clone for GridEstimator<F> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
        }
    }
}

impl<F: ResourceFetcher> GridEstimator<F> {
    pub fn new(store: Arc<GridStore<F>>) -> Self {
        Self::with_config(store, EstimatorConfig::default())
    }

    pub fn with_config(store: Arc<GridStore<F>>, config: EstimatorConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &GridStore<F> {
        &self.store
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// Estimate travel from `origin` to `destination` in `mode`
    ///
    /// Fails with `GridUnavailable` when the mode's grid cannot be loaded.
    pub async fn estimate(
        &self,
        origin: &Coordinate,
        destination: &Coordinate,
        mode: TravelMode,
    ) -> Result<RouteEstimate> {
        let grid = self.store.load(mode).await?;
        Ok(estimate_with_grid(&grid, &self.config, origin, destination))
    }

    /// Estimate one origin against many destinations, preserving order
    ///
    /// Direction does not matter: the estimate is symmetric in its endpoints.
    pub async fn estimate_many(
        &self,
        origin: &Coordinate,
        destinations: &[Coordinate],
        mode: TravelMode,
    ) -> Result<Vec<RouteEstimate>> {
        let grid = self.store.load(mode).await?;
        log::debug!(
            "Estimating {} {} legs from {origin}",
            destinations.len(),
            mode.grid_key()
        );
        Ok(destinations
            .iter()
            .map(|destination| estimate_with_grid(&grid, &self.config, origin, destination))
            .collect())
    }
}
