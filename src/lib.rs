//! # Baryscore Library
//!
//! Finds fair meeting places for a group: every participant travels in their
//! own mode, travel times are estimated from precomputed speed grids, and
//! candidate venues are ranked by a score blending proximity and fairness.
//!
//! ## Features
//!
//! - **Grid-based estimation**: no routing engine, one speed grid per mode
//! - **Request coalescing**: each grid is fetched once, even under concurrent load
//! - **Static fast path**: a preloaded regional venue dataset answers most searches
//! - **Live fallback**: Overpass queries with bounded retry and progress callbacks
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use baryscore::{Coordinate, Session, TravelMode};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut session = Session::default();
//!     session.add_located("Alice", "Bastille", Coordinate::from_lat_lon(48.853, 2.369), None)?;
//!     session.add_located("Bob", "Pigalle", Coordinate::from_lat_lon(48.882, 2.337), Some(TravelMode::Cycling))?;
//!
//!     let plan = baryscore::find_meeting_point(&session).await?;
//!     for venue in plan.venues.iter().take(5) {
//!         println!("{} {:.0}/100", venue.venue.display_name(), venue.score);
//!     }
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

// Re-export core types that users might need
pub use crate::core::error::{suggest_correction, Error, Result};
pub use crate::core::estimator::{estimate_with_grid, DetourTiers, EstimatorConfig, GridEstimator};
pub use crate::core::fetch::{ResourceFetcher, ResourceLoader, RetryCallback, RetryPolicy};
pub use crate::core::geo::{centroid, haversine_km, max_pairwise_distance_km, BoundingBox};
pub use crate::core::geocode::{GeocodedAddress, Geocoder, GeocoderConfig, NominatimGeocoder, DEFAULT_NOMINATIM_URL};
pub use crate::core::grid::{CellKey, GridConfig, GridStore, SpeedGrid};
pub use crate::core::links::{google_directions_url, google_search_url, osm_node_url, osrm_url};
pub use crate::core::overpass::{build_query, LiveSearch, OverpassClient, OverpassConfig, DEFAULT_OVERPASS_URL};
pub use crate::core::planner::{MeetingPlan, MeetingPlanner, PlannerConfig};
pub use crate::core::scoring::{score_durations, ScoreBreakdown, Scorer, ScoringWeights};
pub use crate::core::search::{SearchConfig, StaticOutcome, VenueSearch, STATIC_DATASET_BOUNDS};
pub use crate::core::session::Session;
pub use crate::core::source::{ResourceLocation, SourceConfig};
pub use crate::core::static_data::StaticVenueStore;
pub use crate::core::types::{Coordinate, Participant, RouteEstimate, ScoredVenue, TravelMode, Venue};

// Internal modules
mod core;

/// Rank meeting places for a session with the default configuration
///
/// Grids and the static dataset are read from `./data`.
pub async fn find_meeting_point(session: &Session) -> Result<MeetingPlan> {
    MeetingPlanner::new(PlannerConfig::default()).find(session, None).await
}

/// Rank meeting places, reporting live search retries
///
/// The callback receives `(attempt, total_attempts)` before each retry.
///
/// # Examples
/// ```rust,no_run
/// # use baryscore::{PlannerConfig, Session};
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// # let session = Session::default();
/// let plan = baryscore::find_meeting_point_with_retry(&session, PlannerConfig::default(), |attempt, total| {
///     eprintln!("Search busy, retrying ({attempt}/{total})");
/// })
/// .await?;
/// # Ok(())
/// # }
/// ```
pub async fn find_meeting_point_with_retry<F>(session: &Session, config: PlannerConfig, on_retry: F) -> Result<MeetingPlan>
where
    F: Fn(u32, u32) + Send + Sync + 'static,
{
    let callback: RetryCallback = Arc::new(on_retry);
    MeetingPlanner::new(config).find(session, Some(&callback)).await
}
