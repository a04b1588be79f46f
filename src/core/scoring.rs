//! Fairness-aware venue scoring
//!
//! A venue's score blends proximity (how long the group travels on average)
//! with equity (how evenly that burden is spread, via the coefficient of
//! variation of the durations).

use futures::future::try_join_all;

use crate::core::error::{Error, Result};
use crate::core::estimator::GridEstimator;
use crate::core::fetch::{ResourceFetcher, ResourceLoader};
use crate::core::types::{Participant, RouteEstimate, ScoredVenue, TravelMode, Venue};

/// Tunable scoring constants
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringWeights {
    /// Share of the proximity score in the final score
    pub proximity_weight: f64,
    /// Share of the fairness score in the final score
    pub fairness_weight: f64,
    /// Proximity points lost per minute of average travel
    pub decay_per_minute: f64,
    pub min_score: f64,
    pub max_score: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            proximity_weight: 0.85,
            fairness_weight: 0.15,
            decay_per_minute: 1.5,
            min_score: 1.0,
            max_score: 100.0,
        }
    }
}

/// Score components for one venue
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreBreakdown {
    pub avg_duration: f64,
    pub max_duration: f64,
    pub proximity_score: f64,
    pub coefficient_of_variation: f64,
    pub fairness_score: f64,
    pub score: f64,
    pub participant_notes: Vec<f64>,
}

/// Aggregate per-participant durations (minutes) into a bounded score
pub fn score_durations(durations: &[f64], weights: &ScoringWeights) -> Result<ScoreBreakdown> {
    if durations.is_empty() {
        return Err(Error::InvalidInput(
            "cannot score a venue without participants".to_string(),
        ));
    }

    let n = durations.len() as f64;
    let avg_duration = durations.iter().sum::<f64>() / n;
    let max_duration = durations.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let proximity_score = (100.0 - avg_duration * weights.decay_per_minute).max(0.0);

    // Everyone already at the venue: all durations equal, perfectly fair
    let (coefficient_of_variation, fairness_score) = if avg_duration == 0.0 {
        (0.0, 100.0)
    } else {
        let variance = durations
            .iter()
            .map(|d| (d - avg_duration).powi(2))
            .sum::<f64>()
            / n;
        let cov = variance.sqrt() / avg_duration;
        (cov, (100.0 * (1.0 - cov)).max(0.0))
    };

    let score = (proximity_score * weights.proximity_weight + fairness_score * weights.fairness_weight)
        .clamp(weights.min_score, weights.max_score);

    Ok(ScoreBreakdown {
        avg_duration,
        max_duration,
        proximity_score,
        coefficient_of_variation,
        fairness_score,
        score,
        participant_notes: durations.iter().map(|d| d - avg_duration).collect(),
    })
}

/// Scores and ranks venues for a group of participants
pub struct Scorer<F: ResourceFetcher = ResourceLoader> {
    estimator: GridEstimator<F>,
    weights: ScoringWeights,
}

impl<F: ResourceFetcher> Scorer<F> {
    pub fn new(estimator: GridEstimator<F>) -> Self {
        Self::with_weights(estimator, ScoringWeights::default())
    }

    pub fn with_weights(estimator: GridEstimator<F>, weights: ScoringWeights) -> Self {
        Self { estimator, weights }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Score one venue, estimating each participant's leg in their own mode
    pub async fn score(&self, venue: &Venue, participants: &[Participant]) -> Result<ScoredVenue> {
        let routes: Vec<RouteEstimate> = try_join_all(participants.iter().map(|participant| {
            self.estimator
                .estimate(&venue.location, &participant.location, participant.mode)
        }))
        .await?;

        let durations: Vec<f64> = routes.iter().map(|route| route.duration_min).collect();
        let breakdown = score_durations(&durations, &self.weights)?;

        Ok(ScoredVenue {
            venue: venue.clone(),
            score: breakdown.score,
            avg_duration_min: breakdown.avg_duration,
            max_duration_min: breakdown.max_duration,
            durations,
            participant_notes: breakdown.participant_notes,
            routes,
        })
    }

    /// Score every venue and rank them, best (highest score) first
    ///
    /// All grids are preloaded first. A grid that fails to load only matters
    /// if some participant travels in that mode.
    pub async fn rank(&self, venues: &[Venue], participants: &[Participant]) -> Result<Vec<ScoredVenue>> {
        if participants.is_empty() {
            return Err(Error::InvalidInput(
                "at least one participant is required for scoring".to_string(),
            ));
        }

        let preloaded = self.estimator.store().preload_all().await;
        for (mode, result) in preloaded {
            if let Err(e) = result {
                if uses_mode(participants, mode) {
                    return Err(e);
                }
            }
        }

        log::info!(
            "Scoring {} venues for {} participants",
            venues.len(),
            participants.len()
        );
        let mut scored = try_join_all(venues.iter().map(|venue| self.score(venue, participants))).await?;
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        Ok(scored)
    }
}

fn uses_mode(participants: &[Participant], mode: TravelMode) -> bool {
    participants.iter().any(|p| p.mode == mode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::grid::{GridConfig, GridStore};
    use crate::core::source::{ResourceLocation, SourceConfig};
    use crate::core::types::Coordinate;
    use bytes::Bytes;
    use std::sync::Arc;

    /// Serves a uniform grid for car and foot, fails for bike
    struct ModeFetcher;

    impl ResourceFetcher for ModeFetcher {
        async fn fetch(&self, location: &ResourceLocation) -> Result<Bytes> {
            let name = location.to_string();
            if name.contains("bike") {
                return Err(Error::HttpError("HTTP 404".to_string()));
            }
            Ok(Bytes::from_static(br#"{"grid": {}}"#))
        }
    }

    fn scorer() -> Scorer<ModeFetcher> {
        let store = GridStore::with_fetcher(ModeFetcher, SourceConfig::default(), GridConfig::default());
        Scorer::new(GridEstimator::new(Arc::new(store)))
    }

    fn participant(id: u64, lon: f64, lat: f64, mode: TravelMode) -> Participant {
        Participant {
            id,
            name: format!("p{id}"),
            address: String::new(),
            location: Coordinate::new(lon, lat),
            mode,
        }
    }

    fn venue(id: u64, lon: f64, lat: f64) -> Venue {
        Venue {
            id,
            osm_id: Some(id),
            name: Some(format!("venue {id}")),
            location: Coordinate::new(lon, lat),
            address: None,
            website: None,
            phone: None,
            opening_hours: None,
            amenity: Some("bar".to_string()),
        }
    }

    #[test]
    fn test_identical_durations_are_perfectly_fair() {
        let breakdown = score_durations(&[10.0, 10.0, 10.0], &ScoringWeights::default()).unwrap();
        assert_eq!(breakdown.fairness_score, 100.0);
        assert_eq!(breakdown.proximity_score, 85.0);
        assert!((breakdown.score - (85.0 * 0.85 + 15.0)).abs() < 1e-9);
    }

    #[test]
    fn test_zero_durations_do_not_divide_by_zero() {
        let breakdown = score_durations(&[0.0, 0.0], &ScoringWeights::default()).unwrap();
        assert_eq!(breakdown.fairness_score, 100.0);
        assert!(!breakdown.score.is_nan());
        assert_eq!(breakdown.score, 100.0);
    }

    #[test]
    fn test_unfair_split_scores_lower() {
        let weights = ScoringWeights::default();
        let fair = score_durations(&[20.0, 20.0], &weights).unwrap();
        let unfair = score_durations(&[5.0, 35.0], &weights).unwrap();
        assert_eq!(fair.avg_duration, unfair.avg_duration);
        assert!(unfair.score < fair.score);
        // stddev 15, mean 20
        assert!((unfair.coefficient_of_variation - 0.75).abs() < 1e-12);
        assert!((unfair.fairness_score - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_score_is_clamped() {
        let weights = ScoringWeights::default();
        // mean 100, stddev 100: both components bottom out
        let far = score_durations(&[0.0, 200.0], &weights).unwrap();
        assert_eq!(far.proximity_score, 0.0);
        assert!(far.fairness_score.abs() < 1e-9);
        assert_eq!(far.score, 1.0);

        // mean 155, stddev 145: a little fairness left, still clamped
        let skewed = score_durations(&[300.0, 10.0], &weights).unwrap();
        assert_eq!(skewed.proximity_score, 0.0);
        assert!((skewed.fairness_score - 1000.0 / 155.0).abs() < 1e-9);
        assert_eq!(skewed.score, 1.0);
    }

    #[test]
    fn test_participant_notes_sum_to_zero() {
        let breakdown = score_durations(&[3.5, 12.25, 40.0, 7.1], &ScoringWeights::default()).unwrap();
        let sum: f64 = breakdown.participant_notes.iter().sum();
        assert!(sum.abs() < 1e-9);
        assert!(breakdown.participant_notes[0] < 0.0, "closest participant is advantaged");
        assert_eq!(breakdown.max_duration, 40.0);
    }

    #[test]
    fn test_empty_durations_rejected() {
        assert!(matches!(
            score_durations(&[], &ScoringWeights::default()),
            Err(Error::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_score_uses_each_participants_mode() {
        let scorer = scorer();
        let participants = [
            participant(1, 2.35, 48.85, TravelMode::Driving),
            participant(2, 2.36, 48.86, TravelMode::Walking),
        ];

        let scored = scorer.score(&venue(1, 2.355, 48.855), &participants).await.unwrap();

        assert_eq!(scored.durations.len(), 2);
        assert_eq!(scored.participant_notes.len(), 2);
        assert_eq!(scored.routes[0].mode, TravelMode::Driving);
        assert_eq!(scored.routes[1].mode, TravelMode::Walking);
        // Walking at 5 km/h is slower than driving at 60 km/h over similar legs
        assert!(scored.durations[1] > scored.durations[0]);
        assert!(scored.score >= 1.0 && scored.score <= 100.0);
    }

    #[tokio::test]
    async fn test_rank_sorts_descending() {
        let scorer = scorer();
        let participants = [
            participant(1, 2.35, 48.85, TravelMode::Walking),
            participant(2, 2.36, 48.86, TravelMode::Walking),
        ];
        let venues = [venue(1, 2.60, 48.95), venue(2, 2.355, 48.855), venue(3, 2.40, 48.88)];

        let ranked = scorer.rank(&venues, &participants).await.unwrap();

        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].venue.id, 2);
        assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[tokio::test]
    async fn test_rank_ignores_unused_missing_grid() {
        let scorer = scorer();
        let participants = [
            participant(1, 2.35, 48.85, TravelMode::Driving),
            participant(2, 2.36, 48.86, TravelMode::Walking),
        ];
        let ranked = scorer.rank(&[venue(1, 2.355, 48.855)], &participants).await;
        assert!(ranked.is_ok());
    }

    #[tokio::test]
    async fn test_rank_fails_on_used_missing_grid() {
        let scorer = scorer();
        let participants = [
            participant(1, 2.35, 48.85, TravelMode::Cycling),
            participant(2, 2.36, 48.86, TravelMode::Walking),
        ];
        let err = scorer.rank(&[venue(1, 2.355, 48.855)], &participants).await.unwrap_err();
        assert!(matches!(err, Error::GridUnavailable { .. }));
    }
}
