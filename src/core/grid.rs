//! Speed grid store
//!
//! A speed grid maps fixed-size lon/lat cells to an average traversable speed
//! for one travel mode. Grids are loaded lazily, once per mode, and shared by
//! every estimate for the lifetime of the store.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use serde::Deserialize;

use crate::core::error::{Error, Result};
use crate::core::fetch::{ResourceFetcher, ResourceLoader};
use crate::core::payload::decode_json;
use crate::core::source::{resolve_grid_resource, SourceConfig};
use crate::core::types::{Coordinate, TravelMode};

/// Discretization of lon/lat space shared by every grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridConfig {
    /// Cell edge in degrees
    pub cell_size: f64,
    /// Longitude of the grid origin (west edge of the region)
    pub origin_lon: f64,
    /// Latitude of the grid origin (south edge of the region)
    pub origin_lat: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cell_size: 0.02,
            origin_lon: -5.5,
            origin_lat: 41.0,
        }
    }
}

/// Integer cell identifier `(cell_x, cell_y)`
pub type CellKey = (i64, i64);

impl GridConfig {
    pub fn cell_key(&self, coord: &Coordinate) -> CellKey {
        let cell_x = ((coord.lon - self.origin_lon) / self.cell_size).floor() as i64;
        let cell_y = ((coord.lat - self.origin_lat) / self.cell_size).floor() as i64;
        (cell_x, cell_y)
    }
}

/// On-disk shape: `{ "grid": { "<cellX>,<cellY>": speedKmh } }`
#[derive(Debug, Deserialize)]
struct GridFile {
    grid: HashMap<String, f64>,
}

/// Immutable per-mode speed grid
#[derive(Debug, Clone)]
pub struct SpeedGrid {
    mode: TravelMode,
    config: GridConfig,
    cells: HashMap<CellKey, f64>,
}

impl SpeedGrid {
    pub fn new(mode: TravelMode, config: GridConfig, cells: HashMap<CellKey, f64>) -> Self {
        // Non-positive speeds carry no information and would divide by zero later
        let cells = cells.into_iter().filter(|(_, speed)| *speed > 0.0).collect();
        Self { mode, config, cells }
    }

    /// Parse a decoded grid document
    pub fn from_json(mode: TravelMode, config: GridConfig, data: &[u8]) -> Result<Self> {
        let file: GridFile = decode_json(data)?;
        let mut cells = HashMap::with_capacity(file.grid.len());
        for (key, speed) in file.grid {
            cells.insert(parse_cell_key(&key)?, speed);
        }
        Ok(Self::new(mode, config, cells))
    }

    pub fn mode(&self) -> TravelMode {
        self.mode
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Recorded speed of the cell containing `coord`, if any
    pub fn cell_speed(&self, coord: &Coordinate) -> Option<f64> {
        self.cells.get(&self.config.cell_key(coord)).copied()
    }

    /// Speed at `coord`, falling back to the mean of the recorded neighbours
    /// and then to `default_speed`
    pub fn speed_at(&self, coord: &Coordinate, default_speed: f64) -> f64 {
        let (cell_x, cell_y) = self.config.cell_key(coord);
        if let Some(speed) = self.cells.get(&(cell_x, cell_y)) {
            return *speed;
        }

        let mut total = 0.0;
        let mut count = 0u32;
        for dx in -1..=1 {
            for dy in -1..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                if let Some(speed) = self.cells.get(&(cell_x + dx, cell_y + dy)) {
                    total += speed;
                    count += 1;
                }
            }
        }

        if count > 0 {
            total / count as f64
        } else {
            default_speed
        }
    }
}

fn parse_cell_key(key: &str) -> Result<CellKey> {
    let invalid = || Error::ParseError(format!("invalid grid cell key '{key}'"));
    let (x, y) = key.split_once(',').ok_or_else(invalid)?;
    let x = x.trim().parse::<i64>().map_err(|_| invalid())?;
    let y = y.trim().parse::<i64>().map_err(|_| invalid())?;
    Ok((x, y))
}

type GridLoad = Shared<BoxFuture<'static, std::result::Result<Arc<SpeedGrid>, String>>>;

enum GridSlot {
    Loaded(Arc<SpeedGrid>),
    Loading(GridLoad),
}

/// Lazily loaded, memoized speed grids, one per travel mode
///
/// Concurrent `load` calls for a mode that is not loaded yet share a single
/// fetch. A failed load clears its in-flight marker so the next call starts
/// fresh.
pub struct GridStore<F: ResourceFetcher = ResourceLoader> {
    fetcher: Arc<F>,
    sources: SourceConfig,
    config: GridConfig,
    slots: Arc<Mutex<HashMap<TravelMode, GridSlot>>>,
}

impl GridStore<ResourceLoader> {
    pub fn new(sources: SourceConfig) -> Self {
        Self::with_fetcher(ResourceLoader::new(), sources, GridConfig::default())
    }
}

impl<F: ResourceFetcher> GridStore<F> {
    pub fn with_fetcher(fetcher: F, sources: SourceConfig, config: GridConfig) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            sources,
            config,
            slots: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Already loaded grid for `mode`, without triggering a load
    pub fn get(&self, mode: TravelMode) -> Option<Arc<SpeedGrid>> {
        match self.slots.lock().get(&mode) {
            Some(GridSlot::Loaded(grid)) => Some(Arc::clone(grid)),
            _ => None,
        }
    }

    /// Load (or return the cached) grid for `mode`
    pub async fn load(&self, mode: TravelMode) -> Result<Arc<SpeedGrid>> {
        let pending = {
            let mut slots = self.slots.lock();
            match slots.get(&mode) {
                Some(GridSlot::Loaded(grid)) => {
                    log::debug!("Routing grid for {} served from cache", mode.grid_key());
                    return Ok(Arc::clone(grid));
                }
                Some(GridSlot::Loading(pending)) => {
                    log::debug!("Joining in-flight routing grid load for {}", mode.grid_key());
                    pending.clone()
                }
                None => {
                    let pending = self.start_load(mode);
                    slots.insert(mode, GridSlot::Loading(pending.clone()));
                    pending
                }
            }
        };

        pending.await.map_err(|reason| Error::GridUnavailable {
            mode: mode.grid_key().to_string(),
            reason,
        })
    }

    /// Load every mode's grid, tolerating individual failures
    pub async fn preload_all(&self) -> Vec<(TravelMode, Result<Arc<SpeedGrid>>)> {
        let loads = TravelMode::ALL.iter().map(|mode| async move { (*mode, self.load(*mode).await) });
        let results = futures::future::join_all(loads).await;
        for (mode, result) in &results {
            if let Err(e) = result {
                log::warn!("Preloading {} grid failed: {e}", mode.grid_key());
            }
        }
        results
    }

    fn start_load(&self, mode: TravelMode) -> GridLoad {
        let fetcher = Arc::clone(&self.fetcher);
        let slots = Arc::clone(&self.slots);
        let location = resolve_grid_resource(mode, &self.sources);
        let config = self.config;

        async move {
            log::info!("Loading routing grid for {} from {location}", mode.grid_key());
            let outcome = match fetcher.fetch(&location).await {
                Ok(data) => SpeedGrid::from_json(mode, config, &data).map(Arc::new),
                Err(e) => Err(e),
            };

            let mut slots = slots.lock();
            match outcome {
                Ok(grid) => {
                    log::info!("Routing grid for {} ready ({} cells)", mode.grid_key(), grid.len());
                    slots.insert(mode, GridSlot::Loaded(Arc::clone(&grid)));
                    Ok(grid)
                }
                Err(e) => {
                    log::warn!("Failed to load routing grid for {}: {e}", mode.grid_key());
                    slots.remove(&mode);
                    Err(e.to_string())
                }
            }
        }
        .boxed()
        .shared()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::payload::gzip;
    use crate::core::source::ResourceLocation;
    use bytes::Bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Serves a fixed payload per grid key, counting fetches
    struct CountingFetcher {
        calls: Arc<AtomicUsize>,
        payload: Vec<u8>,
        fail_first: usize,
    }

    impl ResourceFetcher for CountingFetcher {
        async fn fetch(&self, _location: &ResourceLocation) -> Result<Bytes> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            if call < self.fail_first {
                return Err(Error::HttpError("HTTP 503".to_string()));
            }
            Ok(Bytes::from(self.payload.clone()))
        }
    }

    fn grid_json() -> Vec<u8> {
        br#"{"grid": {"0,0": 30.0, "1,0": 40.0}}"#.to_vec()
    }

    fn store(fail_first: usize) -> (GridStore<CountingFetcher>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let fetcher = CountingFetcher {
            calls: Arc::clone(&calls),
            payload: gzip(&grid_json()),
            fail_first,
        };
        let store = GridStore::with_fetcher(fetcher, SourceConfig::default(), GridConfig::default());
        (store, calls)
    }

    fn grid_with(cells: &[(CellKey, f64)]) -> SpeedGrid {
        SpeedGrid::new(TravelMode::Driving, GridConfig::default(), cells.iter().copied().collect())
    }

    #[test]
    fn test_cell_key_is_deterministic() {
        let config = GridConfig::default();
        let coord = Coordinate::new(2.35, 48.85);
        assert_eq!(config.cell_key(&coord), config.cell_key(&coord));
        // (2.35 + 5.5) / 0.02 = 392.5, (48.85 - 41.0) / 0.02 = 392.5
        assert_eq!(config.cell_key(&coord), (392, 392));
    }

    #[test]
    fn test_cell_key_floors_negative_offsets() {
        let config = GridConfig::default();
        assert_eq!(config.cell_key(&Coordinate::new(-5.51, 40.99)), (-1, -1));
    }

    #[test]
    fn test_exact_cell_speed() {
        let grid = grid_with(&[((392, 392), 42.0)]);
        assert_eq!(grid.speed_at(&Coordinate::new(2.35, 48.85), 60.0), 42.0);
    }

    #[test]
    fn test_neighbour_mean_when_cell_missing() {
        // 3 of the 8 neighbours of (392, 392) carry data
        let grid = grid_with(&[((391, 391), 10.0), ((393, 392), 20.0), ((392, 393), 45.0)]);
        let speed = grid.speed_at(&Coordinate::new(2.35, 48.85), 60.0);
        assert!((speed - 25.0).abs() < 1e-12, "expected neighbour mean 25, got {speed}");
    }

    #[test]
    fn test_default_speed_when_no_neighbours() {
        let grid = grid_with(&[((400, 400), 10.0)]);
        assert_eq!(grid.speed_at(&Coordinate::new(2.35, 48.85), 15.0), 15.0);
    }

    #[test]
    fn test_non_positive_speeds_are_ignored() {
        let grid = grid_with(&[((392, 392), 0.0), ((393, 392), 20.0)]);
        assert_eq!(grid.len(), 1);
        assert_eq!(grid.speed_at(&Coordinate::new(2.35, 48.85), 60.0), 20.0);
    }

    #[test]
    fn test_from_json_rejects_bad_keys() {
        let result = SpeedGrid::from_json(
            TravelMode::Driving,
            GridConfig::default(),
            br#"{"grid": {"not-a-key": 30.0}}"#,
        );
        assert!(matches!(result, Err(Error::ParseError(_))));
    }

    #[tokio::test]
    async fn test_concurrent_loads_share_one_fetch() {
        let (store, calls) = store(0);

        let (a, b) = tokio::join!(store.load(TravelMode::Driving), store.load(TravelMode::Driving));

        let (a, b) = (a.unwrap(), b.unwrap());
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(a.len(), 2);
    }

    #[tokio::test]
    async fn test_load_is_memoized() {
        let (store, calls) = store(0);
        assert!(store.get(TravelMode::Cycling).is_none());

        store.load(TravelMode::Cycling).await.unwrap();
        store.load(TravelMode::Cycling).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(store.get(TravelMode::Cycling).is_some());
    }

    #[tokio::test]
    async fn test_modes_load_independently() {
        let (store, calls) = store(0);
        store.load(TravelMode::Driving).await.unwrap();
        store.load(TravelMode::Walking).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_load_retries_fresh() {
        let (store, calls) = store(1);

        let err = store.load(TravelMode::Driving).await.unwrap_err();
        assert!(matches!(err, Error::GridUnavailable { ref mode, .. } if mode == "car"), "{err:?}");
        assert!(store.get(TravelMode::Driving).is_none());

        store.load(TravelMode::Driving).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_waiters_share_failure() {
        let (store, calls) = store(1);

        let (a, b) = tokio::join!(store.load(TravelMode::Driving), store.load(TravelMode::Driving));

        assert!(a.is_err() && b.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_preload_all_tolerates_failures() {
        let (store, _calls) = store(1);
        let results = store.preload_all().await;
        assert_eq!(results.len(), 3);
        assert_eq!(results.iter().filter(|(_, r)| r.is_ok()).count(), 2);
    }
}
