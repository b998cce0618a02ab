use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::sync::{Mutex, watch};

use super::record::{FilterCriteria, PoiPage};
use super::remote::PoiFetcher;

#[derive(Error, Debug)]
pub enum PoiSourceError {
  /// The network call failed. `last_good` may still serve the previous
  /// successful set for the same criteria (stale-while-error).
  #[error("POI fetch failed: {0}")]
  FetchFailed(String),
  /// A newer criteria value superseded this request before it resolved;
  /// the result must not be applied to visible state.
  #[error("fetch superseded by a newer filter change")]
  Superseded,
}

/// Result shared between the single-flight leader and its waiters.
type SharedResult = Result<Arc<PoiPage>, String>;

struct CacheEntry {
  page: Arc<PoiPage>,
  fetched_at: Instant,
}

#[derive(Default)]
struct Latest {
  generation: u64,
  key: String,
}

#[derive(Default)]
struct SourceState {
  cache: HashMap<String, CacheEntry>,
  in_flight: HashMap<String, watch::Receiver<Option<SharedResult>>>,
}

/// Fetches POI pages for filter criteria, with per-key caching inside a
/// staleness window, single-flight deduplication of concurrent calls and
/// last-request-wins ordering across criteria changes.
///
/// Ordering is enforced with a generation counter: a criteria value
/// different from the latest one begins a new generation, and any fetch
/// that completes under an older generation resolves to
/// [`PoiSourceError::Superseded`] instead of its data. No cleanup is tied
/// to a superseded result; the downstream pipeline is stateless and
/// idempotent.
pub struct PoiDataSource {
  fetcher: Arc<dyn PoiFetcher>,
  staleness: Duration,
  latest: StdMutex<Latest>,
  state: Mutex<SourceState>,
}

impl PoiDataSource {
  #[must_use]
  pub fn new(fetcher: Arc<dyn PoiFetcher>, staleness: Duration) -> Self {
    Self {
      fetcher,
      staleness,
      latest: StdMutex::new(Latest::default()),
      state: Mutex::new(SourceState::default()),
    }
  }

  /// The last successful page for `criteria`, regardless of freshness.
  /// This is the explicit stale-while-error path; it never crosses keys.
  pub async fn last_good(&self, criteria: &FilterCriteria) -> Option<Arc<PoiPage>> {
    self
      .state
      .lock()
      .await
      .cache
      .get(&criteria.cache_key())
      .map(|entry| Arc::clone(&entry.page))
  }

  /// Fetches records for `criteria`.
  ///
  /// Within the staleness window a cached page is returned without a
  /// network call. Concurrent callers for the same key share one
  /// underlying request. The returned result is generation-guarded: if a
  /// different criteria value was requested while this call was pending,
  /// it resolves to [`PoiSourceError::Superseded`].
  pub async fn fetch(&self, criteria: &FilterCriteria) -> Result<Arc<PoiPage>, PoiSourceError> {
    let key = criteria.cache_key();
    let generation = self.begin(&key);

    loop {
      // Fresh cache hit, join a live in-flight request, or become the
      // leader. An in-flight entry whose sender is gone belonged to a
      // leader that was dropped mid-fetch; it is replaced, never joined,
      // so an aborted leader cannot poison the key.
      let mut rx = {
        let mut state = self.state.lock().await;
        if let Some(entry) = state.cache.get(&key)
          && entry.fetched_at.elapsed() < self.staleness
        {
          log::debug!("cache_hit: {key}");
          let page = Arc::clone(&entry.page);
          return self.guard(generation, Ok(page));
        }
        let live = state
          .in_flight
          .get(&key)
          .filter(|rx| rx.has_changed().is_ok())
          .cloned();
        match live {
          Some(rx) => {
            log::debug!("joining in-flight fetch: {key}");
            rx
          }
          None => {
            let (tx, rx) = watch::channel(None);
            state.in_flight.insert(key.clone(), rx);
            drop(state);
            return self.lead(criteria, key, generation, tx).await;
          }
        }
      };

      loop {
        let shared = rx.borrow().clone();
        if let Some(result) = shared {
          return self.guard(generation, result);
        }
        if rx.changed().await.is_err() {
          // Leader dropped without publishing. Evict the dead channel
          // (unless someone already replaced it) and start over so a new
          // request gets issued.
          log::debug!("in-flight leader for {key} went away, retrying");
          let mut state = self.state.lock().await;
          let stale = state
            .in_flight
            .get(&key)
            .is_some_and(|s| s.same_channel(&rx));
          if stale {
            state.in_flight.remove(&key);
          }
          break;
        }
      }
    }
  }

  async fn lead(
    &self,
    criteria: &FilterCriteria,
    key: String,
    generation: u64,
    tx: watch::Sender<Option<SharedResult>>,
  ) -> Result<Arc<PoiPage>, PoiSourceError> {
    log::debug!("cache_miss: {key}, fetching from {}", self.fetcher.name());
    let result = self.fetcher.fetch_page(criteria).await;

    let shared: SharedResult = {
      let mut state = self.state.lock().await;
      state.in_flight.remove(&key);
      match result {
        Ok(page) => {
          let page = Arc::new(page);
          state.cache.insert(
            key,
            CacheEntry {
              page: Arc::clone(&page),
              fetched_at: Instant::now(),
            },
          );
          Ok(page)
        }
        Err(e) => {
          log::warn!("POI fetch for {key} failed: {e}");
          Err(e.to_string())
        }
      }
    };

    let _ = tx.send(Some(shared.clone()));
    self.guard(generation, shared)
  }

  /// Begins (or continues) the generation for `key`: a key different
  /// from the latest requested one invalidates all pending fetches.
  fn begin(&self, key: &str) -> u64 {
    let mut latest = self.latest.lock().unwrap();
    if latest.key != key {
      latest.generation += 1;
      latest.key = key.to_string();
    }
    latest.generation
  }

  fn guard(
    &self,
    generation: u64,
    result: SharedResult,
  ) -> Result<Arc<PoiPage>, PoiSourceError> {
    if self.latest.lock().unwrap().generation != generation {
      return Err(PoiSourceError::Superseded);
    }
    result.map_err(PoiSourceError::FetchFailed)
  }
}
