use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::poi::record::{BreedingType, DateRange, FilterCriteria, ReturnStatus};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum StateError {
  #[error("date range start {from} is after end {to}")]
  InvalidDateRange {
    from: DateTime<Utc>,
    to: DateTime<Utc>,
  },
}

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// An explicit shared state container: `get` a snapshot, `set`/`update`
/// the value, `subscribe` to changes. Owned by the composition root and
/// handed to collaborators by cloning the handle; there is no hidden
/// process-wide instance.
///
/// Mutations commit atomically before listeners run, so a reader never
/// observes a half-updated value; listeners are then notified
/// synchronously with the new snapshot.
pub struct Store<T> {
  value: Arc<Mutex<T>>,
  listeners: Arc<Mutex<Vec<Listener<T>>>>,
}

impl<T> Clone for Store<T> {
  fn clone(&self) -> Self {
    Self {
      value: Arc::clone(&self.value),
      listeners: Arc::clone(&self.listeners),
    }
  }
}

impl<T: Clone> Store<T> {
  #[must_use]
  pub fn new(value: T) -> Self {
    Self {
      value: Arc::new(Mutex::new(value)),
      listeners: Arc::new(Mutex::new(Vec::new())),
    }
  }

  /// The current snapshot.
  #[must_use]
  pub fn get(&self) -> T {
    self.value.lock().unwrap().clone()
  }

  pub fn set(&self, value: T) {
    self.update(|v| *v = value);
  }

  pub fn update(&self, f: impl FnOnce(&mut T)) {
    let snapshot = {
      let mut value = self.value.lock().unwrap();
      f(&mut value);
      value.clone()
    };
    let listeners = self.listeners.lock().unwrap().clone();
    for listener in listeners {
      listener(&snapshot);
    }
  }

  pub fn subscribe(&self, listener: impl Fn(&T) + Send + Sync + 'static) {
    self.listeners.lock().unwrap().push(Arc::new(listener));
  }
}

impl<T: Clone + Default> Default for Store<T> {
  fn default() -> Self {
    Self::new(T::default())
  }
}

/// Query filter state shared between the filter UI and the data fetch.
///
/// Field setters replace whole fields; the date range in particular is
/// replaced as a unit so a new `from` can never be paired with an old
/// `to`.
#[derive(Clone, Default)]
pub struct FilterState {
  store: Store<FilterCriteria>,
}

impl FilterState {
  #[must_use]
  pub fn new(criteria: FilterCriteria) -> Self {
    Self {
      store: Store::new(criteria),
    }
  }

  #[must_use]
  pub fn snapshot(&self) -> FilterCriteria {
    self.store.get()
  }

  pub fn subscribe(&self, listener: impl Fn(&FilterCriteria) + Send + Sync + 'static) {
    self.store.subscribe(listener);
  }

  pub fn set_municipality(&self, municipality_id: Option<u32>) {
    self.store.update(|c| c.municipality_id = municipality_id);
  }

  pub fn set_contract(&self, contract_id: Option<u32>) {
    self.store.update(|c| c.contract_id = contract_id);
  }

  /// Replaces the date range. A reversed range is rejected without
  /// mutating the state or notifying listeners.
  pub fn set_date_range(&self, range: Option<DateRange>) -> Result<(), StateError> {
    if let Some(range) = range
      && !range.is_ordered()
    {
      return Err(StateError::InvalidDateRange {
        from: range.from,
        to: range.to,
      });
    }
    self.store.update(|c| c.date_range = range);
    Ok(())
  }
}

/// Map-only visibility filters and layer toggles. Empty tag sets admit
/// everything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapVisibilityFilter {
  pub breeding_types: BTreeSet<BreedingType>,
  pub return_statuses: BTreeSet<ReturnStatus>,
  pub show_clusters: bool,
  pub show_heatmap: bool,
}

impl Default for MapVisibilityFilter {
  fn default() -> Self {
    Self {
      breeding_types: BTreeSet::new(),
      return_statuses: BTreeSet::new(),
      show_clusters: true,
      show_heatmap: false,
    }
  }
}

impl MapVisibilityFilter {
  #[must_use]
  pub fn admits(&self, breeding_type: BreedingType, return_status: ReturnStatus) -> bool {
    (self.breeding_types.is_empty() || self.breeding_types.contains(&breeding_type))
      && (self.return_statuses.is_empty() || self.return_statuses.contains(&return_status))
  }
}

/// Map display state with a lifecycle independent from the query filters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapView {
  pub visibility: MapVisibilityFilter,
  /// Name of the active base-map tile style from the configured list.
  pub tile_style: String,
}

impl Default for MapView {
  fn default() -> Self {
    Self {
      visibility: MapVisibilityFilter::default(),
      tile_style: "OpenStreetMap".to_string(),
    }
  }
}

/// Shared container for [`MapView`].
#[derive(Clone, Default)]
pub struct MapViewState {
  store: Store<MapView>,
}

impl MapViewState {
  #[must_use]
  pub fn new(view: MapView) -> Self {
    Self {
      store: Store::new(view),
    }
  }

  #[must_use]
  pub fn snapshot(&self) -> MapView {
    self.store.get()
  }

  pub fn subscribe(&self, listener: impl Fn(&MapView) + Send + Sync + 'static) {
    self.store.subscribe(listener);
  }

  pub fn set_breeding_types(&self, breeding_types: BTreeSet<BreedingType>) {
    self
      .store
      .update(|v| v.visibility.breeding_types = breeding_types);
  }

  pub fn set_return_statuses(&self, return_statuses: BTreeSet<ReturnStatus>) {
    self
      .store
      .update(|v| v.visibility.return_statuses = return_statuses);
  }

  pub fn set_show_clusters(&self, show: bool) {
    self.store.update(|v| v.visibility.show_clusters = show);
  }

  pub fn set_show_heatmap(&self, show: bool) {
    self.store.update(|v| v.visibility.show_heatmap = show);
  }

  pub fn set_tile_style(&self, name: String) {
    self.store.update(|v| v.tile_style = name);
  }
}
