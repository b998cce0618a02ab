use std::sync::Arc;

use super::cluster::{ClusterAggregator, ClusterOutcome};
use super::feature::{Feature, FeatureCollection, feature_collection};
use super::heatmap::{self, HeatmapPoint};
use super::popup::{PopupController, PopupSelection};
use super::projector;
use super::stats::MapStats;
use super::viewport::{GeoBounds, Viewport};
use crate::config::Config;
use crate::poi::record::{PoiPage, PoiRecord};
use crate::poi::remote::PoiFetcher;
use crate::poi::source::{PoiDataSource, PoiSourceError};
use crate::state::{FilterState, MapViewState};

/// Render-ready output of one pipeline run, handed to the map-rendering
/// collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct MapLayers {
  /// The admitted feature set, in record order.
  pub features: Vec<Feature>,
  /// Partition of `features` into clusters and singletons.
  pub clustering: ClusterOutcome,
  /// Weighted points for the heatmap layer; empty when toggled off.
  pub heatmap: Vec<HeatmapPoint>,
  pub stats: MapStats,
}

impl MapLayers {
  /// GeoJSON view of the point layer.
  #[must_use]
  pub fn feature_collection(&self) -> FeatureCollection<'_> {
    feature_collection(&self.features)
  }

  /// Bounds enclosing every admitted feature, for fit-to-data zooming.
  /// Invalid when the layer set is empty.
  #[must_use]
  pub fn bounds(&self) -> GeoBounds {
    GeoBounds::from_iterator(self.features.iter().map(|f| f.coordinate))
  }
}

/// Composition root of the POI map pipeline.
///
/// Owns the state containers, the data source and the popup controller.
/// Only [`MapPipeline::refresh`] suspends (the network boundary); every
/// derivation in [`MapPipeline::rebuild`] is synchronous and runs to
/// completion, so intermediate state is never visible. The embedding
/// event loop calls `refresh` when the query filters change and
/// `rebuild` when the viewport or map view changes or new data arrived.
pub struct MapPipeline {
  filter: FilterState,
  view: MapViewState,
  source: PoiDataSource,
  popup: PopupController,
  aggregator: ClusterAggregator,
  zoom_bounds: (f32, f32),
  page: Option<Arc<PoiPage>>,
  features: Vec<Feature>,
  fetch_error: Option<String>,
}

impl MapPipeline {
  #[must_use]
  pub fn new(config: &Config, fetcher: Arc<dyn PoiFetcher>) -> Self {
    Self::with_states(
      config,
      fetcher,
      FilterState::default(),
      MapViewState::default(),
    )
  }

  /// Builds the pipeline around externally-owned state containers, so
  /// several UI surfaces can share them.
  #[must_use]
  pub fn with_states(
    config: &Config,
    fetcher: Arc<dyn PoiFetcher>,
    filter: FilterState,
    view: MapViewState,
  ) -> Self {
    Self {
      filter,
      view,
      source: PoiDataSource::new(fetcher, config.cache_staleness()),
      popup: PopupController::default(),
      aggregator: ClusterAggregator::new(config.cluster_radius_px()),
      zoom_bounds: config.zoom_bounds(),
      page: None,
      features: Vec::new(),
      fetch_error: None,
    }
  }

  #[must_use]
  pub fn filter(&self) -> &FilterState {
    &self.filter
  }

  #[must_use]
  pub fn view(&self) -> &MapViewState {
    &self.view
  }

  /// A viewport with the zoom clamped to the configured bounds.
  #[must_use]
  pub fn viewport(&self, bounds: GeoBounds, zoom: f32) -> Viewport {
    Viewport::new(bounds, zoom, self.zoom_bounds.0, self.zoom_bounds.1)
  }

  /// The separately-signaled fetch error state, for a toast or banner.
  #[must_use]
  pub fn fetch_error(&self) -> Option<&str> {
    self.fetch_error.as_deref()
  }

  #[must_use]
  pub fn selection(&self) -> &PopupSelection {
    self.popup.selection()
  }

  /// Selection callback: open the popup for the admitted feature `id`.
  pub fn select(&mut self, id: u64) -> bool {
    self.popup.select_by_id(&self.features, id)
  }

  /// Close callback for the popup.
  pub fn close_popup(&mut self) {
    self.popup.close();
  }

  /// Fetches records for the current filter snapshot and applies them.
  ///
  /// Returns whether the visible record set was replaced. A superseded
  /// response is dropped without touching state. On failure the policy
  /// is stale-while-error: the last good page for the same criteria is
  /// kept (or restored), otherwise whatever was last on screen stays,
  /// and the error is signaled through [`MapPipeline::fetch_error`].
  pub async fn refresh(&mut self) -> bool {
    let criteria = self.filter.snapshot();
    match self.source.fetch(&criteria).await {
      Ok(page) => {
        self.page = Some(page);
        self.fetch_error = None;
        true
      }
      Err(PoiSourceError::Superseded) => {
        log::debug!("discarding superseded fetch result");
        false
      }
      Err(PoiSourceError::FetchFailed(message)) => {
        if let Some(page) = self.source.last_good(&criteria).await {
          self.page = Some(page);
        }
        self.fetch_error = Some(message);
        false
      }
    }
  }

  /// Recomputes every derived layer for the viewport.
  ///
  /// Pure with respect to (records, map view, viewport): recomputing from
  /// scratch always yields the same layers. Also applies the
  /// stale-selection guard to the popup.
  pub fn rebuild(&mut self, viewport: &Viewport) -> MapLayers {
    let view = self.view.snapshot();
    let records: &[PoiRecord] = self.page.as_deref().map_or(&[], |p| &p.records);

    let features = projector::project(records, &view.visibility);
    let stats = MapStats::derive(records, &features);
    self.popup.retain_valid(&features);

    let clustering = if view.visibility.show_clusters {
      self.aggregator.aggregate(&features, viewport)
    } else {
      // Clusters toggled off: the whole set renders as plain points.
      ClusterOutcome {
        clusters: Vec::new(),
        singletons: features.clone(),
      }
    };
    let heatmap = if view.visibility.show_heatmap {
      heatmap::intensity(&features)
    } else {
      Vec::new()
    };

    self.features = features.clone();
    MapLayers {
      features,
      clustering,
      heatmap,
      stats,
    }
  }
}
