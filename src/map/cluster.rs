use std::hash::{DefaultHasher, Hash, Hasher};

use super::coordinates::{self, PixelCoordinate, Wgs84Coordinate};
use super::feature::Feature;
use super::viewport::Viewport;

/// A spatial grouping of nearby features rendered as one aggregate marker.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
  /// Hash of the member id set: identical membership always yields the
  /// same id, so ids are stable while panning. Zoom changes regroup
  /// members and therefore mint new ids; treat them as per-frame diff
  /// keys, not long-lived identifiers.
  pub id: u64,
  /// Arithmetic mean of the member coordinates.
  pub centroid: Wgs84Coordinate,
  pub point_count: usize,
  pub member_ids: Vec<u64>,
}

/// One item of the tagged rendering stream.
#[derive(Debug, Clone, PartialEq)]
pub enum MapLayerItem {
  Point(Feature),
  Cluster(Cluster),
}

/// The clustering result. `clusters` and `singletons` together partition
/// the admitted feature set: every feature lands in exactly one of them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClusterOutcome {
  pub clusters: Vec<Cluster>,
  pub singletons: Vec<Feature>,
}

impl ClusterOutcome {
  /// Features rendered individually, clusters as aggregate markers.
  pub fn items(&self) -> impl Iterator<Item = MapLayerItem> + '_ {
    self
      .singletons
      .iter()
      .cloned()
      .map(MapLayerItem::Point)
      .chain(self.clusters.iter().cloned().map(MapLayerItem::Cluster))
  }

  /// Number of features covered by the partition.
  #[must_use]
  pub fn feature_count(&self) -> usize {
    self.singletons.len() + self.clusters.iter().map(|c| c.point_count).sum::<usize>()
  }

  #[must_use]
  fn all_singletons(features: &[Feature]) -> Self {
    Self {
      clusters: Vec::new(),
      singletons: features.to_vec(),
    }
  }
}

struct Bucket {
  members: Vec<Feature>,
  pixel_sum: PixelCoordinate,
  lat_sum: f32,
  lon_sum: f32,
}

impl Bucket {
  fn seed(feature: Feature, pixel: PixelCoordinate) -> Self {
    let coordinate = feature.coordinate;
    Self {
      members: vec![feature],
      pixel_sum: pixel,
      lat_sum: coordinate.lat,
      lon_sum: coordinate.lon,
    }
  }

  fn push(&mut self, feature: Feature, pixel: PixelCoordinate) {
    self.pixel_sum.x += pixel.x;
    self.pixel_sum.y += pixel.y;
    self.lat_sum += feature.coordinate.lat;
    self.lon_sum += feature.coordinate.lon;
    self.members.push(feature);
  }

  /// Running arithmetic mean of the member pixel positions.
  #[allow(clippy::cast_precision_loss)]
  fn centroid_px(&self) -> PixelCoordinate {
    let n = self.members.len() as f32;
    PixelCoordinate::new(self.pixel_sum.x / n, self.pixel_sum.y / n)
  }

  #[allow(clippy::cast_precision_loss)]
  fn into_cluster(self) -> Cluster {
    let n = self.members.len() as f32;
    let member_ids: Vec<u64> = self.members.iter().map(|f| f.id).collect();
    Cluster {
      id: membership_id(&member_ids),
      centroid: Wgs84Coordinate::new(self.lat_sum / n, self.lon_sum / n),
      point_count: self.members.len(),
      member_ids,
    }
  }
}

fn membership_id(member_ids: &[u64]) -> u64 {
  let mut sorted = member_ids.to_vec();
  sorted.sort_unstable();
  let mut hasher = DefaultHasher::new();
  sorted.hash(&mut hasher);
  hasher.finish()
}

/// Grid-free greedy radius clustering in pixel space.
pub struct ClusterAggregator {
  radius_px: f32,
}

impl ClusterAggregator {
  #[must_use]
  pub fn new(radius_px: f32) -> Self {
    Self { radius_px }
  }

  /// Partitions `features` into clusters and singletons for the viewport.
  ///
  /// Features are swept in input order; each one merges into the first
  /// bucket whose running centroid lies within the radius at the
  /// viewport zoom, otherwise it seeds a new bucket. Buckets with one
  /// member are reported as singletons. Pure in both inputs: the same
  /// feature set and viewport always produce the same partition.
  #[must_use]
  pub fn aggregate(&self, features: &[Feature], viewport: &Viewport) -> ClusterOutcome {
    let radius_sq = self.radius_px * self.radius_px;
    let mut buckets: Vec<Bucket> = Vec::new();

    for feature in features {
      let pixel = coordinates::project(feature.coordinate, viewport.zoom);
      if !pixel.is_finite() || !radius_sq.is_finite() {
        log::warn!(
          "Non-finite pixel projection at zoom {}; rendering all features unclustered",
          viewport.zoom
        );
        return ClusterOutcome::all_singletons(features);
      }
      match buckets
        .iter_mut()
        .find(|b| b.centroid_px().sq_dist(&pixel) <= radius_sq)
      {
        Some(bucket) => bucket.push(feature.clone(), pixel),
        None => buckets.push(Bucket::seed(feature.clone(), pixel)),
      }
    }

    let mut outcome = ClusterOutcome::default();
    for bucket in buckets {
      if bucket.members.len() == 1 {
        let mut members = bucket.members;
        outcome.singletons.push(members.remove(0));
      } else {
        outcome.clusters.push(bucket.into_cluster());
      }
    }
    outcome
  }
}
