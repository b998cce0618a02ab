use std::collections::HashMap;

use super::coordinates::{self, Wgs84Coordinate};
use super::feature::Feature;

/// Zoom level of the density grid: one cell per pixel at this zoom,
/// roughly 19 m at the equator.
const GRID_ZOOM: f32 = 13.;

/// One weighted input point for the heatmap layer.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapPoint {
  pub coordinate: Wgs84Coordinate,
  /// Normalized density: the densest cell maps to 1.0.
  pub weight: f32,
}

#[derive(Default)]
struct Cell {
  lat_sum: f32,
  lon_sum: f32,
  count: usize,
}

/// Bins features on a fixed pixel grid and normalizes the counts.
///
/// Every feature contributes unit weight at its coordinate; breeding type,
/// status and recency never influence intensity — density reflects raw
/// occurrence. Output order follows first appearance, so identical input
/// yields identical output.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn intensity(features: &[Feature]) -> Vec<HeatmapPoint> {
  let mut order: Vec<(i64, i64)> = Vec::new();
  let mut cells: HashMap<(i64, i64), Cell> = HashMap::new();

  for feature in features {
    let pixel = coordinates::project(feature.coordinate, GRID_ZOOM);
    let key = (pixel.x.floor() as i64, pixel.y.floor() as i64);
    let cell = cells.entry(key).or_insert_with(|| {
      order.push(key);
      Cell::default()
    });
    cell.lat_sum += feature.coordinate.lat;
    cell.lon_sum += feature.coordinate.lon;
    cell.count += 1;
  }

  let max_count = cells.values().map(|c| c.count).max().unwrap_or(0);
  if max_count == 0 {
    return Vec::new();
  }

  order
    .iter()
    .map(|key| {
      let cell = &cells[key];
      let n = cell.count as f32;
      HeatmapPoint {
        coordinate: Wgs84Coordinate::new(cell.lat_sum / n, cell.lon_sum / n),
        weight: cell.count as f32 / max_count as f32,
      }
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::poi::record::{BreedingType, PoiRecord, ReturnStatus};
  use assert_approx_eq::assert_approx_eq;
  use chrono::{TimeZone, Utc};

  fn feature(id: u64, lat: f32, lon: f32, breeding_type: BreedingType) -> Feature {
    Feature::from_record(&PoiRecord {
      id,
      latitude: lat,
      longitude: lon,
      breeding_type,
      return_status: ReturnStatus::Treated,
      identified_at: Utc.with_ymd_and_hms(2024, 11, 3, 12, 0, 0).unwrap(),
      activity_id: None,
      notes: None,
      photo_url: None,
    })
  }

  #[test]
  fn empty_input_yields_empty_surface() {
    assert!(intensity(&[]).is_empty());
  }

  #[test]
  fn coincident_features_stack_to_full_intensity() {
    let features = vec![
      feature(1, -23.55, -46.63, BreedingType::Tire),
      feature(2, -23.55, -46.63, BreedingType::Pool),
      feature(3, -23.55, -46.63, BreedingType::Other),
    ];
    let surface = intensity(&features);
    assert_eq!(surface.len(), 1);
    assert_approx_eq!(surface[0].weight, 1.0);
    assert_approx_eq!(surface[0].coordinate.lat, -23.55, 1e-4);
  }

  #[test]
  fn weights_are_relative_to_the_densest_cell() {
    let features = vec![
      feature(1, -23.55, -46.63, BreedingType::Tire),
      feature(2, -23.55, -46.63, BreedingType::Tire),
      // Far away from the first cell.
      feature(3, 10., 10., BreedingType::Tire),
    ];
    let surface = intensity(&features);
    assert_eq!(surface.len(), 2);
    assert_approx_eq!(surface[0].weight, 1.0);
    assert_approx_eq!(surface[1].weight, 0.5);
  }

  #[test]
  fn classification_does_not_change_intensity() {
    let mixed = vec![
      feature(1, 0., 0., BreedingType::Tire),
      feature(2, 0., 0., BreedingType::Other),
    ];
    let uniform = vec![
      feature(1, 0., 0., BreedingType::Tire),
      feature(2, 0., 0., BreedingType::Tire),
    ];
    let weights = |features: &[Feature]| {
      intensity(features)
        .iter()
        .map(|p| p.weight)
        .collect::<Vec<_>>()
    };
    assert_eq!(weights(&mixed), weights(&uniform));
  }

  #[test]
  fn is_deterministic() {
    let features = vec![
      feature(1, 1., 1., BreedingType::Tire),
      feature(2, 2., 2., BreedingType::Pool),
      feature(3, 1., 1., BreedingType::Trash),
    ];
    assert_eq!(intensity(&features), intensity(&features));
  }
}
