use serde::Serialize;

use super::feature::Feature;
use crate::poi::record::PoiRecord;

/// Total-vs-filtered counts for the stats display, recomputed on every
/// pipeline run. `filtered_count <= total_fetched` always holds because
/// projection only ever drops records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapStats {
  /// Size of the most recent raw record set, before visibility filtering.
  pub total_fetched: usize,
  /// Size of the admitted feature set after projection.
  pub filtered_count: usize,
}

impl MapStats {
  #[must_use]
  pub fn derive(records: &[PoiRecord], features: &[Feature]) -> Self {
    debug_assert!(features.len() <= records.len());
    Self {
      total_fetched: records.len(),
      filtered_count: features.len(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::map::projector;
  use crate::poi::record::{BreedingType, ReturnStatus};
  use crate::state::MapVisibilityFilter;
  use chrono::{TimeZone, Utc};

  fn record(id: u64, breeding_type: BreedingType) -> PoiRecord {
    PoiRecord {
      id,
      latitude: -23.55,
      longitude: -46.63,
      breeding_type,
      return_status: ReturnStatus::Pending,
      identified_at: Utc.with_ymd_and_hms(2024, 11, 3, 12, 0, 0).unwrap(),
      activity_id: None,
      notes: None,
      photo_url: None,
    }
  }

  #[test]
  fn empty_set_yields_zero_counts() {
    let stats = MapStats::derive(&[], &[]);
    assert_eq!(stats.total_fetched, 0);
    assert_eq!(stats.filtered_count, 0);
  }

  #[test]
  fn filtered_count_stays_within_total() {
    let records = vec![
      record(1, BreedingType::Tire),
      record(2, BreedingType::Pool),
      record(3, BreedingType::Tire),
    ];
    let mut visibility = MapVisibilityFilter::default();
    visibility.breeding_types.insert(BreedingType::Tire);
    let features = projector::project(&records, &visibility);

    let stats = MapStats::derive(&records, &features);
    assert_eq!(stats.total_fetched, 3);
    assert_eq!(stats.filtered_count, 2);
    assert!(stats.filtered_count <= stats.total_fetched);
  }
}
