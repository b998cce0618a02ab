use super::feature::Feature;
use crate::poi::record::PoiRecord;
use crate::state::MapVisibilityFilter;

/// Pure projection from raw records to render-ready features.
///
/// Order-preserving and referentially transparent: identical inputs yield
/// structurally identical output, which makes the result memoizable
/// upstream. A record is admitted iff its coordinates are in range and
/// the visibility filter allows its breeding type and return status.
/// Records with out-of-range coordinates are dropped with a warning,
/// never coerced.
#[must_use]
pub fn project(records: &[PoiRecord], visibility: &MapVisibilityFilter) -> Vec<Feature> {
  records
    .iter()
    .filter_map(|record| {
      if !record.coordinate().is_valid() {
        log::warn!(
          "Dropping POI {} with out-of-range coordinates ({}, {})",
          record.id,
          record.latitude,
          record.longitude
        );
        return None;
      }
      if !visibility.admits(record.breeding_type, record.return_status) {
        return None;
      }
      Some(Feature::from_record(record))
    })
    .collect()
}
