use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::map::coordinates::Wgs84Coordinate;

/// Category tag classifying the kind of breeding site.
#[derive(
  Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "kebab-case")]
pub enum BreedingType {
  Tire,
  WaterTank,
  Gutter,
  Pool,
  Trash,
  /// Unrecognized tags degrade to `Other` instead of failing the record.
  #[default]
  #[serde(other)]
  Other,
}

impl BreedingType {
  #[must_use]
  pub fn name(&self) -> &'static str {
    match self {
      BreedingType::Tire => "Tire",
      BreedingType::WaterTank => "Water tank",
      BreedingType::Gutter => "Gutter",
      BreedingType::Pool => "Pool",
      BreedingType::Trash => "Trash",
      BreedingType::Other => "Other",
    }
  }

  #[must_use]
  pub fn all() -> &'static [BreedingType] {
    &[
      BreedingType::Tire,
      BreedingType::WaterTank,
      BreedingType::Gutter,
      BreedingType::Pool,
      BreedingType::Trash,
      BreedingType::Other,
    ]
  }
}

/// Lifecycle tag for follow-up handling of a POI.
#[derive(
  Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "kebab-case")]
pub enum ReturnStatus {
  #[default]
  Pending,
  InAnalysis,
  Treated,
  Discarded,
}

impl ReturnStatus {
  #[must_use]
  pub fn name(&self) -> &'static str {
    match self {
      ReturnStatus::Pending => "Pending",
      ReturnStatus::InAnalysis => "In analysis",
      ReturnStatus::Treated => "Treated",
      ReturnStatus::Discarded => "Discarded",
    }
  }

  #[must_use]
  pub fn all() -> &'static [ReturnStatus] {
    &[
      ReturnStatus::Pending,
      ReturnStatus::InAnalysis,
      ReturnStatus::Treated,
      ReturnStatus::Discarded,
    ]
  }
}

/// One field observation of a potential breeding site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoiRecord {
  pub id: u64,
  pub latitude: f32,
  pub longitude: f32,
  pub breeding_type: BreedingType,
  pub return_status: ReturnStatus,
  pub identified_at: DateTime<Utc>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub activity_id: Option<u64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub notes: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub photo_url: Option<String>,
}

impl PoiRecord {
  #[must_use]
  pub fn coordinate(&self) -> Wgs84Coordinate {
    Wgs84Coordinate::new(self.latitude, self.longitude)
  }
}

/// A closed date interval. `from <= to` is enforced where the range is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
  pub from: DateTime<Utc>,
  pub to: DateTime<Utc>,
}

impl DateRange {
  #[must_use]
  pub fn is_ordered(&self) -> bool {
    self.from <= self.to
  }
}

/// Query-relevant filter criteria; drives the data fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
  pub municipality_id: Option<u32>,
  pub contract_id: Option<u32>,
  pub date_range: Option<DateRange>,
}

impl FilterCriteria {
  /// Canonical cache key. Two equal criteria values always produce the
  /// same key, regardless of how they were assembled.
  #[must_use]
  pub fn cache_key(&self) -> String {
    let municipality = self
      .municipality_id
      .map_or_else(|| "-".to_string(), |id| id.to_string());
    let contract = self
      .contract_id
      .map_or_else(|| "-".to_string(), |id| id.to_string());
    let range = self.date_range.map_or_else(
      || "-".to_string(),
      |r| format!("{}..{}", r.from.timestamp(), r.to.timestamp()),
    );
    [
      format!("m={municipality}"),
      format!("c={contract}"),
      format!("d={range}"),
    ]
    .iter()
    .join(";")
  }
}

/// Inbound paginated list contract from the HTTP collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoiPage {
  pub records: Vec<PoiRecord>,
  pub total: u64,
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  #[test]
  fn breeding_type_wire_tags() {
    assert_eq!(
      serde_json::from_str::<BreedingType>("\"water-tank\"").unwrap(),
      BreedingType::WaterTank
    );
    assert_eq!(
      serde_json::to_string(&BreedingType::WaterTank).unwrap(),
      "\"water-tank\""
    );
  }

  #[test]
  fn unknown_breeding_type_degrades_to_other() {
    assert_eq!(
      serde_json::from_str::<BreedingType>("\"abandoned-fountain\"").unwrap(),
      BreedingType::Other
    );
  }

  #[test]
  fn record_parses_with_optional_fields_missing() {
    let record: PoiRecord = serde_json::from_str(
      r#"{
        "id": 7,
        "latitude": -23.55,
        "longitude": -46.63,
        "breedingType": "tire",
        "returnStatus": "in-analysis",
        "identifiedAt": "2024-11-03T12:00:00Z"
      }"#,
    )
    .unwrap();
    assert_eq!(record.id, 7);
    assert_eq!(record.breeding_type, BreedingType::Tire);
    assert_eq!(record.return_status, ReturnStatus::InAnalysis);
    assert_eq!(record.activity_id, None);
    assert_eq!(record.notes, None);
  }

  #[test]
  fn cache_key_is_stable_and_distinguishes_criteria() {
    let empty = FilterCriteria::default();
    assert_eq!(empty.cache_key(), empty.clone().cache_key());

    let range = DateRange {
      from: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
      to: Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(),
    };
    let full = FilterCriteria {
      municipality_id: Some(12),
      contract_id: Some(3),
      date_range: Some(range),
    };
    assert_eq!(full.cache_key(), full.clone().cache_key());
    assert_ne!(full.cache_key(), empty.cache_key());

    let other_contract = FilterCriteria {
      contract_id: Some(4),
      ..full.clone()
    };
    assert_ne!(full.cache_key(), other_contract.cache_key());
  }

  #[test]
  fn date_range_ordering() {
    let from = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    let to = Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap();
    assert!(DateRange { from, to }.is_ordered());
    assert!(DateRange { from, to: from }.is_ordered());
    assert!(!DateRange { from: to, to: from }.is_ordered());
  }
}
