use chrono::{DateTime, Utc};
use serde::Serialize;

use super::coordinates::Wgs84Coordinate;
use crate::poi::record::{BreedingType, PoiRecord, ReturnStatus};

/// The single designated fallback marker color, used for `Other` and any
/// unrecognized breeding type.
pub const FALLBACK_COLOR: &str = "#9e9e9e";

/// Deterministic breeding-type to marker-color table.
#[must_use]
pub fn color_for(breeding_type: BreedingType) -> &'static str {
  match breeding_type {
    BreedingType::Tire => "#37474f",
    BreedingType::WaterTank => "#1976d2",
    BreedingType::Gutter => "#8d6e63",
    BreedingType::Pool => "#00acc1",
    BreedingType::Trash => "#7b1fa2",
    BreedingType::Other => FALLBACK_COLOR,
  }
}

/// A render-ready point derived from one admitted POI record. Immutable
/// once produced; the whole set is re-derived on every projection pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
  pub id: u64,
  pub coordinate: Wgs84Coordinate,
  pub color: &'static str,
  pub breeding_type: BreedingType,
  pub return_status: ReturnStatus,
  pub identified_at: DateTime<Utc>,
  pub notes: Option<String>,
  pub photo_url: Option<String>,
}

impl Feature {
  #[must_use]
  pub fn from_record(record: &PoiRecord) -> Self {
    Self {
      id: record.id,
      coordinate: record.coordinate(),
      color: color_for(record.breeding_type),
      breeding_type: record.breeding_type,
      return_status: record.return_status,
      identified_at: record.identified_at,
      notes: record.notes.clone(),
      photo_url: record.photo_url.clone(),
    }
  }
}

#[derive(Serialize)]
struct GeoJsonGeometry {
  r#type: &'static str,
  /// GeoJSON position order: longitude first.
  coordinates: [f32; 2],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeoJsonProperties<'a> {
  id: u64,
  breeding_type: BreedingType,
  return_status: ReturnStatus,
  identified_at: DateTime<Utc>,
  color: &'a str,
  #[serde(skip_serializing_if = "Option::is_none")]
  notes: Option<&'a str>,
  #[serde(skip_serializing_if = "Option::is_none")]
  photo_url: Option<&'a str>,
}

#[derive(Serialize)]
struct GeoJsonFeature<'a> {
  r#type: &'static str,
  geometry: GeoJsonGeometry,
  properties: GeoJsonProperties<'a>,
}

/// GeoJSON-compatible `FeatureCollection` for the rendering collaborator.
#[derive(Serialize)]
pub struct FeatureCollection<'a> {
  r#type: &'static str,
  features: Vec<GeoJsonFeature<'a>>,
}

/// Serializes features as a GeoJSON `FeatureCollection` of points.
#[must_use]
pub fn feature_collection(features: &[Feature]) -> FeatureCollection<'_> {
  FeatureCollection {
    r#type: "FeatureCollection",
    features: features
      .iter()
      .map(|f| GeoJsonFeature {
        r#type: "Feature",
        geometry: GeoJsonGeometry {
          r#type: "Point",
          coordinates: [f.coordinate.lon, f.coordinate.lat],
        },
        properties: GeoJsonProperties {
          id: f.id,
          breeding_type: f.breeding_type,
          return_status: f.return_status,
          identified_at: f.identified_at,
          color: f.color,
          notes: f.notes.as_deref(),
          photo_url: f.photo_url.as_deref(),
        },
      })
      .collect(),
  }
}
