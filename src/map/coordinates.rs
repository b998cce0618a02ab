use serde::{Deserialize, Serialize};

/// Tile edge length used for the Web Mercator pixel grid.
pub const TILE_SIZE: f32 = 256.;

/// Latitudes beyond this cannot be represented in Web Mercator and are
/// clamped before projection.
pub const MAX_MERCATOR_LAT: f32 = 85.051_13;

const PI: f32 = std::f32::consts::PI;

/// The standard WGS84 coordinate system.
#[derive(Debug, Default, PartialEq, Copy, Clone, Serialize, Deserialize)]
pub struct Wgs84Coordinate {
  #[serde(alias = "latitude")]
  pub lat: f32,
  #[serde(alias = "longitude")]
  pub lon: f32,
}

impl Wgs84Coordinate {
  #[must_use]
  pub fn new(lat: f32, lon: f32) -> Self {
    Self { lat, lon }
  }

  /// Closed ranges: the poles and the antimeridian are valid observations.
  #[must_use]
  pub fn is_valid(&self) -> bool {
    (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lon)
  }
}

/// World pixel space of the Web Mercator projection at a given zoom level.
#[derive(Debug, Default, PartialEq, Copy, Clone)]
pub struct PixelCoordinate {
  pub x: f32,
  pub y: f32,
}

impl PixelCoordinate {
  #[must_use]
  pub fn new(x: f32, y: f32) -> Self {
    Self { x, y }
  }

  #[must_use]
  pub fn is_finite(&self) -> bool {
    self.x.is_finite() && self.y.is_finite()
  }

  #[must_use]
  pub fn sq_dist(&self, p: &Self) -> f32 {
    let dx = p.x - self.x;
    let dy = p.y - self.y;
    dx * dx + dy * dy
  }
}

/// Projects a geographic coordinate to world pixel space at `zoom`.
#[must_use]
pub fn project(coord: Wgs84Coordinate, zoom: f32) -> PixelCoordinate {
  let scale = TILE_SIZE * 2f32.powf(zoom);
  let lat_rad = coord
    .lat
    .clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT)
    .to_radians();
  PixelCoordinate {
    x: (coord.lon + 180.) / 360. * scale,
    y: (1. - (lat_rad.tan() + 1. / lat_rad.cos()).ln() / PI) / 2. * scale,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use assert_approx_eq::assert_approx_eq;
  use rstest::rstest;

  #[rstest]
  #[case(2., 512.)]
  #[case(3., 1024.)]
  #[case(10., 131_072.)]
  fn null_island_projects_to_center(#[case] zoom: f32, #[case] expected: f32) {
    let p = project(Wgs84Coordinate::new(0., 0.), zoom);
    assert_approx_eq!(p.x, expected);
    assert_approx_eq!(p.y, expected);
  }

  #[test]
  fn projection_is_monotonic_in_lon() {
    let west = project(Wgs84Coordinate::new(10., -20.), 5.);
    let east = project(Wgs84Coordinate::new(10., 20.), 5.);
    assert!(west.x < east.x);
    assert_approx_eq!(west.y, east.y);
  }

  #[test]
  fn poles_stay_finite() {
    let p = project(Wgs84Coordinate::new(90., 0.), 10.);
    assert!(p.is_finite());
    let p = project(Wgs84Coordinate::new(-90., 0.), 10.);
    assert!(p.is_finite());
  }

  #[rstest]
  #[case(90., 180., true)]
  #[case(-90., -180., true)]
  #[case(90.01, 0., false)]
  #[case(0., -180.01, false)]
  #[case(0., 180.01, false)]
  fn coordinate_validity(#[case] lat: f32, #[case] lon: f32, #[case] valid: bool) {
    assert_eq!(Wgs84Coordinate::new(lat, lon).is_valid(), valid);
  }

  #[test]
  fn sq_dist() {
    let a = PixelCoordinate::new(1., 2.);
    let b = PixelCoordinate::new(4., 6.);
    assert_approx_eq!(a.sq_dist(&b), 25.);
  }
}
