use serde::{Deserialize, Serialize};

use super::coordinates::Wgs84Coordinate;

/// Geographic bounds in decimal degrees, west/south/east/north.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
  pub west: f32,
  pub south: f32,
  pub east: f32,
  pub north: f32,
}

impl Default for GeoBounds {
  fn default() -> Self {
    Self::get_invalid()
  }
}

impl GeoBounds {
  #[must_use]
  pub fn new(west: f32, south: f32, east: f32, north: f32) -> Self {
    Self {
      west,
      south,
      east,
      north,
    }
  }

  #[must_use]
  pub fn get_invalid() -> Self {
    Self {
      west: f32::MAX,
      south: f32::MAX,
      east: f32::MIN,
      north: f32::MIN,
    }
  }

  #[must_use]
  pub fn is_valid(&self) -> bool {
    self.west <= self.east
      && self.south <= self.north
      && Wgs84Coordinate::new(self.south, self.west).is_valid()
      && Wgs84Coordinate::new(self.north, self.east).is_valid()
  }

  pub fn add_coordinate(&mut self, coord: Wgs84Coordinate) {
    self.west = self.west.min(coord.lon);
    self.east = self.east.max(coord.lon);
    self.south = self.south.min(coord.lat);
    self.north = self.north.max(coord.lat);
  }

  pub fn from_iterator<I: IntoIterator<Item = Wgs84Coordinate>>(coords: I) -> Self {
    let mut bounds = Self::get_invalid();
    coords
      .into_iter()
      .for_each(|c| bounds.add_coordinate(c));
    bounds
  }

  #[must_use]
  pub fn extend(self, other: &Self) -> Self {
    if !self.is_valid() {
      return *other;
    }
    if !other.is_valid() {
      return self;
    }
    Self {
      west: self.west.min(other.west),
      south: self.south.min(other.south),
      east: self.east.max(other.east),
      north: self.north.max(other.north),
    }
  }

}

/// The visible map region: geographic bounds plus a zoom level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
  pub bounds: GeoBounds,
  pub zoom: f32,
}

impl Viewport {
  /// Builds a viewport with the zoom clamped to `[min_zoom, max_zoom]`.
  #[must_use]
  pub fn new(bounds: GeoBounds, zoom: f32, min_zoom: f32, max_zoom: f32) -> Self {
    Self {
      bounds,
      zoom: zoom.clamp(min_zoom, max_zoom),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use assert_approx_eq::assert_approx_eq;

  #[test]
  fn bounds_grow_with_coordinates() {
    let mut bounds = GeoBounds::get_invalid();
    assert!(!bounds.is_valid());

    bounds.add_coordinate(Wgs84Coordinate::new(-23.5, -46.6));
    bounds.add_coordinate(Wgs84Coordinate::new(-22.9, -43.2));
    assert!(bounds.is_valid());
    assert_approx_eq!(bounds.west, -46.6);
    assert_approx_eq!(bounds.east, -43.2);
    assert_approx_eq!(bounds.south, -23.5);
    assert_approx_eq!(bounds.north, -22.9);
  }

  #[test]
  fn extend_ignores_invalid_sides() {
    let valid = GeoBounds::from_iterator([Wgs84Coordinate::new(1., 1.), Wgs84Coordinate::new(2., 2.)]);
    let extended = GeoBounds::get_invalid().extend(&valid);
    assert_eq!(extended, valid);
    let extended = valid.extend(&GeoBounds::get_invalid());
    assert_eq!(extended, valid);
  }

  #[test]
  fn viewport_clamps_zoom() {
    let bounds = GeoBounds::new(-1., -1., 1., 1.);
    assert_approx_eq!(Viewport::new(bounds, 25., 0., 19.).zoom, 19.);
    assert_approx_eq!(Viewport::new(bounds, -3., 0., 19.).zoom, 0.);
    assert_approx_eq!(Viewport::new(bounds, 12.5, 0., 19.).zoom, 12.5);
  }
}
