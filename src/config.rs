use std::path::PathBuf;
use std::time::Duration;

use dirs::home_dir;
use log::error;

/// Default clustering radius in screen pixels. Anything in the 40–80 px
/// band reads well; 60 is the product default.
pub const DEFAULT_CLUSTER_RADIUS_PX: f32 = 60.;

/// Default staleness window for cached POI fetches.
pub const DEFAULT_CACHE_STALENESS_SECS: u64 = 300;

const DEFAULT_TILE_URL: &str = "https://tile.openstreetmap.org/{zoom}/{x}/{y}.png";
const DEFAULT_MIN_ZOOM: f32 = 0.;
const DEFAULT_MAX_ZOOM: f32 = 19.;

/// A configured base-map tile style the map view can switch between.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct TileStyle {
  pub name: String,
  pub url: String,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Config {
  pub config_path: Option<PathBuf>,
  pub api_base_url: Option<String>,
  pub cluster_radius_px: Option<f32>,
  pub cache_staleness_secs: Option<u64>,
  pub min_zoom: Option<f32>,
  pub max_zoom: Option<f32>,
  pub tile_styles: Vec<TileStyle>,
}

impl Config {
  #[must_use]
  pub fn new() -> Self {
    let from_env = Self::from_env();
    let from_file = Self::from_file();
    let default = Self::default();

    let mut merged = from_env;
    if let Some(from_file) = &from_file {
      merged = merged.merge(from_file);
    }
    merged = merged.merge(&default);

    if merged.config_path.is_some() && from_file.is_none() {
      merged.init_cfg_file();
    }

    merged
  }

  #[must_use]
  pub fn cluster_radius_px(&self) -> f32 {
    self.cluster_radius_px.unwrap_or(DEFAULT_CLUSTER_RADIUS_PX)
  }

  #[must_use]
  pub fn cache_staleness(&self) -> Duration {
    Duration::from_secs(
      self
        .cache_staleness_secs
        .unwrap_or(DEFAULT_CACHE_STALENESS_SECS),
    )
  }

  #[must_use]
  pub fn zoom_bounds(&self) -> (f32, f32) {
    (
      self.min_zoom.unwrap_or(DEFAULT_MIN_ZOOM),
      self.max_zoom.unwrap_or(DEFAULT_MAX_ZOOM),
    )
  }

  fn from_env() -> Self {
    let config_path = std::env::var("FOCOMAP_CONFIG").ok().map(PathBuf::from);
    let api_base_url = std::env::var("FOCOMAP_API_URL").ok();
    let cluster_radius_px = std::env::var("FOCOMAP_CLUSTER_RADIUS_PX")
      .ok()
      .and_then(|v| v.parse().ok());
    let cache_staleness_secs = std::env::var("FOCOMAP_CACHE_STALENESS_SECS")
      .ok()
      .and_then(|v| v.parse().ok());

    Self {
      config_path,
      api_base_url,
      cluster_radius_px,
      cache_staleness_secs,
      min_zoom: None,
      max_zoom: None,
      tile_styles: Vec::new(),
    }
  }

  fn merge(mut self, other: &Self) -> Self {
    self.config_path = self.config_path.or(other.config_path.clone());
    self.api_base_url = self.api_base_url.or(other.api_base_url.clone());
    self.cluster_radius_px = self.cluster_radius_px.or(other.cluster_radius_px);
    self.cache_staleness_secs = self.cache_staleness_secs.or(other.cache_staleness_secs);
    self.min_zoom = self.min_zoom.or(other.min_zoom);
    self.max_zoom = self.max_zoom.or(other.max_zoom);

    for style in &other.tile_styles {
      if !self.tile_styles.iter().any(|s| s == style) {
        self.tile_styles.push(style.clone());
      }
    }

    self
  }

  fn from_file() -> Option<Self> {
    let config_path = std::env::var("FOCOMAP_CONFIG")
      .ok()
      .map(PathBuf::from)
      .or_else(|| home_dir().map(|p| p.join(".config").join("focomap")))?;
    let config_path = config_path.join("config.json");

    serde_json::from_str(&std::fs::read_to_string(&config_path).ok()?)
      .inspect_err(|e| error!("Failed to read config file: {e}"))
      .ok()?
  }

  fn init_cfg_file(&self) {
    if let Some(path) = &self.config_path {
      if !path.exists() {
        let _ = std::fs::create_dir_all(path).inspect_err(|e| {
          error!("Failed to create config directory: {e}");
        });
      }

      let path = path.join("config.json");
      if !path.exists() {
        let config = serde_json::to_string_pretty(self);
        if let Ok(config) = config {
          let _ = std::fs::write(path, config).inspect_err(|e| {
            error!("Failed to write config file: {e}");
          });
        } else {
          error!("Failed to serialize config");
        }
      }
    }
  }
}

impl Default for Config {
  fn default() -> Self {
    let config_path = home_dir().map(|p| p.join(".config").join("focomap"));
    Self {
      config_path,
      api_base_url: None,
      cluster_radius_px: Some(DEFAULT_CLUSTER_RADIUS_PX),
      cache_staleness_secs: Some(DEFAULT_CACHE_STALENESS_SECS),
      min_zoom: Some(DEFAULT_MIN_ZOOM),
      max_zoom: Some(DEFAULT_MAX_ZOOM),
      tile_styles: vec![TileStyle {
        name: "OpenStreetMap".to_string(),
        url: DEFAULT_TILE_URL.to_string(),
      }],
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_carry_the_documented_tunables() {
    let config = Config::default();
    assert!((config.cluster_radius_px() - 60.).abs() < f32::EPSILON);
    assert_eq!(config.cache_staleness(), Duration::from_secs(300));
    assert_eq!(config.zoom_bounds(), (0., 19.));
  }

  #[test]
  fn merge_prefers_self_and_appends_styles() {
    let explicit = Config {
      cluster_radius_px: Some(45.),
      tile_styles: vec![TileStyle {
        name: "Custom".to_string(),
        url: "https://example.com/{zoom}/{x}/{y}.png".to_string(),
      }],
      ..Config::default()
    };
    let merged = explicit.merge(&Config::default());
    assert!((merged.cluster_radius_px() - 45.).abs() < f32::EPSILON);
    assert_eq!(merged.tile_styles.len(), 2);
    assert_eq!(merged.tile_styles[0].name, "Custom");
  }
}
