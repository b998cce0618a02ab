use std::time::Duration;

use anyhow::{Result, anyhow};
use serde_json::Value;
use surf::Config;

use super::record::{FilterCriteria, PoiPage, PoiRecord};

/// Interface to the HTTP collaborator serving paginated POI lists.
/// Transport concerns (auth headers, retries, rate limits) live behind
/// this seam.
#[async_trait::async_trait]
pub trait PoiFetcher: Send + Sync {
  /// Human-readable name of the backend, for logging.
  fn name(&self) -> &str;

  /// Fetches one page of POI records matching `criteria`.
  async fn fetch_page(&self, criteria: &FilterCriteria) -> Result<PoiPage>;
}

/// Default fetcher against the dashboard API.
pub struct HttpPoiFetcher {
  base_url: String,
  client: surf::Client,
}

impl HttpPoiFetcher {
  #[must_use]
  pub fn new(base_url: String) -> Self {
    let client: surf::Client = Config::new()
      .set_timeout(Some(Duration::from_secs(5)))
      .try_into()
      .expect("client");
    Self { base_url, client }
  }

  fn query_string(criteria: &FilterCriteria) -> String {
    let mut params: Vec<String> = Vec::new();
    if let Some(id) = criteria.municipality_id {
      params.push(format!("municipalityId={id}"));
    }
    if let Some(id) = criteria.contract_id {
      params.push(format!("contractId={id}"));
    }
    if let Some(range) = criteria.date_range {
      params.push(format!(
        "from={}",
        urlencoding::encode(&range.from.to_rfc3339())
      ));
      params.push(format!("to={}", urlencoding::encode(&range.to.to_rfc3339())));
    }
    params.join("&")
  }
}

#[async_trait::async_trait]
impl PoiFetcher for HttpPoiFetcher {
  fn name(&self) -> &str {
    "POI API"
  }

  async fn fetch_page(&self, criteria: &FilterCriteria) -> Result<PoiPage> {
    let url = format!("{}/pois?{}", self.base_url, Self::query_string(criteria));

    let response = self
      .client
      .get(&url)
      .recv_json::<Value>()
      .await
      .map_err(|e| anyhow!("POI API request failed: {}", e))?;

    let total = response["total"].as_u64().unwrap_or(0);
    let mut records = Vec::new();
    if let Some(items) = response["items"].as_array() {
      for item in items {
        // One malformed record must not sink the whole page.
        match serde_json::from_value::<PoiRecord>(item.clone()) {
          Ok(record) => records.push(record),
          Err(e) => log::warn!("Skipping malformed POI record: {e}"),
        }
      }
    }

    Ok(PoiPage { records, total })
  }
}
