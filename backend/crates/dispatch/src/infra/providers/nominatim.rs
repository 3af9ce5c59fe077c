//! Nominatim-compatible geocoding adapter (LocationIQ `/v1/search`)

use std::sync::Arc;

use serde::Deserialize;

use super::{decode_error, status_error, transport_error};
use crate::application::config::ProviderConfig;
use crate::domain::geo::Coordinates;
use crate::domain::provider::{GeocodeRequest, GeocodedPlace, GeocodingProvider};
use crate::error::{DispatchError, DispatchResult};

const PROVIDER: &str = "geocoding";

/// Body LocationIQ returns with 404 when nothing matched
const NO_MATCH: &str = "Unable to geocode";

#[derive(Clone)]
pub struct NominatimClient {
    client: reqwest::Client,
    config: Arc<ProviderConfig>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    place_id: serde_json::Value,
    lat: String,
    lon: String,
    display_name: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

impl SearchHit {
    /// Hits with unparseable coordinates are dropped.
    fn into_place(self) -> Option<GeocodedPlace> {
        let location = Coordinates::new(self.lat.parse().ok()?, self.lon.parse().ok()?);
        if !location.is_valid() {
            return None;
        }

        let name = self
            .name
            .filter(|n| !n.trim().is_empty())
            .or_else(|| self.display_name.split(',').next().map(|s| s.trim().to_string()))
            .unwrap_or_default();

        let id = match self.place_id {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };

        Some(GeocodedPlace {
            id,
            name,
            address: self.display_name,
            category: self.kind,
            location,
        })
    }
}

fn error_message(body: &serde_json::Value) -> Option<String> {
    body.get("error")?.as_str().map(str::to_string)
}

impl NominatimClient {
    pub fn new(client: reqwest::Client, config: Arc<ProviderConfig>) -> Self {
        Self { client, config }
    }
}

impl GeocodingProvider for NominatimClient {
    async fn search(&self, request: &GeocodeRequest) -> DispatchResult<Vec<GeocodedPlace>> {
        let url = format!("{}/v1/search", self.config.geocoding_base_url);
        let viewbox = request.bbox.to_viewbox();
        let limit = request.limit.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("key", self.config.geocoding_api_key.as_str()),
                ("q", request.text.as_str()),
                ("format", "json"),
                ("viewbox", viewbox.as_str()),
                ("bounded", "1"),
                ("limit", limit.as_str()),
            ])
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER, e))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            // "Unable to geocode" means zero hits, not a failure
            let body: serde_json::Value = response
                .json()
                .await
                .map_err(|e| decode_error(PROVIDER, e))?;
            if error_message(&body).as_deref() == Some(NO_MATCH) {
                return Ok(Vec::new());
            }
            return Err(DispatchError::ProviderRejected {
                provider_message: error_message(&body),
            });
        }
        if !status.is_success() {
            return Err(status_error(PROVIDER, response, error_message).await);
        }

        let hits: Vec<SearchHit> = response
            .json()
            .await
            .map_err(|e| decode_error(PROVIDER, e))?;

        Ok(hits
            .into_iter()
            .filter_map(SearchHit::into_place)
            .take(request.limit)
            .collect())
    }
}
