//! Mapbox Directions API adapter

use std::sync::Arc;

use serde::Deserialize;

use super::{decode_error, status_error, transport_error};
use crate::application::config::ProviderConfig;
use crate::domain::provider::{DirectionsProvider, DirectionsRequest, Route};
use crate::error::{DispatchError, DispatchResult};

const PROVIDER: &str = "directions";

#[derive(Clone)]
pub struct MapboxDirectionsClient {
    client: reqwest::Client,
    config: Arc<ProviderConfig>,
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<RouteHit>,
}

#[derive(Debug, Deserialize)]
struct RouteHit {
    distance: f64,
    duration: f64,
    #[serde(default)]
    geometry: serde_json::Value,
}

fn error_message(body: &serde_json::Value) -> Option<String> {
    body.get("message")?.as_str().map(str::to_string)
}

impl MapboxDirectionsClient {
    pub fn new(client: reqwest::Client, config: Arc<ProviderConfig>) -> Self {
        Self { client, config }
    }

    fn url(&self, request: &DirectionsRequest) -> String {
        format!(
            "{}/directions/v5/mapbox/{}/{},{};{},{}",
            self.config.directions_base_url,
            request.mode.code(),
            request.origin.lng,
            request.origin.lat,
            request.destination.lng,
            request.destination.lat,
        )
    }
}

impl DirectionsProvider for MapboxDirectionsClient {
    async fn route(&self, request: &DirectionsRequest) -> DispatchResult<Vec<Route>> {
        let response = self
            .client
            .get(self.url(request))
            .query(&[
                ("access_token", self.config.mapbox_access_token.as_str()),
                ("geometries", "geojson"),
                ("overview", "full"),
            ])
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER, e))?;

        if !response.status().is_success() {
            return Err(status_error(PROVIDER, response, error_message).await);
        }

        let parsed: DirectionsResponse = response
            .json()
            .await
            .map_err(|e| decode_error(PROVIDER, e))?;

        match parsed.code.as_str() {
            "Ok" => {}
            "NoRoute" | "NoSegment" => return Ok(Vec::new()),
            other => {
                tracing::warn!(provider = PROVIDER, code = other, "Directions request not fulfilled");
                return Err(DispatchError::ProviderRejected {
                    provider_message: parsed.message,
                });
            }
        }

        Ok(parsed
            .routes
            .into_iter()
            .map(|r| Route {
                distance_meters: r.distance,
                duration_seconds: r.duration,
                geometry: r.geometry,
            })
            .collect())
    }
}
