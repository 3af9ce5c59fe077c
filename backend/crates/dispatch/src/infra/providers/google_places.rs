//! Google Places API (New) text search adapter

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{decode_error, status_error, transport_error};
use crate::application::config::ProviderConfig;
use crate::domain::geo::Coordinates;
use crate::domain::provider::{Place, PlaceSearchRequest, PlacesProvider};
use crate::error::DispatchResult;

const PROVIDER: &str = "places";

const FIELD_MASK: &str = "places.id,places.displayName,places.formattedAddress,places.location,places.rating,places.types";

#[derive(Clone)]
pub struct GooglePlacesClient {
    client: reqwest::Client,
    config: Arc<ProviderConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchTextBody<'a> {
    text_query: &'a str,
    max_result_count: usize,
    location_bias: LocationBias,
}

#[derive(Debug, Serialize)]
struct LocationBias {
    circle: Circle,
}

#[derive(Debug, Serialize)]
struct Circle {
    center: LatLng,
    radius: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct LatLng {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Default, Deserialize)]
struct SearchTextResponse {
    #[serde(default)]
    places: Vec<PlaceHit>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaceHit {
    id: String,
    #[serde(default)]
    display_name: Option<LocalizedText>,
    #[serde(default)]
    formatted_address: Option<String>,
    location: Option<LatLng>,
    #[serde(default)]
    rating: Option<f64>,
    #[serde(default)]
    types: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct LocalizedText {
    text: String,
}

impl PlaceHit {
    /// Places without a location cannot be ranked by distance and are dropped.
    fn into_place(self) -> Option<Place> {
        let location = self.location?;
        Some(Place {
            name: self.display_name.map(|d| d.text).unwrap_or_default(),
            address: self.formatted_address.unwrap_or_default(),
            location: Coordinates::new(location.latitude, location.longitude),
            rating: self.rating,
            types: self.types,
            id: self.id,
        })
    }
}

fn error_message(body: &serde_json::Value) -> Option<String> {
    body.get("error")?
        .get("message")?
        .as_str()
        .map(str::to_string)
}

impl GooglePlacesClient {
    pub fn new(client: reqwest::Client, config: Arc<ProviderConfig>) -> Self {
        Self { client, config }
    }
}

impl PlacesProvider for GooglePlacesClient {
    async fn search_text(&self, request: &PlaceSearchRequest) -> DispatchResult<Vec<Place>> {
        let url = format!("{}/v1/places:searchText", self.config.places_base_url);

        let body = SearchTextBody {
            text_query: &request.text,
            max_result_count: request.max_results,
            location_bias: LocationBias {
                circle: Circle {
                    center: LatLng {
                        latitude: request.center.lat,
                        longitude: request.center.lng,
                    },
                    radius: request.radius_meters,
                },
            },
        };

        let response = self
            .client
            .post(&url)
            .header("X-Goog-Api-Key", &self.config.places_api_key)
            .header("X-Goog-FieldMask", FIELD_MASK)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER, e))?;

        if !response.status().is_success() {
            return Err(status_error(PROVIDER, response, error_message).await);
        }

        let parsed: SearchTextResponse = response
            .json()
            .await
            .map_err(|e| decode_error(PROVIDER, e))?;

        Ok(parsed
            .places
            .into_iter()
            .filter_map(PlaceHit::into_place)
            .take(request.max_results)
            .collect())
    }
}
