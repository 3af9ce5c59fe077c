//! HTTP Provider Adapters
//!
//! One adapter per upstream API. Each makes a single request, bounded by the
//! shared client's timeout, with no retry.

pub mod google_places;
pub mod mapbox;
pub mod nominatim;
pub mod sendgrid;

use std::sync::Arc;

use platform::client::{HttpClientError, build_http_client};
use reqwest::{Response, StatusCode};

use crate::application::config::ProviderConfig;
use crate::domain::provider::{
    DirectionsProvider, DirectionsRequest, EmailProvider, GeocodeRequest, GeocodedPlace,
    GeocodingProvider, OutgoingEmail, Place, PlaceSearchRequest, PlacesProvider, Route,
};
use crate::error::{DispatchError, DispatchResult};

pub use google_places::GooglePlacesClient;
pub use mapbox::MapboxDirectionsClient;
pub use nominatim::NominatimClient;
pub use sendgrid::SendGridClient;

/// All production adapters sharing one HTTP client
#[derive(Clone)]
pub struct HttpProviders {
    pub email: SendGridClient,
    pub geocoding: NominatimClient,
    pub places: GooglePlacesClient,
    pub directions: MapboxDirectionsClient,
}

impl HttpProviders {
    pub fn new(config: ProviderConfig) -> Result<Self, HttpClientError> {
        let client = build_http_client(config.timeout, &config.user_agent)?;
        let config = Arc::new(config);

        Ok(Self {
            email: SendGridClient::new(client.clone(), config.clone()),
            geocoding: NominatimClient::new(client.clone(), config.clone()),
            places: GooglePlacesClient::new(client.clone(), config.clone()),
            directions: MapboxDirectionsClient::new(client, config),
        })
    }
}

impl EmailProvider for HttpProviders {
    async fn send(&self, email: &OutgoingEmail) -> DispatchResult<()> {
        self.email.send(email).await
    }
}

impl GeocodingProvider for HttpProviders {
    async fn search(&self, request: &GeocodeRequest) -> DispatchResult<Vec<GeocodedPlace>> {
        self.geocoding.search(request).await
    }
}

impl PlacesProvider for HttpProviders {
    async fn search_text(&self, request: &PlaceSearchRequest) -> DispatchResult<Vec<Place>> {
        self.places.search_text(request).await
    }
}

impl DirectionsProvider for HttpProviders {
    async fn route(&self, request: &DirectionsRequest) -> DispatchResult<Vec<Route>> {
        self.directions.route(request).await
    }
}

// ============================================================================
// Error mapping shared by the adapters
// ============================================================================

/// The request never produced a usable response.
pub(crate) fn transport_error(provider: &'static str, err: reqwest::Error) -> DispatchError {
    // URLs can carry API keys in the query string
    let err = err.without_url();
    tracing::warn!(
        provider,
        timeout = err.is_timeout(),
        connect = err.is_connect(),
        error = %err,
        "Provider request failed"
    );
    DispatchError::ProviderUnavailable { message: None }
}

/// The response arrived but its body was not what the adapter expects.
pub(crate) fn decode_error(provider: &'static str, err: reqwest::Error) -> DispatchError {
    let err = err.without_url();
    tracing::warn!(provider, error = %err, "Provider response did not decode");
    DispatchError::ProviderUnavailable { message: None }
}

/// Map a non-2xx response, pulling the provider's own message out of the body.
pub(crate) async fn status_error(
    provider: &'static str,
    response: Response,
    extract_message: fn(&serde_json::Value) -> Option<String>,
) -> DispatchError {
    let status = response.status();
    let message = response
        .json::<serde_json::Value>()
        .await
        .ok()
        .as_ref()
        .and_then(extract_message)
        .filter(|m| !m.trim().is_empty());

    tracing::warn!(
        provider,
        status = status.as_u16(),
        message = message.as_deref().unwrap_or(""),
        "Provider returned an error status"
    );

    match message {
        Some(message) => DispatchError::ProviderRejected {
            provider_message: Some(message),
        },
        None if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS => {
            DispatchError::ProviderUnavailable { message: None }
        }
        None => DispatchError::ProviderRejected {
            provider_message: None,
        },
    }
}
