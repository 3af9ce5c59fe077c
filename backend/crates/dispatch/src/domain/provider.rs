//! Provider Traits
//!
//! One trait per upstream service. Implementations make exactly one outbound
//! call per invocation and report failures as `ProviderUnavailable` (could not
//! reach or understand the provider) or `ProviderRejected` (provider said no).
//! They never see the principal.

use serde::Serialize;

use crate::domain::geo::{BoundingBox, Coordinates};
use crate::domain::value_object::{EmailAddress, TravelMode};
use crate::error::DispatchResult;

/// A fully rendered message ready for delivery
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingEmail {
    pub to: EmailAddress,
    /// Set only when the caller supplied an explicit reply-to address
    pub reply_to: Option<EmailAddress>,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

/// Bounded geocoding query
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeRequest {
    pub text: String,
    pub bbox: BoundingBox,
    pub limit: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeocodedPlace {
    pub id: String,
    pub name: String,
    pub address: String,
    pub category: Option<String>,
    pub location: Coordinates,
}

/// Text search biased to a circle
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceSearchRequest {
    pub text: String,
    pub center: Coordinates,
    pub radius_meters: f64,
    pub max_results: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Place {
    pub id: String,
    pub name: String,
    pub address: String,
    pub location: Coordinates,
    pub rating: Option<f64>,
    pub types: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DirectionsRequest {
    pub origin: Coordinates,
    pub destination: Coordinates,
    pub mode: TravelMode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub distance_meters: f64,
    pub duration_seconds: f64,
    /// Provider geometry (GeoJSON line string), passed through untouched
    pub geometry: serde_json::Value,
}

/// Transactional email delivery
#[trait_variant::make(EmailProvider: Send)]
pub trait LocalEmailProvider {
    async fn send(&self, email: &OutgoingEmail) -> DispatchResult<()>;
}

/// Bounded geocoding search
#[trait_variant::make(GeocodingProvider: Send)]
pub trait LocalGeocodingProvider {
    async fn search(&self, request: &GeocodeRequest) -> DispatchResult<Vec<GeocodedPlace>>;
}

/// Text-based place search
#[trait_variant::make(PlacesProvider: Send)]
pub trait LocalPlacesProvider {
    async fn search_text(&self, request: &PlaceSearchRequest) -> DispatchResult<Vec<Place>>;
}

/// Routing between two points
#[trait_variant::make(DirectionsProvider: Send)]
pub trait LocalDirectionsProvider {
    /// Candidate routes, best first. Empty when the provider found none.
    async fn route(&self, request: &DirectionsRequest) -> DispatchResult<Vec<Route>>;
}
