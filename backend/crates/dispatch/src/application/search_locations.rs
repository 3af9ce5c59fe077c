//! Search Locations Use Case
//!
//! Bounded geocoding search around the caller.

use std::sync::Arc;

use serde::Serialize;

use crate::application::config::DispatchConfig;
use crate::domain::command::SearchCommand;
use crate::domain::geo::{BoundingBox, format_distance, haversine_km};
use crate::domain::provider::{GeocodeRequest, GeocodingProvider};
use crate::domain::value_object::SearchScope;
use crate::error::DispatchResult;

/// One geocoding hit as returned to the caller
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationResult {
    pub id: String,
    pub name: String,
    pub address: String,
    pub category: Option<String>,
    pub lat: f64,
    pub lng: f64,
    /// Formatted distance from the search origin
    pub distance: String,
}

/// Search locations use case
pub struct SearchLocationsUseCase<G>
where
    G: GeocodingProvider,
{
    geocoder: Arc<G>,
    config: Arc<DispatchConfig>,
}

impl<G> SearchLocationsUseCase<G>
where
    G: GeocodingProvider,
{
    pub fn new(geocoder: Arc<G>, config: Arc<DispatchConfig>) -> Self {
        Self { geocoder, config }
    }

    /// Results keep provider order.
    pub async fn execute(&self, command: &SearchCommand) -> DispatchResult<Vec<LocationResult>> {
        let bbox = match command.scope {
            SearchScope::All => self.config.wide_search_area,
            SearchScope::Kilometers(km) => BoundingBox::around(command.origin, km),
        };

        let request = GeocodeRequest {
            text: command.term.text().to_string(),
            bbox,
            limit: self.config.max_location_results,
        };

        let places = self.geocoder.search(&request).await?;

        let results: Vec<LocationResult> = places
            .into_iter()
            .take(self.config.max_location_results)
            .map(|p| LocationResult {
                distance: format_distance(haversine_km(command.origin, p.location)),
                id: p.id,
                name: p.name,
                address: p.address,
                category: p.category,
                lat: p.location.lat,
                lng: p.location.lng,
            })
            .collect();

        tracing::debug!(
            query = %command.term.text(),
            scope = %command.scope,
            results = results.len(),
            "Location search finished"
        );

        Ok(results)
    }
}
