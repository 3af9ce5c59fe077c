//! Search Places Use Case
//!
//! Text search biased to a circle around the caller, nearest first.

use std::sync::Arc;

use serde::Serialize;

use crate::application::config::DispatchConfig;
use crate::domain::command::SearchCommand;
use crate::domain::geo::{format_distance, haversine_km, parse_distance_meters};
use crate::domain::provider::{PlaceSearchRequest, PlacesProvider};
use crate::error::DispatchResult;

/// One place as returned to the caller
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceResult {
    pub id: String,
    pub name: String,
    pub address: String,
    pub lat: f64,
    pub lng: f64,
    pub rating: Option<f64>,
    pub types: Vec<String>,
    pub distance: String,
}

/// Search places use case
pub struct SearchPlacesUseCase<P>
where
    P: PlacesProvider,
{
    places: Arc<P>,
    config: Arc<DispatchConfig>,
}

impl<P> SearchPlacesUseCase<P>
where
    P: PlacesProvider,
{
    pub fn new(places: Arc<P>, config: Arc<DispatchConfig>) -> Self {
        Self { places, config }
    }

    pub async fn execute(&self, command: &SearchCommand) -> DispatchResult<Vec<PlaceResult>> {
        let request = PlaceSearchRequest {
            text: command.term.text().to_string(),
            center: command.origin,
            radius_meters: command.scope.radius_meters(self.config.max_place_radius_m),
            max_results: self.config.max_place_results,
        };

        let places = self.places.search_text(&request).await?;

        let mut results: Vec<PlaceResult> = places
            .into_iter()
            .take(self.config.max_place_results)
            .map(|p| PlaceResult {
                distance: format_distance(haversine_km(command.origin, p.location)),
                id: p.id,
                name: p.name,
                address: p.address,
                lat: p.location.lat,
                lng: p.location.lng,
                rating: p.rating,
                types: p.types,
            })
            .collect();

        // Sort on the formatted string so callers see the order the labels imply.
        results.sort_by(|a, b| {
            parse_distance_meters(&a.distance).total_cmp(&parse_distance_meters(&b.distance))
        });

        tracing::debug!(
            query = %command.term.text(),
            radius_m = request.radius_meters,
            results = results.len(),
            "Place search finished"
        );

        Ok(results)
    }
}
