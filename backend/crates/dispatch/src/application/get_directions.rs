//! Get Directions Use Case

use std::sync::Arc;

use serde::Serialize;

use crate::domain::command::DirectionsCommand;
use crate::domain::provider::{DirectionsProvider, DirectionsRequest};
use crate::domain::value_object::TravelMode;
use crate::error::{DispatchError, DispatchResult};

/// Best route summary
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectionsOutput {
    /// e.g. `"1.50 km"`
    pub distance: String,
    /// e.g. `"10 min"`
    pub duration: String,
    pub distance_meters: f64,
    pub duration_seconds: f64,
    pub mode: TravelMode,
    pub geometry: serde_json::Value,
}

/// Get directions use case
pub struct GetDirectionsUseCase<D>
where
    D: DirectionsProvider,
{
    directions: Arc<D>,
}

impl<D> GetDirectionsUseCase<D>
where
    D: DirectionsProvider,
{
    pub fn new(directions: Arc<D>) -> Self {
        Self { directions }
    }

    pub async fn execute(&self, command: &DirectionsCommand) -> DispatchResult<DirectionsOutput> {
        let request = DirectionsRequest {
            origin: command.origin,
            destination: command.destination,
            mode: command.mode,
        };

        let route = self
            .directions
            .route(&request)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DispatchError::NotFound {
                message: "No route found".to_string(),
            })?;

        Ok(DirectionsOutput {
            distance: format_route_distance(route.distance_meters),
            duration: format_route_duration(route.duration_seconds),
            distance_meters: route.distance_meters,
            duration_seconds: route.duration_seconds,
            mode: command.mode,
            geometry: route.geometry,
        })
    }
}

pub fn format_route_distance(meters: f64) -> String {
    format!("{:.2} km", meters / 1000.0)
}

pub fn format_route_duration(seconds: f64) -> String {
    format!("{} min", (seconds / 60.0).round() as i64)
}
