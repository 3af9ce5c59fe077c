//! Input Validation
//!
//! Raw JSON payloads are deserialized into the permissive `*Payload` structs
//! below, then checked field by field into typed commands. Every rejection
//! carries the field name and a reason that is safe to show the caller.

use serde::Deserialize;

use super::command::{DirectionsCommand, EmailCommand, SearchCommand};
use super::geo::Coordinates;
use super::value_object::{EmailAddress, SearchScope, SearchTerm, TravelMode};
use crate::error::{DispatchError, DispatchResult};

pub const MAX_SUBJECT_CHARS: usize = 200;
pub const MAX_MESSAGE_CHARS: usize = 5000;

/// `sendEmail` payload as received
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailPayload {
    pub to: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
    pub reply_to: Option<String>,
}

/// `searchLocations` / `searchPlaces` payload as received
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPayload {
    pub query: Option<String>,
    pub location_type: Option<String>,
    pub user_lat: Option<f64>,
    pub user_lng: Option<f64>,
    pub search_scope: Option<ScopeInput>,
}

/// `searchScope` arrives either as `"all"` / `"10"` or as a bare number
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ScopeInput {
    Text(String),
    Number(f64),
}

/// `getDirections` payload as received
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectionsPayload {
    pub origin_lat: Option<f64>,
    pub origin_lng: Option<f64>,
    pub dest_lat: Option<f64>,
    pub dest_lng: Option<f64>,
    /// Any JSON value; only a known mode string is honored
    pub mode: Option<serde_json::Value>,
}

/// Deserialize a raw payload, treating `null` as an empty object.
pub fn parse_payload<T>(raw: serde_json::Value) -> DispatchResult<T>
where
    T: for<'de> Deserialize<'de> + Default,
{
    if raw.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(raw).map_err(|e| {
        tracing::debug!(error = %e, "Payload did not deserialize");
        DispatchError::validation("payload", "Invalid request payload")
    })
}

pub fn validate_email(payload: EmailPayload) -> DispatchResult<EmailCommand> {
    let present = |v: Option<String>| v.filter(|s| !s.is_empty());

    let (Some(to), Some(subject), Some(message)) = (
        present(payload.to),
        present(payload.subject),
        present(payload.message),
    ) else {
        return Err(DispatchError::validation(
            "to",
            "Missing required fields: to, subject, message",
        ));
    };

    let to = EmailAddress::parse(&to)
        .ok_or_else(|| DispatchError::validation("to", "Invalid recipient email address"))?;

    let reply_to = match present(payload.reply_to) {
        Some(raw) => Some(EmailAddress::parse(&raw).ok_or_else(|| {
            DispatchError::validation("replyTo", "Invalid reply-to email address")
        })?),
        None => None,
    };

    if subject.chars().count() > MAX_SUBJECT_CHARS {
        return Err(DispatchError::validation(
            "subject",
            format!("Subject exceeds maximum length of {MAX_SUBJECT_CHARS} characters"),
        ));
    }

    if message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(DispatchError::validation(
            "message",
            format!("Message exceeds maximum length of {MAX_MESSAGE_CHARS} characters"),
        ));
    }

    Ok(EmailCommand {
        to,
        subject,
        message,
        reply_to,
    })
}

/// Validate a search. Missing caller coordinates fall back to `default_origin`.
pub fn validate_search(
    payload: SearchPayload,
    default_origin: Coordinates,
) -> DispatchResult<SearchCommand> {
    let term = SearchTerm::resolve(payload.query.as_deref(), payload.location_type.as_deref())
        .ok_or_else(|| {
            DispatchError::validation("query", "Either query or locationType is required")
        })?;

    let origin = match (payload.user_lat, payload.user_lng) {
        (Some(lat), Some(lng)) => {
            let origin = Coordinates::new(lat, lng);
            if !origin.is_valid() {
                return Err(DispatchError::validation("userLat", "Invalid user coordinates"));
            }
            origin
        }
        _ => default_origin,
    };

    let scope = match payload.search_scope {
        None => Some(SearchScope::default()),
        Some(ScopeInput::Text(s)) => SearchScope::parse(&s),
        Some(ScopeInput::Number(km)) => SearchScope::from_km(km),
    }
    .ok_or_else(|| {
        DispatchError::validation(
            "searchScope",
            "searchScope must be \"all\" or a positive number of kilometers",
        )
    })?;

    Ok(SearchCommand {
        term,
        origin,
        scope,
    })
}

pub fn validate_directions(payload: DirectionsPayload) -> DispatchResult<DirectionsCommand> {
    let (Some(origin_lat), Some(origin_lng), Some(dest_lat), Some(dest_lng)) = (
        payload.origin_lat,
        payload.origin_lng,
        payload.dest_lat,
        payload.dest_lng,
    ) else {
        return Err(DispatchError::validation(
            "originLat",
            "Origin and destination coordinates are required",
        ));
    };

    let origin = Coordinates::new(origin_lat, origin_lng);
    if !origin.is_valid() {
        return Err(DispatchError::validation("originLat", "Invalid origin coordinates"));
    }
    let destination = Coordinates::new(dest_lat, dest_lng);
    if !destination.is_valid() {
        return Err(DispatchError::validation("destLat", "Invalid destination coordinates"));
    }

    Ok(DirectionsCommand {
        origin,
        destination,
        mode: TravelMode::coerce(payload.mode.as_ref().and_then(serde_json::Value::as_str)),
    })
}
