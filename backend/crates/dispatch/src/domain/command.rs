//! Validated Commands
//!
//! Typed values produced by the validator. Handlers only ever see these.

use super::geo::Coordinates;
use super::value_object::{EmailAddress, SearchScope, SearchTerm, TravelMode};

/// A message to relay to one recipient
#[derive(Debug, Clone, PartialEq)]
pub struct EmailCommand {
    pub to: EmailAddress,
    pub subject: String,
    pub message: String,
    pub reply_to: Option<EmailAddress>,
}

/// A location or place search around an origin
#[derive(Debug, Clone, PartialEq)]
pub struct SearchCommand {
    pub term: SearchTerm,
    pub origin: Coordinates,
    pub scope: SearchScope,
}

/// A route request between two points
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionsCommand {
    pub origin: Coordinates,
    pub destination: Coordinates,
    pub mode: TravelMode,
}
