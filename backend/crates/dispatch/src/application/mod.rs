//! Application Layer
//!
//! Use cases and the command dispatcher.

pub mod config;
pub mod dispatcher;
pub mod email_history;
pub mod get_directions;
pub mod search_locations;
pub mod search_places;
pub mod send_email;

// Re-exports
pub use config::{DispatchConfig, ProviderConfig};
pub use dispatcher::{CommandDispatcher, CommandOutput, DispatchStage, DispatchStore, ProviderSet};
pub use email_history::{EmailHistoryEntry, EmailHistoryUseCase};
pub use get_directions::{DirectionsOutput, GetDirectionsUseCase};
pub use search_locations::{LocationResult, SearchLocationsUseCase};
pub use search_places::{PlaceResult, SearchPlacesUseCase};
pub use send_email::{SendEmailOutput, SendEmailUseCase};
