//! Command Gateway Backend Module
//!
//! Authenticated callers invoke named commands (`sendEmail`,
//! `searchLocations`, `searchPlaces`, `getDirections`, `emailHistory`).
//! Every command is validated into a typed value, rate-limited where
//! applicable, forwarded to exactly one upstream provider and recorded in an
//! append-only audit log.
//!
//! Clean Architecture structure:
//! - `domain/` - Commands, validation, geo math, audit entity, repository and provider traits
//! - `application/` - Use cases and the command dispatcher
//! - `infra/` - PostgreSQL / in-memory stores, HTTP provider adapters, token verification
//! - `presentation/` - HTTP handlers, DTOs, middleware, router

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::{DispatchConfig, ProviderConfig};
pub use application::dispatcher::CommandDispatcher;
pub use error::{DispatchError, DispatchResult};
pub use infra::identity::HmacTokenVerifier;
pub use infra::memory::InMemoryDispatchRepository;
pub use infra::postgres::PgDispatchRepository;
pub use infra::providers::HttpProviders;
pub use presentation::router::dispatch_router;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

#[cfg(test)]
mod tests;
