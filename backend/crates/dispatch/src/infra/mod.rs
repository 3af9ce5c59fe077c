//! Infrastructure Layer
//!
//! Database implementations, token verification, and provider adapters.

pub mod identity;
pub mod memory;
pub mod postgres;
pub mod providers;

pub use identity::HmacTokenVerifier;
pub use memory::InMemoryDispatchRepository;
pub use postgres::PgDispatchRepository;
pub use providers::HttpProviders;
