//! Presentation Layer
//!
//! HTTP handlers, DTOs, router, and middleware.

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod router;

pub use handlers::DispatchAppState;
pub use middleware::{CallerIdentity, attach_principal};
pub use router::dispatch_router;
