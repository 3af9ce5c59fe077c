//! Domain Layer
//!
//! Contains commands, validation rules, geo math, the audit entity, and the
//! repository and provider traits.

pub mod command;
pub mod email_template;
pub mod entity;
pub mod geo;
pub mod principal;
pub mod provider;
pub mod repository;
pub mod validation;
pub mod value_object;

// Re-exports
pub use entity::audit_record::{AuditRecord, AuditStatus};
pub use principal::{IdentityVerifier, Principal};
pub use provider::{DirectionsProvider, EmailProvider, GeocodingProvider, PlacesProvider};
pub use repository::{AuditLog, ProfileRepository};
