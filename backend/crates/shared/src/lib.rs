//! Shared Kernel - vocabulary used by every crate in the gateway
//!
//! - Error kinds, the unified [`error::app_error::AppError`] and its result alias
//! - Typed identifiers for persisted records
//!
//! Only things whose meaning is identical in every crate belong here.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod id;
