//! Principal
//!
//! The authenticated caller of a command, as supplied by the identity
//! provider. Immutable for the duration of one request.

use serde::{Deserialize, Serialize};

/// Authenticated caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Stable identity-provider user ID
    pub id: String,
    /// Display name from the identity token, if any
    pub display_name: Option<String>,
    /// Email address from the identity token, if any
    pub email: Option<String>,
    pub email_verified: bool,
}

impl Principal {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: None,
            email: None,
            email_verified: false,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// Turns a bearer token into a principal.
///
/// Returns `None` for any token that is malformed, forged, or expired.
pub trait IdentityVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Option<Principal>;
}
