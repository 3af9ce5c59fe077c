//! Email Address Value Object
//!
//! Shape check only: no whitespace, exactly one `@`, a non-empty local part
//! and a domain with a dot that is neither its first nor its last character.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Syntactically valid email address
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Parse an address. The input is kept as given (no trimming, no case folding).
    pub fn parse(raw: &str) -> Option<Self> {
        Self::is_valid_format(raw).then(|| Self(raw.to_string()))
    }

    fn is_valid_format(raw: &str) -> bool {
        if raw.chars().any(char::is_whitespace) {
            return false;
        }

        let Some((local, domain)) = raw.split_once('@') else {
            return false;
        };
        if local.is_empty() || domain.contains('@') {
            return false;
        }

        // domain must be `x.y` with at least one char on each side of some dot
        domain
            .char_indices()
            .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
