//! Bearer Token Verification
//!
//! Tokens are `base64url(claims JSON) "." base64url(HMAC-SHA256(secret, claims segment))`.
//! The identity provider that signs them shares the secret with this service.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use platform::crypto::{from_base64_url, hmac_sha256, to_base64_url, verify_hmac_sha256};

use crate::domain::principal::{IdentityVerifier, Principal};

/// Signed token payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityClaims {
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
    /// Expiry, milliseconds since epoch
    pub exp: i64,
}

/// HMAC-SHA256 token verifier
#[derive(Clone)]
pub struct HmacTokenVerifier {
    secret: Vec<u8>,
}

impl HmacTokenVerifier {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Sign claims into a token (used by tests and local tooling)
    pub fn issue(&self, claims: &IdentityClaims) -> Result<String, serde_json::Error> {
        let payload = to_base64_url(&serde_json::to_vec(claims)?);
        let tag = hmac_sha256(&self.secret, payload.as_bytes());
        Ok(format!("{payload}.{}", to_base64_url(&tag)))
    }

    /// Verify at an explicit instant (milliseconds since epoch)
    pub fn verify_at(&self, token: &str, now_ms: i64) -> Option<Principal> {
        let (payload, signature) = token.split_once('.')?;
        let tag = from_base64_url(signature).ok()?;

        if !verify_hmac_sha256(&self.secret, payload.as_bytes(), &tag) {
            tracing::debug!("Rejected token with bad signature");
            return None;
        }

        let claims: IdentityClaims = serde_json::from_slice(&from_base64_url(payload).ok()?).ok()?;

        if claims.exp <= now_ms {
            tracing::debug!(uid = %claims.uid, "Rejected expired token");
            return None;
        }
        if claims.uid.trim().is_empty() {
            return None;
        }

        Some(Principal {
            id: claims.uid,
            display_name: claims.name,
            email: claims.email,
            email_verified: claims.email_verified,
        })
    }
}

impl IdentityVerifier for HmacTokenVerifier {
    fn verify(&self, token: &str) -> Option<Principal> {
        self.verify_at(token, Utc::now().timestamp_millis())
    }
}

impl std::fmt::Debug for HmacTokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacTokenVerifier").finish_non_exhaustive()
    }
}
