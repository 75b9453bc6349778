//! Shared-secret token authentication backends.
//!
//! The HMAC extension validates signed gateway URLs against a shared
//! secret; the encrypted-URL extension is a fork of it and reads the very
//! same property names. Enabling both therefore emits duplicate entries,
//! which the store keeps in order; the reader's last-wins rule picks the
//! later values.

use std::fmt;

use serde::Serialize;

use crate::env::EnvSnapshot;
use crate::errors::BootstrapError;
use crate::properties::PropertyStore;

/// Which token-based backend a secret belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Signed-URL authentication.
    Hmac,
    /// Encrypted-URL authentication.
    EncryptedUrl,
}

impl TokenKind {
    /// Environment variable holding the shared secret.
    pub fn secret_var(self) -> &'static str {
        match self {
            Self::Hmac => "HMAC_SECRET",
            Self::EncryptedUrl => "ENCRYPTEDURL_SECRET",
        }
    }

    /// Environment variable bounding accepted request age.
    pub fn age_limit_var(self) -> &'static str {
        match self {
            Self::Hmac => "HMAC_TIMESTAMP_AGE_LIMIT",
            Self::EncryptedUrl => "ENCRYPTEDURL_TIMESTAMP_AGE_LIMIT",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Hmac => "HMAC",
            Self::EncryptedUrl => "encrypted-URL",
        })
    }
}

/// Validated parameters for one token backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenParams {
    /// Backend these parameters belong to.
    pub kind: TokenKind,
    /// Shared secret used to validate gateway URLs.
    pub secret: String,
    /// Maximum accepted request age in milliseconds, when overridden.
    /// The extension itself falls back to 600000 (ten minutes).
    pub timestamp_age_limit: Option<String>,
}

impl TokenParams {
    /// Validate and collect parameters from the snapshot.
    pub fn resolve(kind: TokenKind, env: &EnvSnapshot) -> Result<Self, BootstrapError> {
        let Some(secret) = env.get_owned(kind.secret_var()) else {
            return Err(BootstrapError::TokenSecretMissing(kind));
        };
        Ok(Self {
            kind,
            secret,
            timestamp_age_limit: env.get_owned(kind.age_limit_var()),
        })
    }

    /// Write the token properties. Both token backends share the same
    /// property names.
    pub fn emit_properties(&self, store: &mut PropertyStore) {
        store.set("secret-key", self.secret.as_str());
        store.set_if_present("timestamp-age-limit", self.timestamp_age_limit.as_deref());
    }
}
