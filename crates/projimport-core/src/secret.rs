//! Redacting wrapper for credentials that must never reach logs

use std::fmt;

const REDACTED: &str = "***";

/// An access token supplied by a caller.
///
/// `Debug` and `Display` never print the value; call [`SecretToken::expose`]
/// at the single point where the raw value is handed to a transport.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretToken(String);

impl SecretToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SecretToken").field(&REDACTED).finish()
    }
}

impl fmt::Display for SecretToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}
