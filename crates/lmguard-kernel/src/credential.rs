//! Bearer credential value type.

use std::fmt;

/// An opaque bearer credential.
///
/// Freshly generated credentials are 64 lowercase hex characters; values
/// loaded from settings are taken as-is. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Length of a generated credential in hex characters.
    pub const HEX_LEN: usize = 64;

    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `true` if this looks like a generated credential.
    pub fn is_well_formed(&self) -> bool {
        self.0.len() == Self::HEX_LEN
            && self
                .0
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    }

    /// Short, non-reversible label for logs.
    pub fn fingerprint(&self) -> String {
        if self.0.len() > 8 {
            format!("{}…", self.0.chars().take(4).collect::<String>())
        } else {
            "****".to_string()
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&"<redacted>").finish()
    }
}

impl From<String> for Credential {
    fn from(value: String) -> Self {
        Self(value)
    }
}
