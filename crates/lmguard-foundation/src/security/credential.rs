//! Inbound bearer credential generation, rotation and checking.

use lmguard_kernel::{Credential, SettingsStore};
use rand::RngCore;
use rand::rngs::OsRng;
use std::sync::Arc;
use tracing::{info, warn};

/// Bytes of OS randomness behind a generated credential.
pub const CREDENTIAL_BYTES: usize = 32;

/// Draw a fresh credential: 32 bytes from the OS CSPRNG, lowercase hex.
pub fn generate_credential() -> Credential {
    let mut bytes = [0u8; CREDENTIAL_BYTES];
    OsRng.fill_bytes(&mut bytes);
    Credential::new(hex::encode(bytes))
}

/// `true` when auth is off, or when `presented` equals `active` exactly.
/// An empty active credential matches nothing.
///
/// Plain equality, not constant-time: the listener is loopback-only and the
/// key carries 256 bits.
pub fn check_credential(presented: Option<&str>, active: &Credential, auth_required: bool) -> bool {
    if !auth_required {
        return true;
    }
    !active.is_empty() && presented.is_some_and(|p| p == active.as_str())
}

/// Generates, rotates and checks the inbound credential.
///
/// The settings store owns the value. Every [`check`](Self::check) reads a
/// fresh snapshot, so a key written through the store (by
/// [`rotate`](Self::rotate) or by any other writer) replaces the previous
/// one from the next request on.
#[derive(Clone)]
pub struct CredentialManager {
    store: Arc<dyn SettingsStore>,
}

impl CredentialManager {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self { store }
    }

    /// Generate and persist a credential when the store has none yet.
    /// Returns the active credential either way.
    pub fn ensure(&self) -> Credential {
        let active = self.active();
        if !active.is_empty() {
            return active;
        }
        let fresh = generate_credential();
        self.store.set_api_key(fresh.as_str());
        info!(fingerprint = %fresh.fingerprint(), "generated inbound API key");
        fresh
    }

    pub fn active(&self) -> Credential {
        Credential::new(self.store.snapshot().server.api_key)
    }

    /// Replace the stored credential. The previous value is rejected from
    /// the next check on.
    pub fn rotate(&self) -> Credential {
        let fresh = generate_credential();
        self.store.set_api_key(fresh.as_str());
        info!(fingerprint = %fresh.fingerprint(), "rotated inbound API key");
        fresh
    }

    /// Check `presented` against the current snapshot's `server.apiKey`
    /// and `server.requireAuth`.
    pub fn check(&self, presented: Option<&str>) -> bool {
        let server = self.store.snapshot().server;
        let active = Credential::new(server.api_key);
        let ok = check_credential(presented, &active, server.require_auth);
        if !ok {
            if presented.is_some() {
                warn!("rejected request: invalid API key");
            } else {
                warn!("rejected request: missing API key");
            }
        }
        ok
    }
}

impl std::fmt::Debug for CredentialManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialManager")
            .field("active", &self.active())
            .finish()
    }
}
