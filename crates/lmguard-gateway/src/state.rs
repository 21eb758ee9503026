//! Shared application state

use crate::search::LibrarySearch;
use lmguard_foundation::{CredentialManager, LmStudioClient};
use lmguard_kernel::{GuardSettings, SettingsStore};
use std::sync::Arc;

/// State shared across all request handlers.
///
/// Settings are never cached here: handlers call [`AppState::settings`] once
/// per request and use that snapshot throughout.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SettingsStore>,
    pub credentials: CredentialManager,
    pub upstream: LmStudioClient,
    pub library: Arc<dyn LibrarySearch>,
}

impl AppState {
    /// Build the state, generating an inbound credential when the store has
    /// none yet.
    pub fn new(
        store: Arc<dyn SettingsStore>,
        upstream: LmStudioClient,
        library: Arc<dyn LibrarySearch>,
    ) -> Self {
        let credentials = CredentialManager::new(store.clone());
        credentials.ensure();
        Self {
            store,
            credentials,
            upstream,
            library,
        }
    }

    pub fn settings(&self) -> GuardSettings {
        self.store.snapshot()
    }
}
