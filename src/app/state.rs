use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;

use super::config::AppSettings;
use super::traits::{AccountingApi, SessionStore};

/// Shared state for the route handlers.
pub(super) struct AppState<C, S> {
    pub(super) client: Arc<C>,
    pub(super) session_store: Arc<S>,
    pub(super) settings: AppSettings,
}

// Manual Clone: avoid derive adding `C: Clone, S: Clone` bounds.
impl<C, S> Clone for AppState<C, S> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            session_store: self.session_store.clone(),
            settings: self.settings.clone(),
        }
    }
}

// PrivateCookieJar requires Key to be extractable from state
impl<C: AccountingApi, S: SessionStore> FromRef<AppState<C, S>> for Key {
    fn from_ref(state: &AppState<C, S>) -> Self {
        state.settings.cookie_key.clone()
    }
}
