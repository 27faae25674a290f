//! Shared handler state.

use axum::extract::FromRef;
use std::sync::Arc;

use crate::auth::{CookieSettings, JwtService, OAuthService};
use crate::i18n::Translator;
use crate::observability::MetricsHandle;
use crate::services::Services;

/// Everything a handler can reach, cloned per request
#[derive(Clone)]
pub struct AppState {
    pub services: Services,
    pub oauth: Arc<OAuthService>,
    pub translator: Arc<Translator>,
    pub jwt: Arc<JwtService>,
    pub cookies: Arc<CookieSettings>,
    /// `None` when metrics are disabled
    pub metrics: Option<MetricsHandle>,
    /// Storefront the OAuth callback redirects to
    pub frontend_url: Arc<str>,
}

impl FromRef<AppState> for Arc<JwtService> {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}

impl FromRef<AppState> for Arc<CookieSettings> {
    fn from_ref(state: &AppState) -> Self {
        state.cookies.clone()
    }
}

impl FromRef<AppState> for Arc<Translator> {
    fn from_ref(state: &AppState) -> Self {
        state.translator.clone()
    }
}
