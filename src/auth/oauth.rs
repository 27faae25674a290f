//! # OAuth Login
//!
//! Authorization-code flow with PKCE for every provider. The CSRF state and the PKCE
//! verifier are parked in the cache for ten minutes between the redirect and the
//! callback; a state can be used once.
//!
//! After the code exchange the provider's user-info endpoint is queried and its
//! answer normalized into an [`OAuthProfile`].

use oauth2::basic::BasicClient;
use oauth2::reqwest::async_http_client;
use oauth2::{
    AuthType, AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, PkceCodeChallenge, PkceCodeVerifier,
    RedirectUrl, Scope, TokenResponse, TokenUrl,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

use crate::caching::CacheService;
use crate::core::config::{OAuthConfigs, OAuthProviderConfig};
use crate::core::error::{GatewayError, GatewayResult};
use crate::dto::auth::OAuthProfile;

/// Lifetime of a pending authorization
pub const STATE_TTL: Duration = Duration::from_secs(10 * 60);

const STATE_KEY_PREFIX: &str = "oauth:state:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OAuthProvider {
    Facebook,
    Google,
    Twitter,
}

impl OAuthProvider {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "facebook" => Some(Self::Facebook),
            "google" => Some(Self::Google),
            "twitter" => Some(Self::Twitter),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Facebook => "facebook",
            Self::Google => "google",
            Self::Twitter => "twitter",
        }
    }

    fn auth_url(self) -> &'static str {
        match self {
            Self::Facebook => "https://www.facebook.com/v19.0/dialog/oauth",
            Self::Google => "https://accounts.google.com/o/oauth2/v2/auth",
            Self::Twitter => "https://twitter.com/i/oauth2/authorize",
        }
    }

    fn token_url(self) -> &'static str {
        match self {
            Self::Facebook => "https://graph.facebook.com/v19.0/oauth/access_token",
            Self::Google => "https://oauth2.googleapis.com/token",
            Self::Twitter => "https://api.twitter.com/2/oauth2/token",
        }
    }

    fn user_info_url(self) -> &'static str {
        match self {
            Self::Facebook => "https://graph.facebook.com/me?fields=id,name,email,picture.type(large)",
            Self::Google => "https://openidconnect.googleapis.com/v1/userinfo",
            Self::Twitter => "https://api.twitter.com/2/users/me?user.fields=profile_image_url",
        }
    }

    fn default_scopes(self) -> &'static [&'static str] {
        match self {
            Self::Facebook => &["email", "public_profile"],
            Self::Google => &["openid", "email", "profile"],
            Self::Twitter => &["users.read", "tweet.read"],
        }
    }

    /// Facebook expects the client credentials in the form body
    fn auth_type(self) -> AuthType {
        match self {
            Self::Facebook => AuthType::RequestBody,
            Self::Google | Self::Twitter => AuthType::BasicAuth,
        }
    }

    /// Map the provider's user-info document onto an [`OAuthProfile`]
    pub fn normalize_profile(self, info: &Value) -> GatewayResult<OAuthProfile> {
        let text = |value: &Value| value.as_str().map(str::to_string).filter(|s| !s.is_empty());
        let (provider_id, email, name, avatar) = match self {
            Self::Google => (
                text(&info["sub"]),
                text(&info["email"]),
                text(&info["name"]),
                text(&info["picture"]),
            ),
            Self::Facebook => (
                text(&info["id"]),
                text(&info["email"]),
                text(&info["name"]),
                text(&info["picture"]["data"]["url"]),
            ),
            Self::Twitter => {
                let data = &info["data"];
                (
                    text(&data["id"]),
                    None,
                    text(&data["name"]).or_else(|| text(&data["username"])),
                    text(&data["profile_image_url"]),
                )
            }
        };

        let provider_id =
            provider_id.ok_or_else(|| GatewayError::oauth(format!("{} profile has no user id", self.as_str())))?;
        let name = name
            .or_else(|| email.as_deref().and_then(|e| e.split('@').next()).map(str::to_string))
            .unwrap_or_else(|| format!("{} user", self.as_str()));

        Ok(OAuthProfile {
            provider: self.as_str().to_string(),
            provider_id,
            email: email.map(|e| e.to_lowercase()),
            name,
            avatar,
        })
    }
}

impl fmt::Display for OAuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored under the CSRF state between redirect and callback
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PendingAuthorization {
    provider: OAuthProvider,
    pkce_verifier: String,
}

struct ProviderClient {
    client: BasicClient,
    scopes: Vec<String>,
}

pub struct OAuthService {
    clients: HashMap<OAuthProvider, ProviderClient>,
    cache: CacheService,
    http: reqwest::Client,
}

impl OAuthService {
    pub fn new(configs: &OAuthConfigs, cache: CacheService) -> GatewayResult<Self> {
        let mut clients = HashMap::new();
        for (name, config) in configs.configured() {
            let Some(provider) = OAuthProvider::parse(name) else {
                continue;
            };
            clients.insert(provider, build_client(provider, config)?);
            info!(provider = name, "OAuth provider enabled");
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| GatewayError::config(format!("Failed to build OAuth HTTP client: {}", e)))?;

        Ok(Self { clients, cache, http })
    }

    pub fn enabled(&self) -> Vec<OAuthProvider> {
        let mut providers: Vec<_> = self.clients.keys().copied().collect();
        providers.sort_by_key(|p| p.as_str());
        providers
    }

    fn client(&self, provider: &str) -> GatewayResult<(OAuthProvider, &ProviderClient)> {
        OAuthProvider::parse(provider)
            .and_then(|p| self.clients.get(&p).map(|client| (p, client)))
            .ok_or_else(|| GatewayError::not_found("auth.errors.unsupportedProvider"))
    }

    /// Provider authorize URL; the pending state is stored for [`STATE_TTL`]
    pub async fn authorize_url(&self, provider: &str) -> GatewayResult<Url> {
        let (provider, entry) = self.client(provider)?;
        let (challenge, verifier) = PkceCodeChallenge::new_random_sha256();

        let mut request = entry.client.authorize_url(CsrfToken::new_random);
        for scope in &entry.scopes {
            request = request.add_scope(Scope::new(scope.clone()));
        }
        let (url, state) = request.set_pkce_challenge(challenge).url();

        let pending = PendingAuthorization {
            provider,
            pkce_verifier: verifier.secret().clone(),
        };
        self.cache
            .set(&state_key(state.secret()), &pending, STATE_TTL)
            .await
            .map_err(GatewayError::from)?;

        Ok(url)
    }

    /// Exchange the code and fetch the caller's profile
    pub async fn callback(&self, provider: &str, code: &str, state: &str) -> GatewayResult<OAuthProfile> {
        let (provider, entry) = self.client(provider)?;

        let pending: PendingAuthorization = self
            .cache
            .take(&state_key(state))
            .await
            .filter(|pending: &PendingAuthorization| pending.provider == provider)
            .ok_or_else(|| GatewayError::unauthorized("auth.errors.invalidOauthState"))?;

        let token = entry
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .set_pkce_verifier(PkceCodeVerifier::new(pending.pkce_verifier))
            .request_async(async_http_client)
            .await
            .map_err(|e| {
                warn!(%provider, error = %e, "OAuth code exchange failed");
                GatewayError::oauth(format!("{} code exchange failed: {}", provider, e))
            })?;

        let info = self.fetch_user_info(provider, token.access_token().secret()).await?;
        provider.normalize_profile(&info)
    }

    async fn fetch_user_info(&self, provider: OAuthProvider, access_token: &str) -> GatewayResult<Value> {
        let response = self
            .http
            .get(provider.user_info_url())
            .bearer_auth(access_token)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| GatewayError::oauth(format!("{} profile request failed: {}", provider, e)))?;

        response
            .json()
            .await
            .map_err(|e| GatewayError::oauth(format!("{} profile is not JSON: {}", provider, e)))
    }
}

fn state_key(state: &str) -> String {
    format!("{}{}", STATE_KEY_PREFIX, state)
}

fn build_client(provider: OAuthProvider, config: &OAuthProviderConfig) -> GatewayResult<ProviderClient> {
    let invalid = |what: &str, e: url::ParseError| GatewayError::config(format!("{} {}: {}", provider, what, e));

    let client = BasicClient::new(
        ClientId::new(config.client_id.clone()),
        Some(ClientSecret::new(config.client_secret.clone())),
        AuthUrl::new(provider.auth_url().to_string()).map_err(|e| invalid("auth url", e))?,
        Some(TokenUrl::new(provider.token_url().to_string()).map_err(|e| invalid("token url", e))?),
    )
    .set_auth_type(provider.auth_type())
    .set_redirect_uri(RedirectUrl::new(config.redirect_url.clone()).map_err(|e| invalid("redirect url", e))?);

    let scopes = if config.scopes.is_empty() {
        provider.default_scopes().iter().map(|s| s.to_string()).collect()
    } else {
        config.scopes.clone()
    };

    Ok(ProviderClient { client, scopes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caching::InMemoryCache;
    use serde_json::json;
    use std::sync::Arc;

    fn service() -> OAuthService {
        let configs = OAuthConfigs {
            google: Some(OAuthProviderConfig {
                client_id: "google-id".to_string(),
                client_secret: "google-secret".to_string(),
                redirect_url: "http://localhost:3000/auth/google/callback".to_string(),
                scopes: vec![],
            }),
            ..Default::default()
        };
        OAuthService::new(&configs, CacheService::new(Arc::new(InMemoryCache::new()))).unwrap()
    }

    #[test]
    fn test_normalize_google() {
        let profile = OAuthProvider::Google
            .normalize_profile(&json!({
                "sub": "1089",
                "email": "Lan@Gmail.com",
                "name": "Lan Nguyen",
                "picture": "https://lh3.googleusercontent.com/a/x"
            }))
            .unwrap();

        assert_eq!(profile.provider, "google");
        assert_eq!(profile.provider_id, "1089");
        assert_eq!(profile.email.as_deref(), Some("lan@gmail.com"));
        assert_eq!(profile.avatar.as_deref(), Some("https://lh3.googleusercontent.com/a/x"));
    }

    #[test]
    fn test_normalize_facebook_picture() {
        let profile = OAuthProvider::Facebook
            .normalize_profile(&json!({
                "id": "55",
                "name": "Minh",
                "picture": { "data": { "url": "https://fb.example/p.jpg" } }
            }))
            .unwrap();

        assert_eq!(profile.email, None);
        assert_eq!(profile.avatar.as_deref(), Some("https://fb.example/p.jpg"));
    }

    #[test]
    fn test_normalize_twitter_falls_back_to_username() {
        let profile = OAuthProvider::Twitter
            .normalize_profile(&json!({ "data": { "id": "77", "username": "minh_dev" } }))
            .unwrap();
        assert_eq!(profile.name, "minh_dev");
    }

    #[test]
    fn test_profile_without_id_fails() {
        let err = OAuthProvider::Google.normalize_profile(&json!({ "email": "a@b.co" })).unwrap_err();
        assert_eq!(err.message_key(), "auth.errors.oauthFailed");
    }

    #[tokio::test]
    async fn test_authorize_url_uses_pkce_and_state() {
        let service = service();
        let url = service.authorize_url("google").await.unwrap();

        let params: HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(params["client_id"], "google-id");
        assert_eq!(params["code_challenge_method"], "S256");
        assert_eq!(params["scope"], "openid email profile");
        assert!(service
            .cache
            .get::<PendingAuthorization>(&state_key(&params["state"]))
            .await
            .is_some());
    }

    #[tokio::test]
    async fn test_unsupported_provider() {
        let service = service();
        for provider in ["twitter", "github"] {
            let err = service.authorize_url(provider).await.unwrap_err();
            assert_eq!(err.message_key(), "auth.errors.unsupportedProvider");
        }
    }

    #[tokio::test]
    async fn test_callback_rejects_unknown_state() {
        let err = service().callback("google", "code", "forged").await.unwrap_err();
        assert_eq!(err.message_key(), "auth.errors.invalidOauthState");
    }
}
