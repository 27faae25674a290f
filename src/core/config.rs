//! # Configuration Module
//!
//! This module handles gateway configuration: the structures, YAML loading,
//! environment variable overrides and validation.
//!
//! ## Key Features
//! - YAML configuration parsing with serde (every section has defaults)
//! - Environment variable override support (`GATEWAY_<SECTION>_<FIELD>`)
//! - Human-readable durations (`5s`, `15m`) via `humantime`
//! - Comprehensive validation that reports every problem at once

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

use crate::core::error::{GatewayError, GatewayResult};
use crate::rpc::call::{CallOptions, MAX_RETRIES};

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/gateway.yaml";

/// Main gateway configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Message bus used to reach the backing services
    pub transport: TransportConfig,

    /// JWT, cookie and OAuth provider settings
    pub auth: AuthConfig,

    /// Cache backend for product details and OAuth state
    pub cache: CacheConfig,

    /// Media host used for avatars and product images
    pub media: MediaConfig,

    /// Translation settings
    pub i18n: I18nConfig,

    /// Logging and metrics
    pub observability: ObservabilityConfig,
}

impl GatewayConfig {
    /// Load configuration from `GATEWAY_CONFIG_PATH` (or the default path)
    ///
    /// A missing file is not an error: defaults are used and environment
    /// variables still apply.
    pub async fn load() -> GatewayResult<Self> {
        let path = std::env::var("GATEWAY_CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            Self::load_from_file(&path).await
        } else {
            tracing::info!(path = %path, "No configuration file found, using defaults");
            let mut config = Self::default();
            config.apply_env_overrides()?;
            config.validate()?;
            Ok(config)
        }
    }

    /// Load configuration from a YAML file
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> GatewayResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| GatewayError::config(format!("Failed to read config file: {}", e)))?;

        let mut config = Self::from_yaml(&content)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse YAML without applying overrides or validation
    pub fn from_yaml(content: &str) -> GatewayResult<Self> {
        serde_yaml::from_str(content).map_err(|e| GatewayError::config(format!("Failed to parse config: {}", e)))
    }

    /// Apply environment variable overrides to configuration
    ///
    /// Environment variables follow the pattern: GATEWAY_<SECTION>_<FIELD>
    /// For example: GATEWAY_SERVER_PORT=8080
    pub fn apply_env_overrides(&mut self) -> GatewayResult<()> {
        use std::env;

        // Server configuration overrides
        if let Ok(host) = env::var("GATEWAY_SERVER_HOST") {
            self.server.host = host;
        }

        if let Ok(port) = env::var("GATEWAY_SERVER_PORT") {
            self.server.port = port
                .parse()
                .map_err(|e| GatewayError::config(format!("Invalid GATEWAY_SERVER_PORT: {}", e)))?;
        }

        if let Ok(url) = env::var("GATEWAY_PUBLIC_URL") {
            self.server.public_url = url;
        }

        if let Ok(url) = env::var("GATEWAY_FRONTEND_URL") {
            self.server.frontend_url = url;
        }

        // Transport overrides
        if let Ok(kind) = env::var("GATEWAY_TRANSPORT") {
            self.transport.kind = match kind.to_lowercase().as_str() {
                "redis" => TransportKind::Redis,
                "local" => TransportKind::Local,
                other => return Err(GatewayError::config(format!("Invalid GATEWAY_TRANSPORT: {}", other))),
            };
        }

        if let Ok(host) = env::var("GATEWAY_REDIS_HOST") {
            self.transport.redis.host = host;
        }

        if let Ok(port) = env::var("GATEWAY_REDIS_PORT") {
            self.transport.redis.port = port
                .parse()
                .map_err(|e| GatewayError::config(format!("Invalid GATEWAY_REDIS_PORT: {}", e)))?;
        }

        if let Ok(password) = env::var("GATEWAY_REDIS_PASSWORD") {
            self.transport.redis.password = Some(password);
        }

        if let Ok(timeout) = env::var("GATEWAY_RPC_TIMEOUT") {
            self.transport.rpc.timeout = humantime::parse_duration(&timeout)
                .map_err(|e| GatewayError::config(format!("Invalid GATEWAY_RPC_TIMEOUT: {}", e)))?;
        }

        if let Ok(retries) = env::var("GATEWAY_RPC_RETRIES") {
            self.transport.rpc.retries = retries
                .parse()
                .map_err(|e| GatewayError::config(format!("Invalid GATEWAY_RPC_RETRIES: {}", e)))?;
        }

        // Auth overrides
        if let Ok(secret) = env::var("GATEWAY_JWT_SECRET") {
            self.auth.jwt.secret = secret;
        }

        if let Ok(ttl) = env::var("GATEWAY_JWT_TTL") {
            self.auth.jwt.ttl = humantime::parse_duration(&ttl)
                .map_err(|e| GatewayError::config(format!("Invalid GATEWAY_JWT_TTL: {}", e)))?;
        }

        if let Ok(secure) = env::var("GATEWAY_COOKIE_SECURE") {
            self.auth.cookie.secure = secure
                .parse()
                .map_err(|e| GatewayError::config(format!("Invalid GATEWAY_COOKIE_SECURE: {}", e)))?;
        }

        if let Ok(domain) = env::var("GATEWAY_COOKIE_DOMAIN") {
            self.auth.cookie.domain = Some(domain);
        }

        if let Ok(same_site) = env::var("GATEWAY_COOKIE_SAME_SITE") {
            self.auth.cookie.same_site = same_site;
        }

        for provider in ["facebook", "google", "twitter"] {
            self.apply_oauth_override(provider);
        }

        // Media overrides
        if let Ok(name) = env::var("GATEWAY_CLOUDINARY_CLOUD_NAME") {
            self.media.cloudinary.cloud_name = name;
        }

        if let Ok(key) = env::var("GATEWAY_CLOUDINARY_API_KEY") {
            self.media.cloudinary.api_key = key;
        }

        if let Ok(secret) = env::var("GATEWAY_CLOUDINARY_API_SECRET") {
            self.media.cloudinary.api_secret = secret;
        }

        // Logging configuration overrides
        if let Ok(level) = env::var("GATEWAY_LOG_LEVEL") {
            self.observability.logging.level = level;
        }

        if let Ok(format) = env::var("GATEWAY_LOG_FORMAT") {
            self.observability.logging.format = format;
        }

        Ok(())
    }

    /// `GATEWAY_OAUTH_<PROVIDER>_CLIENT_ID` / `_CLIENT_SECRET` enable a provider
    fn apply_oauth_override(&mut self, provider: &str) {
        let prefix = format!("GATEWAY_OAUTH_{}", provider.to_uppercase());
        let client_id = std::env::var(format!("{}_CLIENT_ID", prefix)).ok();
        let client_secret = std::env::var(format!("{}_CLIENT_SECRET", prefix)).ok();
        if client_id.is_none() && client_secret.is_none() {
            return;
        }

        let redirect_url = format!("{}/auth/{}/callback", self.server.public_url.trim_end_matches('/'), provider);
        let slot = match provider {
            "facebook" => &mut self.auth.oauth.facebook,
            "google" => &mut self.auth.oauth.google,
            _ => &mut self.auth.oauth.twitter,
        };
        let entry = slot.get_or_insert_with(|| OAuthProviderConfig {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_url,
            scopes: Vec::new(),
        });
        if let Some(id) = client_id {
            entry.client_id = id;
        }
        if let Some(secret) = client_secret {
            entry.client_secret = secret;
        }
    }

    /// Comprehensive configuration validation with detailed error messages
    pub fn validate(&self) -> GatewayResult<()> {
        let mut errors = Vec::new();

        // Validate server configuration
        if self.server.port == 0 {
            errors.push("server.port must be greater than 0".to_string());
        }

        if self.server.host.is_empty() {
            errors.push("server.host cannot be empty".to_string());
        }

        if self.server.max_request_size == 0 {
            errors.push("server.max_request_size must be greater than 0".to_string());
        }

        for (name, value) in [("public_url", &self.server.public_url), ("frontend_url", &self.server.frontend_url)] {
            if Url::parse(value).is_err() {
                errors.push(format!("server.{} is not a valid URL: {}", name, value));
            }
        }

        // Validate transport configuration
        if self.transport.rpc.timeout.is_zero() {
            errors.push("transport.rpc.timeout must be greater than 0".to_string());
        }

        if self.transport.rpc.retries > MAX_RETRIES {
            errors.push(format!("transport.rpc.retries cannot exceed {}", MAX_RETRIES));
        }

        if self.server.request_timeout < self.transport.rpc.max_wait() {
            errors.push(format!(
                "server.request_timeout ({:?}) is shorter than one RPC call with retries ({:?})",
                self.server.request_timeout,
                self.transport.rpc.max_wait()
            ));
        }

        if self.transport.kind == TransportKind::Redis && self.transport.redis.host.is_empty() {
            errors.push("transport.redis.host cannot be empty".to_string());
        }

        // Validate authentication configuration
        if self.auth.jwt.secret.is_empty() {
            errors.push("auth.jwt.secret cannot be empty".to_string());
        }

        if self.auth.jwt.ttl.is_zero() {
            errors.push("auth.jwt.ttl must be greater than 0".to_string());
        }

        match self.auth.cookie.same_site.to_lowercase().as_str() {
            "lax" | "strict" => {}
            "none" if self.auth.cookie.secure => {}
            "none" => errors.push("auth.cookie.same_site 'none' requires auth.cookie.secure".to_string()),
            other => errors.push(format!("Invalid auth.cookie.same_site: {}", other)),
        }

        for (name, provider) in self.auth.oauth.configured() {
            if provider.client_id.is_empty() || provider.client_secret.is_empty() {
                errors.push(format!("OAuth provider '{}' needs client_id and client_secret", name));
            }
            if Url::parse(&provider.redirect_url).is_err() {
                errors.push(format!("OAuth provider '{}' has an invalid redirect_url", name));
            }
        }

        // Validate media configuration
        if self.media.max_file_size == 0 {
            errors.push("media.max_file_size must be greater than 0".to_string());
        }

        if self.media.max_concurrent_uploads == 0 {
            errors.push("media.max_concurrent_uploads must be greater than 0".to_string());
        }

        // Validate i18n configuration
        if crate::i18n::Lang::parse(&self.i18n.default_lang).is_none() {
            errors.push(format!("Unsupported i18n.default_lang: {}", self.i18n.default_lang));
        }

        // Validate observability configuration
        match self.observability.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => errors.push(format!("Invalid log level: {}", self.observability.logging.level)),
        }

        match self.observability.logging.format.to_lowercase().as_str() {
            "json" | "text" => {}
            _ => errors.push(format!("Invalid log format: {}", self.observability.logging.format)),
        }

        // Return all validation errors
        if !errors.is_empty() {
            return Err(GatewayError::config(format!(
                "Configuration validation failed:\n{}",
                errors.join("\n")
            )));
        }

        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server bind address
    pub host: String,

    /// HTTP port
    pub port: u16,

    /// Externally visible base URL of the gateway (OAuth redirect URLs are built from it)
    pub public_url: String,

    /// Storefront URL the OAuth callback redirects to
    pub frontend_url: String,

    /// Allowed CORS origins; empty means the frontend URL only
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes
    pub max_request_size: usize,

    /// Overall deadline for one HTTP request
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            public_url: "http://localhost:3000".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            cors_origins: Vec::new(),
            max_request_size: 10 * 1024 * 1024,
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    Redis,
    Local,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub kind: TransportKind,
    pub redis: RedisConfig,
    /// Timeout and retry budget applied to every RPC call
    pub rpc: CallOptions,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            kind: TransportKind::Redis,
            redis: RedisConfig::default(),
            rpc: CallOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
    pub db: u8,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6379,
            password: None,
            db: 0,
        }
    }
}

impl RedisConfig {
    /// Connection URL in the form `redis://[:password@]host:port/db`
    pub fn url(&self) -> String {
        match &self.password {
            Some(password) => format!(
                "redis://:{}@{}:{}/{}",
                urlencoding::encode(password),
                self.host,
                self.port,
                self.db
            ),
            None => format!("redis://{}:{}/{}", self.host, self.port, self.db),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt: JwtConfig,
    pub cookie: CookieConfig,
    pub oauth: OAuthConfigs,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JwtConfig {
    pub secret: String,
    #[serde(with = "humantime_serde")]
    pub ttl: Duration,
    pub issuer: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "change-me-in-production".to_string(),
            ttl: Duration::from_secs(24 * 60 * 60),
            issuer: "shop-gateway".to_string(),
        }
    }
}

/// Settings of the access token cookie
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CookieConfig {
    pub name: String,
    pub domain: Option<String>,
    pub path: String,
    pub secure: bool,
    pub http_only: bool,
    /// `lax`, `strict` or `none`
    pub same_site: String,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: "access_token".to_string(),
            domain: None,
            path: "/".to_string(),
            secure: false,
            http_only: true,
            same_site: "lax".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OAuthConfigs {
    pub facebook: Option<OAuthProviderConfig>,
    pub google: Option<OAuthProviderConfig>,
    pub twitter: Option<OAuthProviderConfig>,
}

impl OAuthConfigs {
    /// Providers that have a configuration block
    pub fn configured(&self) -> Vec<(&'static str, &OAuthProviderConfig)> {
        [
            ("facebook", self.facebook.as_ref()),
            ("google", self.google.as_ref()),
            ("twitter", self.twitter.as_ref()),
        ]
        .into_iter()
        .filter_map(|(name, config)| config.map(|config| (name, config)))
        .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthProviderConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
    /// Overrides the provider's default scopes when non-empty
    #[serde(default)]
    pub scopes: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    Redis,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    pub key_prefix: String,
    /// TTL of cached product details
    #[serde(with = "humantime_serde")]
    pub product_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Redis,
            key_prefix: "shop:gateway:".to_string(),
            product_ttl: Duration::from_secs(300),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    pub cloudinary: CloudinaryConfig,
    /// Largest accepted file, in bytes
    pub max_file_size: usize,
    /// Uploads allowed in flight at once
    pub max_concurrent_uploads: usize,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            cloudinary: CloudinaryConfig::default(),
            max_file_size: 5 * 1024 * 1024,
            max_concurrent_uploads: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub folder: String,
    /// API base, overridable for tests
    pub api_base: String,
}

impl Default for CloudinaryConfig {
    fn default() -> Self {
        Self {
            cloud_name: String::new(),
            api_key: String::new(),
            api_secret: String::new(),
            folder: "shop".to_string(),
            api_base: "https://api.cloudinary.com/v1_1".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct I18nConfig {
    pub default_lang: String,
}

impl Default for I18nConfig {
    fn default() -> Self {
        Self {
            default_lang: "en".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `json` or `text`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub endpoint_path: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint_path: "/metrics".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        GatewayConfig::default().validate().unwrap();
    }

    #[test]
    fn test_yaml_overrides_defaults() {
        let config = GatewayConfig::from_yaml(
            r#"
server:
  port: 8080
transport:
  kind: local
  rpc:
    timeout: 750ms
    retries: 1
cache:
  backend: memory
  product_ttl: 1m
"#,
        )
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.transport.kind, TransportKind::Local);
        assert_eq!(config.transport.rpc, CallOptions::new(Duration::from_millis(750), 1));
        assert_eq!(config.cache.backend, CacheBackend::Memory);
        assert_eq!(config.cache.product_ttl, Duration::from_secs(60));
        config.validate().unwrap();
    }

    #[test]
    fn test_validation_reports_every_problem() {
        let mut config = GatewayConfig::default();
        config.server.port = 0;
        config.auth.jwt.secret.clear();
        config.auth.cookie.same_site = "none".to_string();
        config.observability.logging.format = "xml".to_string();

        let message = config.validate().unwrap_err().to_string();
        assert!(message.contains("server.port"));
        assert!(message.contains("auth.jwt.secret"));
        assert!(message.contains("requires auth.cookie.secure"));
        assert!(message.contains("Invalid log format"));
    }

    #[test]
    fn test_request_timeout_covers_every_rpc_attempt() {
        let mut config = GatewayConfig::default();
        config.transport.rpc = CallOptions::new(Duration::from_millis(150), 2);
        config.server.request_timeout = Duration::from_millis(200);
        let message = config.validate().unwrap_err().to_string();
        assert!(message.contains("server.request_timeout"));

        config.server.request_timeout = Duration::from_millis(450);
        config.validate().unwrap();
    }

    #[test]
    fn test_retry_budget_is_bounded() {
        let mut config = GatewayConfig::default();
        config.transport.rpc.retries = u32::MAX;
        let message = config.validate().unwrap_err().to_string();
        assert!(message.contains("transport.rpc.retries"));

        config.transport.rpc.retries = MAX_RETRIES;
        config.transport.rpc.timeout = Duration::from_secs(1);
        config.validate().unwrap();
    }

    #[test]
    fn test_redis_url() {
        let mut redis = RedisConfig::default();
        assert_eq!(redis.url(), "redis://localhost:6379/0");

        redis.password = Some("p@ss".to_string());
        assert_eq!(redis.url(), "redis://:p%40ss@localhost:6379/0");
    }

    #[test]
    fn test_oauth_provider_requires_credentials() {
        let mut config = GatewayConfig::default();
        config.auth.oauth.google = Some(OAuthProviderConfig {
            client_id: "id".to_string(),
            client_secret: String::new(),
            redirect_url: "http://localhost:3000/auth/google/callback".to_string(),
            scopes: vec![],
        });
        assert!(config.validate().unwrap_err().to_string().contains("'google'"));
    }
}
