//! # Configuration Loading Tests

use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

use shop_gateway::core::config::{CacheBackend, TransportKind};
use shop_gateway::GatewayConfig;

fn yaml_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[tokio::test]
async fn test_load_from_file() {
    let file = yaml_file(
        r#"
server:
  port: 8081
  frontend_url: "https://shop.example.com"
  cors_origins:
    - "https://shop.example.com"
  request_timeout: 15s
transport:
  kind: local
  rpc:
    timeout: 2s
    retries: 0
auth:
  jwt:
    secret: "file-secret"
    ttl: 12h
  oauth:
    google:
      client_id: "google-id"
      client_secret: "google-secret"
      redirect_url: "https://api.shop.example.com/auth/google/callback"
cache:
  backend: memory
i18n:
  default_lang: vi
"#,
    );

    let config = GatewayConfig::load_from_file(file.path()).await.unwrap();

    assert_eq!(config.server.port, 8081);
    assert_eq!(config.server.request_timeout, Duration::from_secs(15));
    assert_eq!(config.transport.kind, TransportKind::Local);
    assert_eq!(config.transport.rpc.timeout, Duration::from_secs(2));
    assert_eq!(config.transport.rpc.retries, 0);
    assert_eq!(config.auth.jwt.ttl, Duration::from_secs(12 * 60 * 60));
    assert_eq!(config.cache.backend, CacheBackend::Memory);
    assert_eq!(config.i18n.default_lang, "vi");

    let providers: Vec<&str> = config.auth.oauth.configured().into_iter().map(|(name, _)| name).collect();
    assert_eq!(providers, vec!["google"]);
}

#[tokio::test]
async fn test_sample_config_is_valid() {
    let config = GatewayConfig::load_from_file("config/gateway.yaml").await.unwrap();
    assert_eq!(config.server.port, 3000);
    assert_eq!(config.cache.key_prefix, "shop:gateway:");
}

#[tokio::test]
async fn test_invalid_values_are_rejected() {
    let file = yaml_file(
        r#"
server:
  frontend_url: "not a url"
i18n:
  default_lang: fr
"#,
    );

    let message = GatewayConfig::load_from_file(file.path()).await.unwrap_err().to_string();

    assert!(message.contains("server.frontend_url"));
    assert!(message.contains("Unsupported i18n.default_lang"));
}

#[tokio::test]
async fn test_malformed_yaml_is_rejected() {
    let file = yaml_file("server: [port: 3000");

    let err = GatewayConfig::load_from_file(file.path()).await.unwrap_err();

    assert!(err.to_string().contains("Failed to parse config"));
}

#[tokio::test]
async fn test_missing_file_is_an_error() {
    let err = GatewayConfig::load_from_file("config/does-not-exist.yaml").await.unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}
