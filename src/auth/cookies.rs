use axum::http::header::{HeaderMap, COOKIE};
use axum::http::HeaderValue;
use std::time::Duration;

use crate::core::config::CookieConfig;
use crate::core::error::{GatewayError, GatewayResult};

/// Access token cookie attributes
#[derive(Debug, Clone)]
pub struct CookieSettings {
    pub name: String,
    domain: Option<String>,
    path: String,
    secure: bool,
    http_only: bool,
    same_site: String,
    max_age: Duration,
}

impl CookieSettings {
    pub fn new(config: &CookieConfig, max_age: Duration) -> Self {
        let same_site = match config.same_site.to_lowercase().as_str() {
            "strict" => "Strict",
            "none" => "None",
            _ => "Lax",
        };
        Self {
            name: config.name.clone(),
            domain: config.domain.clone(),
            path: config.path.clone(),
            secure: config.secure,
            http_only: config.http_only,
            same_site: same_site.to_string(),
            max_age,
        }
    }

    /// `Set-Cookie` value storing `token`
    pub fn session(&self, token: &str) -> GatewayResult<HeaderValue> {
        self.build(token, self.max_age.as_secs())
    }

    /// `Set-Cookie` value that expires the cookie
    pub fn cleared(&self) -> GatewayResult<HeaderValue> {
        self.build("", 0)
    }

    fn build(&self, value: &str, max_age: u64) -> GatewayResult<HeaderValue> {
        let mut cookie = format!("{}={}; Path={}; Max-Age={}", self.name, value, self.path, max_age);
        if let Some(domain) = &self.domain {
            cookie.push_str(&format!("; Domain={}", domain));
        }
        if self.http_only {
            cookie.push_str("; HttpOnly");
        }
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie.push_str(&format!("; SameSite={}", self.same_site));

        HeaderValue::from_str(&cookie).map_err(|e| GatewayError::internal(format!("Invalid cookie header: {}", e)))
    }

    /// Value of this cookie in the request's `Cookie` headers
    pub fn read<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, value)| *name == self.name && !value.is_empty())
            .map(|(_, value)| value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> CookieSettings {
        CookieSettings::new(&CookieConfig::default(), Duration::from_secs(3600))
    }

    #[test]
    fn test_session_cookie_attributes() {
        let value = settings().session("abc").unwrap();
        assert_eq!(
            value.to_str().unwrap(),
            "access_token=abc; Path=/; Max-Age=3600; HttpOnly; SameSite=Lax"
        );
    }

    #[test]
    fn test_secure_cookie_with_domain() {
        let config = CookieConfig {
            domain: Some("shop.vn".to_string()),
            secure: true,
            same_site: "none".to_string(),
            ..CookieConfig::default()
        };
        let value = CookieSettings::new(&config, Duration::from_secs(60)).cleared().unwrap();
        assert_eq!(
            value.to_str().unwrap(),
            "access_token=; Path=/; Max-Age=0; Domain=shop.vn; HttpOnly; Secure; SameSite=None"
        );
    }

    #[test]
    fn test_read_from_request() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("theme=dark; access_token=tok123"));
        assert_eq!(settings().read(&headers), Some("tok123"));

        headers.insert(COOKIE, HeaderValue::from_static("access_token="));
        assert_eq!(settings().read(&headers), None);
    }
}
