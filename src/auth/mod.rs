//! # Authentication Module
//!
//! Identity at the gateway edge:
//! - `jwt`: HS256 access tokens issued after login
//! - `cookies`: the `Set-Cookie` header carrying the token
//! - `extract`: axum extractors resolving the caller from a cookie or bearer header
//! - `oauth`: authorization-code + PKCE login with Facebook, Google and Twitter

pub mod cookies;
pub mod extract;
pub mod jwt;
pub mod oauth;

pub use cookies::CookieSettings;
pub use extract::{AdminUser, AuthUser, CurrentUser, MaybeUser};
pub use jwt::{Claims, JwtService};
pub use oauth::{OAuthProvider, OAuthService};
