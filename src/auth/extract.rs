//! Caller identity extractors.
//!
//! The token is read from the access token cookie first, then from an
//! `Authorization: Bearer` header.

use async_trait::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use std::sync::Arc;
use tracing::debug;

use crate::auth::cookies::CookieSettings;
use crate::auth::jwt::{Claims, JwtService};
use crate::core::error::GatewayError;
use crate::dto::user::Role;

/// Authenticated caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: String,
    pub email: String,
    pub role: Role,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

impl From<Claims> for CurrentUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
            role: claims.role,
        }
    }
}

/// Optional identity; an absent or invalid token yields `None`
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<CurrentUser>);

impl MaybeUser {
    pub fn id(&self) -> Option<&str> {
        self.0.as_ref().map(|user| user.id.as_str())
    }
}

/// Required identity, `401` otherwise
#[derive(Debug, Clone)]
pub struct AuthUser(pub CurrentUser);

/// Admin identity, `403` for other roles
#[derive(Debug, Clone)]
pub struct AdminUser(pub CurrentUser);

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn resolve<S>(parts: &Parts, state: &S) -> Option<Result<CurrentUser, GatewayError>>
where
    Arc<JwtService>: FromRef<S>,
    Arc<CookieSettings>: FromRef<S>,
{
    let cookies = Arc::<CookieSettings>::from_ref(state);
    let token = cookies.read(&parts.headers).or_else(|| bearer_token(parts))?;
    let jwt = Arc::<JwtService>::from_ref(state);
    Some(jwt.verify(token).map(CurrentUser::from))
}

#[async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
    Arc<JwtService>: FromRef<S>,
    Arc<CookieSettings>: FromRef<S>,
{
    type Rejection = GatewayError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match resolve(parts, state) {
            Some(Ok(user)) => Ok(Self(Some(user))),
            Some(Err(e)) => {
                debug!(error = %e, "Ignoring invalid access token");
                Ok(Self(None))
            }
            None => Ok(Self(None)),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Arc<JwtService>: FromRef<S>,
    Arc<CookieSettings>: FromRef<S>,
{
    type Rejection = GatewayError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match resolve(parts, state) {
            Some(user) => user.map(Self),
            None => Err(GatewayError::unauthorized("auth.errors.missingToken")),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    Arc<JwtService>: FromRef<S>,
    Arc<CookieSettings>: FromRef<S>,
{
    type Rejection = GatewayError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(GatewayError::forbidden("auth.errors.adminOnly"));
        }
        Ok(Self(user))
    }
}
