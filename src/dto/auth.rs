use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{is_valid_email, require_text};
use crate::core::error::{GatewayError, GatewayResult};
use crate::dto::user::UserDto;

pub const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterDto {
    pub email: String,
    pub password: String,
    pub name: String,
}

impl RegisterDto {
    pub fn validate(&self) -> GatewayResult<()> {
        if !is_valid_email(&self.email) {
            return Err(GatewayError::validation("email", "auth.errors.invalidEmail"));
        }
        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(GatewayError::validation("password", "auth.errors.passwordTooShort"));
        }
        require_text(&self.name, 100, "name", "auth.errors.nameRequired")
    }

    /// Trimmed copy with a lowercased email
    pub fn normalized(&self) -> Self {
        Self {
            email: self.email.trim().to_lowercase(),
            password: self.password.clone(),
            name: self.name.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginDto {
    pub email: String,
    pub password: String,
}

impl LoginDto {
    pub fn validate(&self) -> GatewayResult<()> {
        if !is_valid_email(self.email.trim()) {
            return Err(GatewayError::validation("email", "auth.errors.invalidEmail"));
        }
        if self.password.is_empty() {
            return Err(GatewayError::validation("password", "auth.errors.passwordRequired"));
        }
        Ok(())
    }
}

/// Provider identity after normalization, forwarded as the `OAUTH_LOGIN` payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OAuthProfile {
    pub provider: String,
    pub provider_id: String,
    pub email: Option<String>,
    pub name: String,
    pub avatar: Option<String>,
}

/// Body of a successful login; the token is also set as a cookie
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: UserDto,
    pub access_token: String,
    /// Token lifetime in seconds
    pub expires_in: u64,
}

/// `USER_REGISTERED` event
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRegisteredEvent {
    pub user_id: String,
    pub email: String,
    pub name: String,
    pub lang: String,
}
