use std::sync::Arc;
use tracing::info;

use super::{require_user, NotificationService};
use crate::auth::JwtService;
use crate::core::error::GatewayResult;
use crate::core::response::{build_base_response, BaseResponse, StatusKey};
use crate::dto::auth::{AuthResponse, LoginDto, OAuthProfile, RegisterDto, UserRegisteredEvent};
use crate::dto::user::UserDto;
use crate::dto::IdPayload;
use crate::i18n::Lang;
use crate::rpc::patterns::{auth, user};
use crate::rpc::ServiceClient;

pub struct AuthService {
    auth: ServiceClient,
    user: ServiceClient,
    jwt: Arc<JwtService>,
    notifications: NotificationService,
}

impl AuthService {
    pub fn new(auth: ServiceClient, user: ServiceClient, jwt: Arc<JwtService>, notifications: NotificationService) -> Self {
        Self {
            auth,
            user,
            jwt,
            notifications,
        }
    }

    pub async fn register(&self, dto: RegisterDto, lang: Lang) -> GatewayResult<BaseResponse<UserDto>> {
        let dto = dto.normalized();
        dto.validate()?;

        let created: UserDto = self.auth.send(auth::REGISTER, &dto).await?;
        info!(user_id = %created.id, "User registered");

        self.notifications
            .user_registered(&UserRegisteredEvent {
                user_id: created.id.clone(),
                email: created.email.clone(),
                name: created.name.clone(),
                lang: lang.as_str().to_string(),
            })
            .await;

        Ok(build_base_response(StatusKey::Success, created))
    }

    /// Credentials are checked by the auth service; the gateway signs the token
    pub async fn login(&self, dto: LoginDto) -> GatewayResult<BaseResponse<AuthResponse>> {
        dto.validate()?;
        let dto = LoginDto {
            email: dto.email.trim().to_lowercase(),
            password: dto.password,
        };

        let user: UserDto = self.auth.send(auth::LOGIN, &dto).await?;
        Ok(build_base_response(StatusKey::Success, self.session(user)?))
    }

    pub fn logout(&self) -> BaseResponse<()> {
        build_base_response(StatusKey::Success, ())
    }

    pub async fn me(&self, user_id: Option<&str>) -> GatewayResult<BaseResponse<UserDto>> {
        let user_id = require_user(user_id)?;
        let user: UserDto = self.user.send(user::GET_USER_BY_ID, &IdPayload::new(user_id)).await?;
        Ok(build_base_response(StatusKey::Success, user))
    }

    /// Find-or-create the account behind a provider identity and open a session
    pub async fn oauth_login(&self, profile: OAuthProfile) -> GatewayResult<BaseResponse<AuthResponse>> {
        let user: UserDto = self.auth.send(auth::OAUTH_LOGIN, &profile).await?;
        info!(user_id = %user.id, provider = %profile.provider, "OAuth login");
        Ok(build_base_response(StatusKey::Success, self.session(user)?))
    }

    fn session(&self, user: UserDto) -> GatewayResult<AuthResponse> {
        let access_token = self.jwt.issue(&user)?;
        Ok(AuthResponse {
            user,
            access_token,
            expires_in: self.jwt.ttl().as_secs(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::JwtConfig;
    use crate::rpc::exception::{ErrorCode, TypedRpcException};
    use crate::rpc::patterns::notification;
    use crate::rpc::MessageRouter;
    use crate::services::test_support::{clients, Calls};
    use serde_json::{json, Value};

    fn user_json(email: &str) -> Value {
        json!({
            "id": "u1",
            "email": email,
            "name": "Lan",
            "role": "user",
            "createdAt": "2024-05-01T10:00:00Z"
        })
    }

    fn service(router: MessageRouter) -> AuthService {
        let clients = clients(router);
        AuthService::new(
            clients.auth,
            clients.user,
            Arc::new(JwtService::new(&JwtConfig::default())),
            NotificationService::new(clients.notification),
        )
    }

    #[tokio::test]
    async fn test_register_emits_event() {
        let events = Calls::default();
        let router = MessageRouter::new();
        router.on(auth::REGISTER, |payload: Value| async move {
            assert_eq!(payload["email"], "lan@shop.vn");
            Ok(user_json("lan@shop.vn"))
        });
        let seen = events.clone();
        router.on_event(notification::USER_REGISTERED, move |payload: Value| {
            let seen = seen.clone();
            async move {
                assert_eq!(payload["lang"], "vi");
                seen.hit();
            }
        });

        let dto = RegisterDto {
            email: " Lan@Shop.vn".to_string(),
            password: "password1".to_string(),
            name: "Lan".to_string(),
        };
        let response = service(router).register(dto, Lang::Vi).await.unwrap();
        assert_eq!(response.data.id, "u1");
        assert_eq!(events.count(), 1);
    }

    #[tokio::test]
    async fn test_login_signs_token() {
        let router = MessageRouter::new();
        router.on(auth::LOGIN, |_| async { Ok(user_json("lan@shop.vn")) });

        let service = service(router);
        let response = service
            .login(LoginDto {
                email: "lan@shop.vn".to_string(),
                password: "password1".to_string(),
            })
            .await
            .unwrap();

        let claims = service.jwt.verify(&response.data.access_token).unwrap();
        assert_eq!(claims.sub, "u1");
        assert_eq!(response.data.expires_in, 86_400);
    }

    #[tokio::test]
    async fn test_login_propagates_remote_error() {
        let router = MessageRouter::new();
        router.on(auth::LOGIN, |_| async {
            Err(TypedRpcException::new(ErrorCode::Unauthorized, "auth.errors.invalidCredentials"))
        });

        let err = service(router)
            .login(LoginDto {
                email: "lan@shop.vn".to_string(),
                password: "wrong-password".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.message_key(), "auth.errors.invalidCredentials");
    }

    #[tokio::test]
    async fn test_me_requires_user_before_rpc() {
        let calls = Calls::default();
        let router = MessageRouter::new();
        let seen = calls.clone();
        router.on(user::GET_USER_BY_ID, move |_| {
            seen.hit();
            async { Ok(user_json("lan@shop.vn")) }
        });

        let service = service(router);
        assert!(service.me(None).await.is_err());
        assert_eq!(calls.count(), 0);

        assert_eq!(service.me(Some("u1")).await.unwrap().data.email, "lan@shop.vn");
        assert_eq!(calls.count(), 1);
    }
}
