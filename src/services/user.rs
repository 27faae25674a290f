use tracing::info;

use super::require_user;
use crate::core::error::GatewayResult;
use crate::core::pagination::PaginatedResult;
use crate::core::response::{build_base_response, BaseResponse, StatusKey};
use crate::dto::user::{ListUsersQuery, UpdateProfileDto, UpdateUserPayload, UserDto};
use crate::dto::IdPayload;
use crate::media::{UploadFile, UploadQueue};
use crate::rpc::patterns::user;
use crate::rpc::ServiceClient;

const AVATAR_FOLDER: &str = "avatars";

pub struct UserService {
    user: ServiceClient,
    uploads: UploadQueue,
}

impl UserService {
    pub fn new(user: ServiceClient, uploads: UploadQueue) -> Self {
        Self { user, uploads }
    }

    pub async fn get_profile(&self, user_id: Option<&str>) -> GatewayResult<BaseResponse<UserDto>> {
        let user_id = require_user(user_id)?;
        let profile: UserDto = self.user.send(user::GET_USER_BY_ID, &IdPayload::new(user_id)).await?;
        Ok(build_base_response(StatusKey::Success, profile))
    }

    pub async fn update_profile(
        &self,
        user_id: Option<&str>,
        dto: UpdateProfileDto,
    ) -> GatewayResult<BaseResponse<UserDto>> {
        let user_id = require_user(user_id)?;
        dto.validate()?;

        let payload = UpdateUserPayload {
            id: user_id.to_string(),
            name: dto.name.map(|name| name.trim().to_string()),
            phone: dto.phone,
            avatar: None,
        };
        let updated: UserDto = self.user.send(user::UPDATE_USER, &payload).await?;
        Ok(build_base_response(StatusKey::Success, updated))
    }

    pub async fn upload_avatar(&self, user_id: Option<&str>, file: UploadFile) -> GatewayResult<BaseResponse<UserDto>> {
        let user_id = require_user(user_id)?;
        let uploaded = self.uploads.upload(file, AVATAR_FOLDER).await?;
        info!(user_id, public_id = %uploaded.public_id, "Avatar uploaded");

        let payload = UpdateUserPayload {
            id: user_id.to_string(),
            avatar: Some(uploaded.url),
            ..Default::default()
        };
        let updated: UserDto = self.user.send(user::UPDATE_USER, &payload).await?;
        Ok(build_base_response(StatusKey::Success, updated))
    }

    pub async fn list_users(&self, query: ListUsersQuery) -> GatewayResult<BaseResponse<PaginatedResult<UserDto>>> {
        let payload = query.validate()?;
        let page: PaginatedResult<UserDto> = self.user.send(user::GET_USERS, &payload).await?;
        Ok(build_base_response(StatusKey::Success, page.normalized()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::GatewayResult;
    use crate::media::{MediaStorage, UploadedMedia};
    use crate::rpc::MessageRouter;
    use crate::services::test_support::{clients, Calls};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::Arc;

    struct FakeStorage;

    #[async_trait]
    impl MediaStorage for FakeStorage {
        async fn upload(&self, file: UploadFile, folder: &str) -> GatewayResult<UploadedMedia> {
            Ok(UploadedMedia {
                url: format!("https://cdn.test/{}/{}", folder, file.file_name),
                public_id: file.file_name,
            })
        }

        fn name(&self) -> &'static str {
            "fake"
        }
    }

    fn service(router: MessageRouter) -> UserService {
        UserService::new(clients(router).user, UploadQueue::new(Arc::new(FakeStorage), 2, 1024))
    }

    fn echo_user(payload: Value) -> Value {
        json!({
            "id": payload["id"],
            "email": "lan@shop.vn",
            "name": payload.get("name").cloned().unwrap_or(json!("Lan")),
            "avatar": payload.get("avatar").cloned(),
            "createdAt": "2024-05-01T10:00:00Z"
        })
    }

    #[tokio::test]
    async fn test_upload_avatar_updates_user() {
        let router = MessageRouter::new();
        router.on(user::UPDATE_USER, |payload| async move { Ok(echo_user(payload)) });

        let file = UploadFile {
            file_name: "me.png".to_string(),
            content_type: "image/png".to_string(),
            bytes: vec![1, 2, 3],
        };
        let response = service(router).upload_avatar(Some("u1"), file).await.unwrap();
        assert_eq!(response.data.avatar.as_deref(), Some("https://cdn.test/avatars/me.png"));
    }

    #[tokio::test]
    async fn test_update_profile_checks_user_then_body() {
        let calls = Calls::default();
        let router = MessageRouter::new();
        let seen = calls.clone();
        router.on(user::UPDATE_USER, move |payload| {
            seen.hit();
            async move { Ok(echo_user(payload)) }
        });
        let service = service(router);

        let err = service.update_profile(None, UpdateProfileDto::default()).await.unwrap_err();
        assert_eq!(err.message_key(), "common.errors.unauthorized");

        let err = service
            .update_profile(Some("u1"), UpdateProfileDto::default())
            .await
            .unwrap_err();
        assert_eq!(err.message_key(), "user.errors.nothingToUpdate");
        assert_eq!(calls.count(), 0);

        let dto = UpdateProfileDto {
            name: Some(" Lan Anh ".to_string()),
            phone: None,
        };
        let response = service.update_profile(Some("u1"), dto).await.unwrap();
        assert_eq!(response.data.name, "Lan Anh");
    }

    #[tokio::test]
    async fn test_list_users_fills_total_pages() {
        let router = MessageRouter::new();
        router.on(user::GET_USERS, |payload| async move {
            assert_eq!(payload["pageSize"], 2);
            Ok(json!({ "items": [], "total": 5, "page": 1, "pageSize": 2 }))
        });

        let query = ListUsersQuery {
            page_size: Some(2),
            ..Default::default()
        };
        let response = service(router).list_users(query).await.unwrap();
        assert_eq!(response.data.total_pages, 3);
    }
}
