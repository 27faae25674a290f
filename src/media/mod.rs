//! # Media Module
//!
//! Image uploads to the external media host. Handlers hand multipart files to the
//! [`UploadQueue`], which checks type and size and bounds how many uploads run at
//! once, before passing them to a [`MediaStorage`] backend.

pub mod cloudinary;
pub mod queue;

pub use cloudinary::CloudinaryStorage;
pub use queue::UploadQueue;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::core::error::GatewayResult;

/// Content types accepted for uploads
pub const ALLOWED_CONTENT_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/webp", "image/gif"];

/// File received from a multipart request
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadedMedia {
    pub url: String,
    pub public_id: String,
}

#[async_trait]
pub trait MediaStorage: Send + Sync {
    /// Store `file` under `folder` and return its public URL
    async fn upload(&self, file: UploadFile, folder: &str) -> GatewayResult<UploadedMedia>;

    fn name(&self) -> &'static str;
}
