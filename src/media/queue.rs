use futures::future::try_join_all;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::debug;

use super::{MediaStorage, UploadFile, UploadedMedia, ALLOWED_CONTENT_TYPES};
use crate::core::error::{GatewayError, GatewayResult};

/// Validating, concurrency-bounded front of a [`MediaStorage`]
#[derive(Clone)]
pub struct UploadQueue {
    storage: Arc<dyn MediaStorage>,
    permits: Arc<Semaphore>,
    max_file_size: usize,
}

impl UploadQueue {
    pub fn new(storage: Arc<dyn MediaStorage>, max_concurrent: usize, max_file_size: usize) -> Self {
        Self {
            storage,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
            max_file_size,
        }
    }

    pub fn validate(&self, file: &UploadFile) -> GatewayResult<()> {
        if !ALLOWED_CONTENT_TYPES.contains(&file.content_type.as_str()) {
            return Err(GatewayError::validation("file", "media.errors.unsupportedType"));
        }
        if file.bytes.is_empty() {
            return Err(GatewayError::validation("file", "media.errors.emptyFile"));
        }
        if file.bytes.len() > self.max_file_size {
            return Err(GatewayError::validation("file", "media.errors.fileTooLarge"));
        }
        Ok(())
    }

    pub async fn upload(&self, file: UploadFile, folder: &str) -> GatewayResult<UploadedMedia> {
        self.validate(&file)?;
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| GatewayError::upload("Upload queue closed"))?;

        debug!(file = %file.file_name, size = file.bytes.len(), backend = self.storage.name(), "Uploading file");
        self.storage.upload(file, folder).await
    }

    /// Validate every file first, then upload them concurrently
    pub async fn upload_many(&self, files: Vec<UploadFile>, folder: &str) -> GatewayResult<Vec<UploadedMedia>> {
        if files.is_empty() {
            return Err(GatewayError::validation("files", "media.errors.noFiles"));
        }
        for file in &files {
            self.validate(file)?;
        }
        try_join_all(files.into_iter().map(|file| self.upload(file, folder))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct SlowStorage {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl MediaStorage for SlowStorage {
        async fn upload(&self, file: UploadFile, folder: &str) -> GatewayResult<UploadedMedia> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(UploadedMedia {
                url: format!("https://cdn.test/{}/{}", folder, file.file_name),
                public_id: file.file_name,
            })
        }

        fn name(&self) -> &'static str {
            "slow"
        }
    }

    fn image(name: &str, content_type: &str, size: usize) -> UploadFile {
        UploadFile {
            file_name: name.to_string(),
            content_type: content_type.to_string(),
            bytes: vec![1; size],
        }
    }

    #[test]
    fn test_validation() {
        let queue = UploadQueue::new(Arc::new(SlowStorage::default()), 2, 10);
        assert!(queue.validate(&image("a.png", "image/png", 10)).is_ok());

        let cases = [
            (image("a.pdf", "application/pdf", 4), "media.errors.unsupportedType"),
            (image("a.png", "image/png", 11), "media.errors.fileTooLarge"),
            (image("a.png", "image/png", 0), "media.errors.emptyFile"),
        ];
        for (file, key) in cases {
            assert_eq!(queue.validate(&file).unwrap_err().message_key(), key);
        }
    }

    #[tokio::test]
    async fn test_batch_respects_concurrency_limit() {
        let storage = Arc::new(SlowStorage::default());
        let queue = UploadQueue::new(storage.clone(), 2, 1024);
        let files = (0..5).map(|i| image(&format!("{}.jpg", i), "image/jpeg", 8)).collect();

        let uploaded = queue.upload_many(files, "products/p1").await.unwrap();
        assert_eq!(uploaded.len(), 5);
        assert_eq!(uploaded[3].url, "https://cdn.test/products/p1/3.jpg");
        assert!(storage.peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_batch_fails_before_uploading_invalid_files() {
        let storage = Arc::new(SlowStorage::default());
        let queue = UploadQueue::new(storage.clone(), 2, 1024);
        let files = vec![image("ok.png", "image/png", 8), image("bad.txt", "text/plain", 8)];

        assert!(queue.upload_many(files, "x").await.is_err());
        assert_eq!(storage.peak.load(Ordering::SeqCst), 0);
    }
}
