//! Catalog: products, categories and reviews.
//!
//! Product details and the category tree are cached; every mutation of a product
//! drops its cache entry.

use futures::future::try_join_all;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::require_user;
use crate::caching::CacheService;
use crate::core::error::{GatewayError, GatewayResult};
use crate::core::pagination::{PaginatedResult, Pagination, PaginationQuery};
use crate::core::response::{build_base_response, BaseResponse, StatusKey};
use crate::dto::product::{
    AddProductImagesPayload, CategoryDto, CreateCategoryDto, CreateProductDto, CreateReviewDto, CreateReviewPayload,
    ListReviewsPayload, ProductDto, ProductImageDto, ProductQuery, ReviewDto, SkuPayload, UpdateProductDto,
    UpdateProductPayload,
};
use crate::dto::IdPayload;
use crate::media::{UploadFile, UploadQueue};
use crate::rpc::patterns::product;
use crate::rpc::ServiceClient;

const PRODUCT_KEY_PREFIX: &str = "product:";
const CATEGORY_TREE_KEY: &str = "categories:tree";

/// Every cached entry of one product starts with this
fn product_key_scope(id: &str) -> String {
    format!("{}{}:", PRODUCT_KEY_PREFIX, id)
}

pub fn product_cache_key(id: &str) -> String {
    format!("{}detail", product_key_scope(id))
}

fn reviews_cache_key(id: &str, pagination: Pagination) -> String {
    format!("{}reviews:{}:{}", product_key_scope(id), pagination.page, pagination.page_size)
}

pub struct ProductService {
    product: ServiceClient,
    cache: CacheService,
    ttl: Duration,
    uploads: UploadQueue,
}

impl ProductService {
    pub fn new(product: ServiceClient, cache: CacheService, ttl: Duration, uploads: UploadQueue) -> Self {
        Self {
            product,
            cache,
            ttl,
            uploads,
        }
    }

    pub async fn list_products(
        &self,
        query: ProductQuery,
        include_deleted: bool,
    ) -> GatewayResult<BaseResponse<PaginatedResult<ProductDto>>> {
        let mut filter = query.validate()?;
        filter.include_deleted = include_deleted;

        let page: PaginatedResult<ProductDto> = self.product.send(product::GET_PRODUCTS, &filter).await?;
        Ok(build_base_response(StatusKey::Success, page.normalized()))
    }

    pub async fn get_product_detail(&self, id: &str) -> GatewayResult<BaseResponse<ProductDto>> {
        let key = product_cache_key(id);
        if let Some(cached) = self.cache.get::<ProductDto>(&key).await {
            return Ok(build_base_response(StatusKey::Success, cached));
        }

        let detail: ProductDto = self.product.send(product::GET_PRODUCT_DETAIL, &IdPayload::new(id)).await?;
        self.cache.set_quietly(&key, &detail, self.ttl).await;
        Ok(build_base_response(StatusKey::Success, detail))
    }

    pub async fn get_category_tree(&self) -> GatewayResult<BaseResponse<Vec<CategoryDto>>> {
        if let Some(cached) = self.cache.get::<Vec<CategoryDto>>(CATEGORY_TREE_KEY).await {
            return Ok(build_base_response(StatusKey::Success, cached));
        }

        let tree: Vec<CategoryDto> = self.product.send(product::GET_CATEGORY_TREE, &()).await?;
        self.cache.set_quietly(CATEGORY_TREE_KEY, &tree, self.ttl).await;
        Ok(build_base_response(StatusKey::Success, tree))
    }

    /// Every variant SKU must be free
    pub async fn create_product(&self, mut dto: CreateProductDto) -> GatewayResult<BaseResponse<ProductDto>> {
        dto.validate()?;
        dto.normalize();

        let lookups = dto.variants.iter().map(|variant| async move {
            let sku = variant.sku.clone();
            let taken: bool = self
                .product
                .send(product::CHECK_SKU_EXISTS, &SkuPayload { sku: sku.clone() })
                .await?;
            Ok::<_, GatewayError>((sku, taken))
        });
        if let Some((sku, _)) = try_join_all(lookups).await?.into_iter().find(|(_, taken)| *taken) {
            debug!(sku = %sku, "SKU already in use");
            return Err(GatewayError::conflict("product.errors.skuExists"));
        }

        let created: ProductDto = self.product.send(product::CREATE_PRODUCT, &dto).await?;
        info!(product_id = %created.id, "Product created");
        Ok(build_base_response(StatusKey::Success, created))
    }

    pub async fn update_product(&self, id: &str, dto: UpdateProductDto) -> GatewayResult<BaseResponse<ProductDto>> {
        dto.validate()?;
        self.ensure_exists(id).await?;

        let payload = UpdateProductPayload {
            id: id.to_string(),
            changes: dto,
        };
        let updated: ProductDto = self.product.send(product::UPDATE_PRODUCT, &payload).await?;
        self.invalidate(id).await;
        Ok(build_base_response(StatusKey::Success, updated))
    }

    /// Soft delete; the product keeps its id and gains `deletedAt`
    pub async fn delete_product(&self, id: &str) -> GatewayResult<BaseResponse<ProductDto>> {
        self.ensure_exists(id).await?;

        let deleted: ProductDto = self.product.send(product::DELETE_PRODUCT, &IdPayload::new(id)).await?;
        self.invalidate(id).await;
        info!(product_id = %id, "Product deleted");
        Ok(build_base_response(StatusKey::Success, deleted))
    }

    pub async fn upload_product_images(
        &self,
        id: &str,
        files: Vec<UploadFile>,
    ) -> GatewayResult<BaseResponse<ProductDto>> {
        self.ensure_exists(id).await?;

        let uploaded = self.uploads.upload_many(files, &format!("products/{}", id)).await?;
        let payload = AddProductImagesPayload {
            product_id: id.to_string(),
            images: uploaded
                .into_iter()
                .map(|media| ProductImageDto {
                    url: media.url,
                    public_id: media.public_id,
                })
                .collect(),
        };

        let updated: ProductDto = self.product.send(product::ADD_PRODUCT_IMAGES, &payload).await?;
        self.invalidate(id).await;
        Ok(build_base_response(StatusKey::Success, updated))
    }

    pub async fn create_category(&self, dto: CreateCategoryDto) -> GatewayResult<BaseResponse<CategoryDto>> {
        dto.validate()?;
        let created: CategoryDto = self.product.send(product::CREATE_CATEGORY, &dto).await?;
        if let Err(e) = self.cache.delete(CATEGORY_TREE_KEY).await {
            warn!(error = %e, "Failed to drop cached category tree");
        }
        Ok(build_base_response(StatusKey::Success, created))
    }

    pub async fn create_review(
        &self,
        user_id: Option<&str>,
        product_id: &str,
        dto: CreateReviewDto,
    ) -> GatewayResult<BaseResponse<ReviewDto>> {
        let user_id = require_user(user_id)?;
        dto.validate()?;
        self.ensure_exists(product_id).await?;

        let payload = CreateReviewPayload {
            product_id: product_id.to_string(),
            user_id: user_id.to_string(),
            rating: dto.rating,
            comment: dto.comment.map(|c| c.trim().to_string()).filter(|c| !c.is_empty()),
        };
        let review: ReviewDto = self.product.send(product::CREATE_REVIEW, &payload).await?;
        self.invalidate(product_id).await;
        Ok(build_base_response(StatusKey::Success, review))
    }

    pub async fn list_reviews(
        &self,
        product_id: &str,
        query: PaginationQuery,
    ) -> GatewayResult<BaseResponse<PaginatedResult<ReviewDto>>> {
        let pagination = query.validate()?;
        let key = reviews_cache_key(product_id, pagination);
        if let Some(cached) = self.cache.get::<PaginatedResult<ReviewDto>>(&key).await {
            return Ok(build_base_response(StatusKey::Success, cached));
        }

        let payload = ListReviewsPayload {
            product_id: product_id.to_string(),
            pagination,
        };
        let page = self
            .product
            .send::<_, PaginatedResult<ReviewDto>>(product::GET_REVIEWS, &payload)
            .await?
            .normalized();
        self.cache.set_quietly(&key, &page, self.ttl).await;
        Ok(build_base_response(StatusKey::Success, page))
    }

    async fn ensure_exists(&self, id: &str) -> GatewayResult<()> {
        let exists: bool = self
            .product
            .send(product::CHECK_PRODUCT_EXISTS, &IdPayload::new(id))
            .await?;
        if !exists {
            return Err(GatewayError::not_found("product.errors.notFound"));
        }
        Ok(())
    }

    /// Drop the cached detail and review pages of `id`
    async fn invalidate(&self, id: &str) {
        if let Err(e) = self.cache.invalidate_prefix(&product_key_scope(id)).await {
            warn!(product_id = %id, error = %e, "Failed to invalidate cached product");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caching::InMemoryCache;
    use crate::dto::product::CreateVariantDto;
    use crate::media::{MediaStorage, UploadedMedia};
    use crate::rpc::MessageRouter;
    use crate::services::test_support::{clients, Calls};
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use serde_json::{json, Value};
    use std::sync::Arc;

    struct NoStorage;

    #[async_trait]
    impl MediaStorage for NoStorage {
        async fn upload(&self, _file: UploadFile, _folder: &str) -> GatewayResult<UploadedMedia> {
            Err(GatewayError::upload("not available in tests"))
        }

        fn name(&self) -> &'static str {
            "none"
        }
    }

    fn product_json(id: &str) -> Value {
        json!({
            "id": id,
            "name": "Linen shirt",
            "slug": "linen-shirt",
            "categoryId": "c1",
            "basePrice": "250000",
            "createdAt": "2024-05-01T10:00:00Z"
        })
    }

    fn service(router: MessageRouter) -> (ProductService, CacheService) {
        let cache = CacheService::new(Arc::new(InMemoryCache::new()));
        let service = ProductService::new(
            clients(router).product,
            cache.clone(),
            Duration::from_secs(60),
            UploadQueue::new(Arc::new(NoStorage), 1, 1024),
        );
        (service, cache)
    }

    #[tokio::test]
    async fn test_detail_is_served_from_cache() {
        let calls = Calls::default();
        let router = MessageRouter::new();
        let seen = calls.clone();
        router.on(product::GET_PRODUCT_DETAIL, move |payload: Value| {
            seen.hit();
            async move { Ok(product_json(payload["id"].as_str().unwrap_or_default())) }
        });
        let (service, _) = service(router);

        let first = service.get_product_detail("p1").await.unwrap();
        let second = service.get_product_detail("p1").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(calls.count(), 1);
    }

    #[tokio::test]
    async fn test_update_invalidates_cache() {
        let router = MessageRouter::new();
        router.on(product::CHECK_PRODUCT_EXISTS, |_| async { Ok(json!(true)) });
        router.on(product::UPDATE_PRODUCT, |payload: Value| async move {
            let mut product = product_json("p1");
            product["name"] = payload["name"].clone();
            Ok(product)
        });
        let (service, cache) = service(router);
        cache
            .set(&product_cache_key("p1"), &product_json("p1"), Duration::from_secs(60))
            .await
            .unwrap();

        let dto = UpdateProductDto {
            name: Some("Silk shirt".to_string()),
            ..Default::default()
        };
        let response = service.update_product("p1", dto).await.unwrap();
        assert_eq!(response.data.name, "Silk shirt");
        assert!(cache.get::<ProductDto>(&product_cache_key("p1")).await.is_none());
    }

    #[tokio::test]
    async fn test_update_missing_product() {
        let updates = Calls::default();
        let router = MessageRouter::new();
        router.on(product::CHECK_PRODUCT_EXISTS, |_| async { Ok(json!(false)) });
        let seen = updates.clone();
        router.on(product::UPDATE_PRODUCT, move |_| {
            seen.hit();
            async { Ok(product_json("p1")) }
        });
        let (service, _) = service(router);

        let dto = UpdateProductDto {
            name: Some("x".to_string()),
            ..Default::default()
        };
        let err = service.update_product("p404", dto).await.unwrap_err();
        assert_eq!(err.message_key(), "product.errors.notFound");
        assert_eq!(updates.count(), 0);
    }

    #[tokio::test]
    async fn test_create_product_sku_conflict() {
        let creates = Calls::default();
        let router = MessageRouter::new();
        router.on(product::CHECK_SKU_EXISTS, |payload: Value| async move {
            Ok(json!(payload["sku"] == "LS-L"))
        });
        let seen = creates.clone();
        router.on(product::CREATE_PRODUCT, move |_| {
            seen.hit();
            async { Ok(product_json("p2")) }
        });
        let (service, _) = service(router);

        let variant = |sku: &str| CreateVariantDto {
            sku: sku.to_string(),
            name: sku.to_string(),
            price: Decimal::new(250000, 0),
            stock: 1,
        };
        let dto = CreateProductDto {
            name: "Linen shirt".to_string(),
            description: String::new(),
            category_id: "c1".to_string(),
            base_price: Decimal::new(250000, 0),
            variants: vec![variant("LS-M"), variant("LS-L")],
        };

        let err = service.create_product(dto).await.unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::CONFLICT);
        assert_eq!(err.message_key(), "product.errors.skuExists");
        assert_eq!(creates.count(), 0);
    }

    #[tokio::test]
    async fn test_review_requires_user_first() {
        let calls = Calls::default();
        let router = MessageRouter::new();
        let seen = calls.clone();
        router.on(product::CHECK_PRODUCT_EXISTS, move |_| {
            seen.hit();
            async { Ok(json!(true)) }
        });
        let (service, _) = service(router);

        let dto = CreateReviewDto {
            rating: 4,
            comment: None,
        };
        let err = service.create_review(None, "p1", dto).await.unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::UNAUTHORIZED);
        assert_eq!(calls.count(), 0);
    }
    #[tokio::test]
    async fn test_created_product_carries_trimmed_skus() {
        let checked = Arc::new(std::sync::Mutex::new(Vec::new()));
        let created = Arc::new(std::sync::Mutex::new(Value::Null));
        let router = MessageRouter::new();
        let seen = checked.clone();
        router.on(product::CHECK_SKU_EXISTS, move |payload: Value| {
            seen.lock().unwrap().push(payload["sku"].clone());
            async { Ok(json!(false)) }
        });
        let sent = created.clone();
        router.on(product::CREATE_PRODUCT, move |payload: Value| {
            *sent.lock().unwrap() = payload;
            async { Ok(product_json("p2")) }
        });
        let (service, _) = service(router);

        let dto = CreateProductDto {
            name: " Linen shirt ".to_string(),
            description: String::new(),
            category_id: "c1".to_string(),
            base_price: Decimal::new(250000, 0),
            variants: vec![CreateVariantDto {
                sku: "  LS-M ".to_string(),
                name: "M".to_string(),
                price: Decimal::new(250000, 0),
                stock: 3,
            }],
        };
        service.create_product(dto).await.unwrap();

        assert_eq!(*checked.lock().unwrap(), vec![json!("LS-M")]);
        let created = created.lock().unwrap();
        assert_eq!(created["variants"][0]["sku"], "LS-M");
        assert_eq!(created["name"], "Linen shirt");
    }

    #[tokio::test]
    async fn test_review_drops_cached_pages_of_that_product_only() {
        let fetches = Calls::default();
        let router = MessageRouter::new();
        router.on(product::CHECK_PRODUCT_EXISTS, |_| async { Ok(json!(true)) });
        let seen = fetches.clone();
        router.on(product::GET_REVIEWS, move |payload: Value| {
            seen.hit();
            async move {
                Ok(json!({
                    "items": [],
                    "total": 0,
                    "page": payload["page"],
                    "pageSize": payload["pageSize"]
                }))
            }
        });
        router.on(product::CREATE_REVIEW, |payload: Value| async move {
            Ok(json!({
                "id": "r1",
                "productId": payload["productId"],
                "userId": payload["userId"],
                "rating": payload["rating"],
                "createdAt": "2024-05-01T10:00:00Z"
            }))
        });
        let (service, cache) = service(router);
        cache
            .set(&product_cache_key("p10"), &product_json("p10"), Duration::from_secs(60))
            .await
            .unwrap();

        service.list_reviews("p1", PaginationQuery::default()).await.unwrap();
        service.list_reviews("p1", PaginationQuery::default()).await.unwrap();
        assert_eq!(fetches.count(), 1);

        let dto = CreateReviewDto {
            rating: 5,
            comment: Some("Great fit".to_string()),
        };
        service.create_review(Some("u1"), "p1", dto).await.unwrap();

        service.list_reviews("p1", PaginationQuery::default()).await.unwrap();
        assert_eq!(fetches.count(), 2);
        assert!(cache.get::<ProductDto>(&product_cache_key("p10")).await.is_some());
    }
}
