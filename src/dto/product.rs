use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use utoipa::{IntoParams, ToSchema};

use super::require_text;
use crate::core::error::{GatewayError, GatewayResult};
use crate::core::pagination::{Pagination, PaginationQuery};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductDto {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub slug: String,
    pub category_id: String,
    #[schema(value_type = String, example = "199000.00")]
    pub base_price: Decimal,
    #[serde(default)]
    pub images: Vec<ProductImageDto>,
    #[serde(default)]
    pub variants: Vec<ProductVariantDto>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductVariantDto {
    pub id: String,
    pub product_id: String,
    pub sku: String,
    pub name: String,
    #[schema(value_type = String, example = "199000.00")]
    pub price: Decimal,
    pub stock: u32,
    /// Filled in by the product service for cart lookups
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductImageDto {
    pub url: String,
    pub public_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDto {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub children: Vec<CategoryDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDto {
    pub id: String,
    pub product_id: String,
    pub user_id: String,
    pub rating: u8,
    #[serde(default)]
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    Newest,
    PriceAsc,
    PriceDesc,
    Name,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ProductQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub search: Option<String>,
    pub category_id: Option<String>,
    #[param(value_type = Option<String>)]
    pub min_price: Option<Decimal>,
    #[param(value_type = Option<String>)]
    pub max_price: Option<Decimal>,
    pub sort: Option<ProductSort>,
}

/// `GET_PRODUCTS` payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFilter {
    #[serde(flatten)]
    pub pagination: Pagination,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<ProductSort>,
    /// Admin listings include soft-deleted products
    pub include_deleted: bool,
}

impl ProductQuery {
    pub fn validate(&self) -> GatewayResult<ProductFilter> {
        let pagination = PaginationQuery {
            page: self.page,
            page_size: self.page_size,
        }
        .validate()?;

        for (field, price) in [("minPrice", self.min_price), ("maxPrice", self.max_price)] {
            if price.is_some_and(|p| p.is_sign_negative()) {
                return Err(GatewayError::validation(field, "product.errors.invalidPrice"));
            }
        }
        if let (Some(min), Some(max)) = (self.min_price, self.max_price) {
            if min > max {
                return Err(GatewayError::validation("minPrice", "product.errors.invalidPriceRange"));
            }
        }

        Ok(ProductFilter {
            pagination,
            search: self
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            category_id: self.category_id.clone(),
            min_price: self.min_price,
            max_price: self.max_price,
            sort: self.sort,
            include_deleted: false,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateVariantDto {
    pub sku: String,
    pub name: String,
    #[schema(value_type = String, example = "199000.00")]
    pub price: Decimal,
    pub stock: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductDto {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category_id: String,
    #[schema(value_type = String, example = "199000.00")]
    pub base_price: Decimal,
    pub variants: Vec<CreateVariantDto>,
}

impl CreateProductDto {
    pub fn validate(&self) -> GatewayResult<()> {
        require_text(&self.name, 200, "name", "product.errors.nameRequired")?;
        require_text(&self.category_id, 64, "categoryId", "product.errors.categoryRequired")?;
        if self.base_price.is_sign_negative() {
            return Err(GatewayError::validation("basePrice", "product.errors.invalidPrice"));
        }
        if self.variants.is_empty() {
            return Err(GatewayError::validation("variants", "product.errors.variantsRequired"));
        }

        let mut skus = HashSet::new();
        for variant in &self.variants {
            require_text(&variant.sku, 64, "variants.sku", "product.errors.skuRequired")?;
            if !skus.insert(variant.sku.trim()) {
                return Err(GatewayError::validation("variants.sku", "product.errors.duplicateSku"));
            }
            if variant.price.is_sign_negative() {
                return Err(GatewayError::validation("variants.price", "product.errors.invalidPrice"));
            }
        }
        Ok(())
    }

    /// Trim the free-text fields the product service stores verbatim
    pub fn normalize(&mut self) {
        self.name = self.name.trim().to_string();
        self.category_id = self.category_id.trim().to_string();
        for variant in &mut self.variants {
            variant.sku = variant.sku.trim().to_string();
            variant.name = variant.name.trim().to_string();
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub base_price: Option<Decimal>,
}

impl UpdateProductDto {
    pub fn validate(&self) -> GatewayResult<()> {
        if self.name.is_none() && self.description.is_none() && self.category_id.is_none() && self.base_price.is_none() {
            return Err(GatewayError::validation("body", "product.errors.nothingToUpdate"));
        }
        if let Some(name) = &self.name {
            require_text(name, 200, "name", "product.errors.nameRequired")?;
        }
        if self.base_price.is_some_and(|p| p.is_sign_negative()) {
            return Err(GatewayError::validation("basePrice", "product.errors.invalidPrice"));
        }
        Ok(())
    }
}

/// `UPDATE_PRODUCT` payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductPayload {
    pub id: String,
    #[serde(flatten)]
    pub changes: UpdateProductDto,
}

/// `ADD_PRODUCT_IMAGES` payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddProductImagesPayload {
    pub product_id: String,
    pub images: Vec<ProductImageDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkuPayload {
    pub sku: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryDto {
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<String>,
}

impl CreateCategoryDto {
    pub fn validate(&self) -> GatewayResult<()> {
        require_text(&self.name, 100, "name", "category.errors.nameRequired")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewDto {
    pub rating: u8,
    #[serde(default)]
    pub comment: Option<String>,
}

impl CreateReviewDto {
    pub fn validate(&self) -> GatewayResult<()> {
        if !(1..=5).contains(&self.rating) {
            return Err(GatewayError::validation("rating", "review.errors.invalidRating"));
        }
        if self.comment.as_ref().is_some_and(|c| c.chars().count() > 2000) {
            return Err(GatewayError::validation("comment", "review.errors.commentTooLong"));
        }
        Ok(())
    }
}

/// `CREATE_REVIEW` payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewPayload {
    pub product_id: String,
    pub user_id: String,
    pub rating: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// `GET_REVIEWS` payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListReviewsPayload {
    pub product_id: String,
    #[serde(flatten)]
    pub pagination: Pagination,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn product_dto() -> CreateProductDto {
        CreateProductDto {
            name: "Linen shirt".to_string(),
            description: String::new(),
            category_id: "c1".to_string(),
            base_price: Decimal::new(250000, 0),
            variants: vec![
                CreateVariantDto {
                    sku: "LS-M".to_string(),
                    name: "M".to_string(),
                    price: Decimal::new(250000, 0),
                    stock: 5,
                },
                CreateVariantDto {
                    sku: "LS-L".to_string(),
                    name: "L".to_string(),
                    price: Decimal::new(260000, 0),
                    stock: 2,
                },
            ],
        }
    }

    #[test]
    fn test_create_product_validation() {
        assert!(product_dto().validate().is_ok());

        let mut dto = product_dto();
        dto.variants[1].sku = "LS-M".to_string();
        assert_eq!(dto.validate().unwrap_err().message_key(), "product.errors.duplicateSku");

        let mut dto = product_dto();
        dto.variants.clear();
        assert_eq!(dto.validate().unwrap_err().field(), Some("variants"));
    }

    #[test]
    fn test_price_range() {
        let query = ProductQuery {
            min_price: Some(Decimal::new(10, 0)),
            max_price: Some(Decimal::new(5, 0)),
            ..Default::default()
        };
        assert_eq!(query.validate().unwrap_err().message_key(), "product.errors.invalidPriceRange");
    }

    #[test]
    fn test_review_rating_bounds() {
        for rating in [0, 6] {
            let dto = CreateReviewDto { rating, comment: None };
            assert_eq!(dto.validate().unwrap_err().field(), Some("rating"));
        }
        assert!(CreateReviewDto { rating: 5, comment: None }.validate().is_ok());
    }

    #[test]
    fn test_money_is_a_string_on_the_wire() {
        let variant = ProductVariantDto {
            id: "v1".to_string(),
            product_id: "p1".to_string(),
            sku: "LS-M".to_string(),
            name: "M".to_string(),
            price: Decimal::new(19900050, 2),
            stock: 3,
            product_name: None,
        };
        let value = serde_json::to_value(&variant).unwrap();
        assert_eq!(value["price"], json!("199000.50"));
        assert!(value.get("productName").is_none());
    }

    #[test]
    fn test_update_payload_flattens_changes() {
        let payload = UpdateProductPayload {
            id: "p1".to_string(),
            changes: UpdateProductDto {
                name: Some("New".to_string()),
                ..Default::default()
            },
        };
        assert_eq!(serde_json::to_value(&payload).unwrap(), json!({ "id": "p1", "name": "New" }));
    }
}
