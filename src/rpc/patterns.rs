//! Message patterns understood by the backing microservices.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Backing microservices reachable over the message bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceName {
    Auth,
    User,
    Product,
    Notification,
}

impl ServiceName {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::User => "user",
            Self::Product => "product",
            Self::Notification => "notification",
        }
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub mod auth {
    pub const REGISTER: &str = "REGISTER";
    pub const LOGIN: &str = "LOGIN";
    pub const OAUTH_LOGIN: &str = "OAUTH_LOGIN";
}

pub mod user {
    pub const GET_USER_BY_ID: &str = "GET_USER_BY_ID";
    pub const UPDATE_USER: &str = "UPDATE_USER";
    pub const GET_USERS: &str = "GET_USERS";
    pub const COUNT_USERS: &str = "COUNT_USERS";
}

pub mod product {
    pub const GET_PRODUCTS: &str = "GET_PRODUCTS";
    pub const GET_PRODUCT_DETAIL: &str = "GET_PRODUCT_DETAIL";
    pub const CHECK_PRODUCT_EXISTS: &str = "CHECK_PRODUCT_EXISTS";
    pub const CHECK_SKU_EXISTS: &str = "CHECK_SKU_EXISTS";
    pub const CREATE_PRODUCT: &str = "CREATE_PRODUCT";
    pub const UPDATE_PRODUCT: &str = "UPDATE_PRODUCT";
    pub const DELETE_PRODUCT: &str = "DELETE_PRODUCT";
    pub const ADD_PRODUCT_IMAGES: &str = "ADD_PRODUCT_IMAGES";
    pub const GET_CATEGORY_TREE: &str = "GET_CATEGORY_TREE";
    pub const CREATE_CATEGORY: &str = "CREATE_CATEGORY";
    pub const CREATE_REVIEW: &str = "CREATE_REVIEW";
    pub const GET_REVIEWS: &str = "GET_REVIEWS";
}

pub mod cart {
    pub const CHECK_PRODUCT_VARIANT_EXISTS: &str = "CHECK_PRODUCT_VARIANT_EXISTS";
    pub const GET_CART: &str = "GET_CART";
    pub const ADD_CART_ITEM: &str = "ADD_CART_ITEM";
    pub const UPDATE_CART_ITEM: &str = "UPDATE_CART_ITEM";
    pub const REMOVE_CART_ITEM: &str = "REMOVE_CART_ITEM";
    pub const CLEAR_CART: &str = "CLEAR_CART";
}

pub mod order {
    pub const CREATE_ORDER: &str = "CREATE_ORDER";
    pub const GET_ORDERS: &str = "GET_ORDERS";
    pub const GET_ORDER_DETAIL: &str = "GET_ORDER_DETAIL";
    pub const UPDATE_ORDER_STATUS: &str = "UPDATE_ORDER_STATUS";
    pub const GET_ORDER_STATISTICS: &str = "GET_ORDER_STATISTICS";
}

pub mod notification {
    pub const USER_REGISTERED: &str = "USER_REGISTERED";
    pub const ORDER_CREATED: &str = "ORDER_CREATED";
    pub const ORDER_STATUS_CHANGED: &str = "ORDER_STATUS_CHANGED";
}
