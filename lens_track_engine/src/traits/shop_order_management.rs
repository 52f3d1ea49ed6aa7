use thiserror::Error;

use crate::db_types::{NewOrder, NewShop, Order, Shop};

#[derive(Debug, Clone, Error)]
pub enum ShopOrderApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Shop not found")]
    ShopNotFound,
    #[error("Order not found")]
    OrderNotFound,
    /// Orders inside a bundle are owned by the tracking state machine and cannot be deleted.
    #[error("Order is already part of a group order")]
    OrderBundled,
    #[error("{0}")]
    ValidationError(String),
}

impl From<sqlx::Error> for ShopOrderApiError {
    fn from(e: sqlx::Error) -> Self {
        ShopOrderApiError::DatabaseError(e.to_string())
    }
}

/// Backend contract for shop records and single-order intake, the feeder surface for group-order
/// creation.
#[allow(async_fn_in_trait)]
pub trait ShopOrderManagement: Clone {
    async fn insert_shop(&self, shop: NewShop) -> Result<Shop, ShopOrderApiError>;

    async fn fetch_shop(&self, id: i64) -> Result<Option<Shop>, ShopOrderApiError>;

    async fn insert_order(&self, order: NewOrder) -> Result<Order, ShopOrderApiError>;

    async fn fetch_order(&self, id: i64) -> Result<Option<Order>, ShopOrderApiError>;

    async fn orders_for_shop(&self, shop_id: i64) -> Result<Vec<Order>, ShopOrderApiError>;

    /// Deletes an order that has not been bundled yet.
    async fn delete_order(&self, id: i64) -> Result<(), ShopOrderApiError>;
}
