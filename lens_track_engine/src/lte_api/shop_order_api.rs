use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{NewOrder, NewShop, Order, Shop},
    traits::{ShopOrderApiError, ShopOrderManagement},
};

/// `ShopOrderApi` is the intake surface: shop records and the single customer orders that feed
/// group-order creation.
pub struct ShopOrderApi<B> {
    db: B,
}

impl<B> Debug for ShopOrderApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ShopOrderApi")
    }
}

impl<B> ShopOrderApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> ShopOrderApi<B>
where B: ShopOrderManagement
{
    pub async fn create_shop(&self, shop: NewShop) -> Result<Shop, ShopOrderApiError> {
        if shop.email.trim().is_empty() {
            return Err(ShopOrderApiError::ValidationError("email must not be empty".into()));
        }
        let shop = self.db.insert_shop(shop).await?;
        info!("🔄️🏪️ Shop {} (#{}) created", shop.shop_name, shop.id);
        Ok(shop)
    }

    pub async fn shop_by_id(&self, id: i64) -> Result<Option<Shop>, ShopOrderApiError> {
        self.db.fetch_shop(id).await
    }

    /// Takes in one customer order. The order stays unpaid and unbundled until a group order
    /// picks it up.
    pub async fn place_order(&self, order: NewOrder) -> Result<Order, ShopOrderApiError> {
        if order.total_amount.value() <= 0 {
            return Err(ShopOrderApiError::ValidationError("total_amount must be positive".into()));
        }
        let order = self.db.insert_order(order).await?;
        debug!("🔄️🧾️ Order #{} placed by shop #{}", order.id, order.shop_id);
        Ok(order)
    }

    pub async fn order_by_id(&self, id: i64) -> Result<Option<Order>, ShopOrderApiError> {
        self.db.fetch_order(id).await
    }

    pub async fn orders_for_shop(&self, shop_id: i64) -> Result<Vec<Order>, ShopOrderApiError> {
        self.db.orders_for_shop(shop_id).await
    }

    /// Removes an order that has not been bundled yet.
    pub async fn delete_order(&self, id: i64) -> Result<(), ShopOrderApiError> {
        self.db.delete_order(id).await?;
        debug!("🔄️🧾️ Order #{id} deleted");
        Ok(())
    }
}
