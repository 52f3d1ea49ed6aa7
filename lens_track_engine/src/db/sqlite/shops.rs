use log::debug;
use ltg_common::Paisa;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewShop, Shop},
    traits::{ShopOrderApiError, TrackingApiError},
};

pub async fn insert_shop(shop: NewShop, conn: &mut SqliteConnection) -> Result<Shop, ShopOrderApiError> {
    let inserted = sqlx::query_as(
        r#"INSERT INTO shops (shop_name, dealer_name, email, phone, alternate_phone, address, delivery_charge)
           VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *"#,
    )
    .bind(shop.shop_name)
    .bind(shop.dealer_name)
    .bind(shop.email)
    .bind(shop.phone)
    .bind(shop.alternate_phone)
    .bind(shop.address)
    .bind(shop.delivery_charge.value())
    .fetch_one(conn)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(de) if de.is_unique_violation() => {
            ShopOrderApiError::ValidationError("A shop with this email already exists".into())
        },
        _ => ShopOrderApiError::from(e),
    })?;
    debug!("📝️ Shop {} (#{}) inserted", inserted.shop_name, inserted.id);
    Ok(inserted)
}

pub async fn fetch_shop(id: i64, conn: &mut SqliteConnection) -> Result<Option<Shop>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM shops WHERE id = $1").bind(id).fetch_optional(conn).await
}

/// Adds `amount` to the shop's running credit balance and returns the updated row.
pub async fn credit_shop_balance(id: i64, amount: Paisa, conn: &mut SqliteConnection) -> Result<Shop, TrackingApiError> {
    let shop = sqlx::query_as(
        r#"UPDATE shops SET
           credit_balance = credit_balance + $1,
           updated_at = CURRENT_TIMESTAMP
           WHERE id = $2 RETURNING *"#,
    )
    .bind(amount.value())
    .bind(id)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| TrackingApiError::NotFound("Shop not found".into()))?;
    debug!("📝️ Credited {amount} to shop #{id}");
    Ok(shop)
}
