use log::debug;
use sqlx::{types::Json, QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db_types::{NewOrder, Order, PaymentStatus},
    traits::{ShopOrderApiError, TrackingApiError},
};

pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, ShopOrderApiError> {
    let inserted: Order = sqlx::query_as(
        r#"INSERT INTO orders (shop_id, customer_name, customer_phone, job_spec, total_amount)
           VALUES ($1, $2, $3, $4, $5) RETURNING *"#,
    )
    .bind(order.shop_id)
    .bind(order.customer_name)
    .bind(order.customer_phone)
    .bind(Json(order.job_spec))
    .bind(order.total_amount.value())
    .fetch_one(conn)
    .await?;
    debug!("📝️ Order #{} inserted for shop #{}", inserted.id, inserted.shop_id);
    Ok(inserted)
}

pub async fn fetch_order(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id).fetch_optional(conn).await
}

pub async fn fetch_orders_for_shop(shop_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE shop_id = $1 ORDER BY id").bind(shop_id).fetch_all(conn).await
}

pub async fn fetch_orders_for_group(group_order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE group_order_id = $1 ORDER BY id")
        .bind(group_order_id)
        .fetch_all(conn)
        .await
}

/// Fetches the subset of `ids` that exists and has not been attached to a group order yet.
pub async fn fetch_unbundled_orders(ids: &[i64], conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut builder = QueryBuilder::<Sqlite>::new("SELECT * FROM orders WHERE group_order_id IS NULL AND id IN (");
    let mut values = builder.separated(", ");
    for id in ids {
        values.push_bind(*id);
    }
    builder.push(") ORDER BY id");
    builder.build_query_as::<Order>().fetch_all(conn).await
}

/// Attaches the orders to a group order and stamps them with the bundle's payment status.
pub async fn bind_orders_to_group(
    ids: &[i64],
    group_order_id: i64,
    payment_status: PaymentStatus,
    conn: &mut SqliteConnection,
) -> Result<u64, TrackingApiError> {
    if ids.is_empty() {
        return Ok(0);
    }
    let mut builder = QueryBuilder::<Sqlite>::new("UPDATE orders SET group_order_id = ");
    builder.push_bind(group_order_id);
    builder.push(", payment_status = ").push_bind(payment_status);
    builder.push(", updated_at = CURRENT_TIMESTAMP WHERE id IN (");
    let mut values = builder.separated(", ");
    for id in ids {
        values.push_bind(*id);
    }
    builder.push(")");
    let result = builder.build().execute(conn).await?;
    debug!("📝️ Attached {} orders to group order #{group_order_id}", result.rows_affected());
    Ok(result.rows_affected())
}

/// Deletes an order, refusing if it is already part of a group order.
pub async fn delete_order(id: i64, conn: &mut SqliteConnection) -> Result<Order, ShopOrderApiError> {
    let order = fetch_order(id, &mut *conn).await?.ok_or(ShopOrderApiError::OrderNotFound)?;
    if order.group_order_id.is_some() {
        return Err(ShopOrderApiError::OrderBundled);
    }
    sqlx::query("DELETE FROM orders WHERE id = $1").bind(id).execute(conn).await?;
    debug!("📝️ Order #{id} deleted");
    Ok(order)
}
