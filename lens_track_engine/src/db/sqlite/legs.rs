use log::debug;
use ltg_common::Paisa;
use sqlx::{types::Json, QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db_types::{DeliveryLeg, DeliveryType, LegManifest, OrderKey},
    traits::TrackingApiError,
};

/// Column values for a new delivery leg. Riders attach later, via [`bind_rider`].
#[derive(Debug, Clone)]
pub struct NewDeliveryLeg {
    pub delivery_type: DeliveryType,
    pub order_key: OrderKey,
    pub payment_amount: Paisa,
    pub manifest: LegManifest,
}

pub async fn insert_leg(leg: NewDeliveryLeg, conn: &mut SqliteConnection) -> Result<DeliveryLeg, TrackingApiError> {
    let inserted: DeliveryLeg = sqlx::query_as(
        r#"INSERT INTO delivery_legs (delivery_type, order_key, payment_amount, manifest)
           VALUES ($1, $2, $3, $4) RETURNING *"#,
    )
    .bind(leg.delivery_type)
    .bind(leg.order_key)
    .bind(leg.payment_amount.value())
    .bind(Json(leg.manifest))
    .fetch_one(conn)
    .await?;
    debug!("📝️ {} leg {} opened (#{})", inserted.delivery_type, inserted.order_key, inserted.id);
    Ok(inserted)
}

/// Records which group orders travel on this leg.
pub async fn link_group_orders(leg_id: i64, ids: &[i64], conn: &mut SqliteConnection) -> Result<(), TrackingApiError> {
    if ids.is_empty() {
        return Ok(());
    }
    let mut builder = QueryBuilder::<Sqlite>::new("INSERT INTO leg_orders (leg_id, group_order_id) ");
    builder.push_values(ids, |mut row, id| {
        row.push_bind(leg_id).push_bind(*id);
    });
    builder.build().execute(conn).await?;
    Ok(())
}

pub async fn fetch_leg(id: i64, conn: &mut SqliteConnection) -> Result<Option<DeliveryLeg>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM delivery_legs WHERE id = $1").bind(id).fetch_optional(conn).await
}

pub async fn fetch_leg_by_key(key: &OrderKey, conn: &mut SqliteConnection) -> Result<Option<DeliveryLeg>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM delivery_legs WHERE order_key = $1").bind(key.as_str()).fetch_optional(conn).await
}

pub async fn fetch_leg_by_key_and_type(
    key: &OrderKey,
    delivery_type: DeliveryType,
    conn: &mut SqliteConnection,
) -> Result<Option<DeliveryLeg>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM delivery_legs WHERE order_key = $1 AND delivery_type = $2")
        .bind(key.as_str())
        .bind(delivery_type)
        .fetch_optional(conn)
        .await
}

pub async fn group_order_ids_for_leg(leg_id: i64, conn: &mut SqliteConnection) -> Result<Vec<i64>, sqlx::Error> {
    sqlx::query_scalar("SELECT group_order_id FROM leg_orders WHERE leg_id = $1 ORDER BY group_order_id")
        .bind(leg_id)
        .fetch_all(conn)
        .await
}

/// Attaches a rider to an unclaimed leg. Returns `None` when a rider beat us to it.
pub async fn bind_rider(leg_id: i64, rider_id: i64, conn: &mut SqliteConnection) -> Result<Option<DeliveryLeg>, sqlx::Error> {
    let leg = sqlx::query_as(
        r#"UPDATE delivery_legs SET rider_id = $1, updated_at = CURRENT_TIMESTAMP
           WHERE id = $2 AND rider_id IS NULL RETURNING *"#,
    )
    .bind(rider_id)
    .bind(leg_id)
    .fetch_optional(conn)
    .await?;
    if leg.is_some() {
        debug!("📝️ Rider #{rider_id} attached to leg #{leg_id}");
    }
    Ok(leg)
}

pub async fn set_pickup_verified(leg_id: i64, conn: &mut SqliteConnection) -> Result<DeliveryLeg, TrackingApiError> {
    sqlx::query_as(
        "UPDATE delivery_legs SET is_pickup_verified = 1, updated_at = CURRENT_TIMESTAMP WHERE id = $1 RETURNING *",
    )
    .bind(leg_id)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| TrackingApiError::NotFound("Order not found".into()))
}

pub async fn set_drop_verified(leg_id: i64, conn: &mut SqliteConnection) -> Result<DeliveryLeg, TrackingApiError> {
    sqlx::query_as(
        "UPDATE delivery_legs SET is_drop_verified = 1, updated_at = CURRENT_TIMESTAMP WHERE id = $1 RETURNING *",
    )
    .bind(leg_id)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| TrackingApiError::NotFound("Order not found".into()))
}

/// Closes the leg. Returns `None` when it was already closed.
pub async fn complete_leg(leg_id: i64, conn: &mut SqliteConnection) -> Result<Option<DeliveryLeg>, sqlx::Error> {
    sqlx::query_as(
        r#"UPDATE delivery_legs SET is_completed = 1, updated_at = CURRENT_TIMESTAMP
           WHERE id = $1 AND is_completed = 0 RETURNING *"#,
    )
    .bind(leg_id)
    .fetch_optional(conn)
    .await
}

/// Every leg the rider has ever carried, newest first.
pub async fn legs_for_rider(rider_id: i64, conn: &mut SqliteConnection) -> Result<Vec<DeliveryLeg>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM delivery_legs WHERE rider_id = $1 ORDER BY id DESC")
        .bind(rider_id)
        .fetch_all(conn)
        .await
}

/// Open legs for an admin's queue: pickup legs en route to the facility, and outbound legs whose
/// riders still have to collect from the facility.
pub async fn open_legs_for_admin(admin_id: &str, conn: &mut SqliteConnection) -> Result<Vec<DeliveryLeg>, sqlx::Error> {
    sqlx::query_as(
        r#"SELECT DISTINCT l.* FROM delivery_legs l
           JOIN leg_orders lo ON lo.leg_id = l.id
           JOIN group_orders g ON g.id = lo.group_order_id
           WHERE g.admin_id = $1 AND l.is_completed = 0 AND (
               (l.delivery_type = 'pickup' AND g.tracking_status = 'Order Picked Up')
               OR
               (l.delivery_type = 'delivery' AND l.rider_id IS NOT NULL AND l.is_pickup_verified = 0)
           )
           ORDER BY l.id"#,
    )
    .bind(admin_id)
    .fetch_all(conn)
    .await
}
