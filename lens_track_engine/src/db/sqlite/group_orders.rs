use log::debug;
use ltg_common::Paisa;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db_types::{GroupOrder, OrderKey, PaymentStatus, TrackingStatus},
    traits::TrackingApiError,
};

/// Column values for a new group order row. Totals and the payment split are computed by the
/// caller before insertion.
#[derive(Debug, Clone)]
pub struct NewGroupOrderRow<'a> {
    pub shop_id: i64,
    pub admin_id: &'a str,
    pub total_amount: Paisa,
    pub delivery_charge: Paisa,
    pub final_amount: Paisa,
    pub paid_amount: Paisa,
    pub left_amount: Paisa,
    pub payment_status: PaymentStatus,
}

pub async fn insert_group_order(row: NewGroupOrderRow<'_>, conn: &mut SqliteConnection) -> Result<GroupOrder, TrackingApiError> {
    let inserted: GroupOrder = sqlx::query_as(
        r#"INSERT INTO group_orders
           (shop_id, admin_id, total_amount, delivery_charge, final_amount, paid_amount, left_amount, payment_status)
           VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *"#,
    )
    .bind(row.shop_id)
    .bind(row.admin_id)
    .bind(row.total_amount.value())
    .bind(row.delivery_charge.value())
    .bind(row.final_amount.value())
    .bind(row.paid_amount.value())
    .bind(row.left_amount.value())
    .bind(row.payment_status)
    .fetch_one(conn)
    .await?;
    debug!("📝️ Group order #{} inserted for shop #{}", inserted.id, inserted.shop_id);
    Ok(inserted)
}

pub async fn fetch_group_order(id: i64, conn: &mut SqliteConnection) -> Result<Option<GroupOrder>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM group_orders WHERE id = $1").bind(id).fetch_optional(conn).await
}

pub async fn fetch_group_orders_by_ids(ids: &[i64], conn: &mut SqliteConnection) -> Result<Vec<GroupOrder>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut builder = QueryBuilder::<Sqlite>::new("SELECT * FROM group_orders WHERE id IN (");
    let mut values = builder.separated(", ");
    for id in ids {
        values.push_bind(*id);
    }
    builder.push(") ORDER BY id");
    builder.build_query_as::<GroupOrder>().fetch_all(conn).await
}

/// Moves a group order from `from` to `to` in a single conditional update. Returns `None` when
/// the row is missing or is not in the `from` status, leaving the row untouched either way.
pub async fn advance_status(
    id: i64,
    from: TrackingStatus,
    to: TrackingStatus,
    conn: &mut SqliteConnection,
) -> Result<Option<GroupOrder>, sqlx::Error> {
    let updated = sqlx::query_as(
        r#"UPDATE group_orders SET tracking_status = $1, updated_at = CURRENT_TIMESTAMP
           WHERE id = $2 AND tracking_status = $3 RETURNING *"#,
    )
    .bind(to)
    .bind(id)
    .bind(from)
    .fetch_optional(conn)
    .await?;
    if updated.is_some() {
        debug!("📝️ Group order #{id} moved from [{from}] to [{to}]");
    }
    Ok(updated)
}

/// Batch variant of [`advance_status`]. Only rows in the `from` status move; the returned set
/// tells the caller which ones did.
pub async fn advance_status_batch(
    ids: &[i64],
    from: TrackingStatus,
    to: TrackingStatus,
    conn: &mut SqliteConnection,
) -> Result<Vec<GroupOrder>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut builder = QueryBuilder::<Sqlite>::new("UPDATE group_orders SET tracking_status = ");
    builder.push_bind(to);
    builder.push(", updated_at = CURRENT_TIMESTAMP WHERE tracking_status = ").push_bind(from);
    builder.push(" AND id IN (");
    let mut values = builder.separated(", ");
    for id in ids {
        values.push_bind(*id);
    }
    builder.push(") RETURNING *");
    let mut moved = builder.build_query_as::<GroupOrder>().fetch_all(conn).await?;
    moved.sort_by_key(|g| g.id);
    debug!("📝️ {} of {} group orders moved from [{from}] to [{to}]", moved.len(), ids.len());
    Ok(moved)
}

/// Records the inbound leg on the group order at creation time.
pub async fn set_shop_pickup_slot(
    id: i64,
    leg_id: i64,
    key: &OrderKey,
    conn: &mut SqliteConnection,
) -> Result<GroupOrder, TrackingApiError> {
    sqlx::query_as(
        r#"UPDATE group_orders SET shop_pickup_leg = $1, shop_pickup_key = $2, updated_at = CURRENT_TIMESTAMP
           WHERE id = $3 RETURNING *"#,
    )
    .bind(leg_id)
    .bind(key)
    .bind(id)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| TrackingApiError::NotFound("Group order not found".into()))
}

/// Records the outbound leg on every group order in the batch.
pub async fn set_admin_pickup_slot(
    ids: &[i64],
    leg_id: i64,
    key: &OrderKey,
    conn: &mut SqliteConnection,
) -> Result<u64, TrackingApiError> {
    if ids.is_empty() {
        return Ok(0);
    }
    let mut builder = QueryBuilder::<Sqlite>::new("UPDATE group_orders SET admin_pickup_leg = ");
    builder.push_bind(leg_id);
    builder.push(", admin_pickup_key = ").push_bind(key.as_str());
    builder.push(", updated_at = CURRENT_TIMESTAMP WHERE id IN (");
    let mut values = builder.separated(", ");
    for id in ids {
        values.push_bind(*id);
    }
    builder.push(")");
    let result = builder.build().execute(conn).await?;
    Ok(result.rows_affected())
}

/// All of a shop's group orders sitting in one of the given statuses, oldest first.
pub async fn fetch_by_statuses_for_shop(
    shop_id: i64,
    statuses: &[TrackingStatus],
    conn: &mut SqliteConnection,
) -> Result<Vec<GroupOrder>, sqlx::Error> {
    if statuses.is_empty() {
        return Ok(Vec::new());
    }
    let status_list = statuses.iter().map(|s| format!("'{s}'")).collect::<Vec<String>>().join(",");
    let q = format!("SELECT * FROM group_orders WHERE shop_id = $1 AND tracking_status IN ({status_list}) ORDER BY id");
    sqlx::query_as(&q).bind(shop_id).fetch_all(conn).await
}
