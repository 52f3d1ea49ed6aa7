use log::debug;
use ltg_common::Paisa;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewRider, Rider},
    traits::{RiderApiError, TrackingApiError},
};

pub async fn insert_rider(rider: NewRider, conn: &mut SqliteConnection) -> Result<Rider, RiderApiError> {
    let inserted: Rider = sqlx::query_as(
        r#"INSERT INTO riders (rider_code, name, phone, email, vehicle_number, password_hash)
           VALUES ($1, $2, $3, $4, $5, $6) RETURNING *"#,
    )
    .bind(rider.rider_code)
    .bind(rider.name)
    .bind(rider.phone)
    .bind(rider.email)
    .bind(rider.vehicle_number)
    .bind(rider.password_hash)
    .fetch_one(conn)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(de) if de.is_unique_violation() => RiderApiError::EmailExists,
        _ => RiderApiError::from(e),
    })?;
    debug!("📝️ Rider {} (#{}) registered", inserted.rider_code, inserted.id);
    Ok(inserted)
}

pub async fn fetch_rider(id: i64, conn: &mut SqliteConnection) -> Result<Option<Rider>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM riders WHERE id = $1").bind(id).fetch_optional(conn).await
}

pub async fn fetch_rider_by_code(code: &str, conn: &mut SqliteConnection) -> Result<Option<Rider>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM riders WHERE rider_code = $1").bind(code).fetch_optional(conn).await
}

pub async fn fetch_rider_by_email(email: &str, conn: &mut SqliteConnection) -> Result<Option<Rider>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM riders WHERE email = $1").bind(email).fetch_optional(conn).await
}

pub async fn fetch_all_riders(conn: &mut SqliteConnection) -> Result<Vec<Rider>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM riders ORDER BY id").fetch_all(conn).await
}

pub async fn code_exists(code: &str, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM riders WHERE rider_code = $1")
        .bind(code)
        .fetch_one(conn)
        .await?;
    Ok(count > 0)
}

/// Claims the rider for an assignment. The update only lands when the rider is on shift and not
/// already claimed, so concurrent assignments resolve to a single winner.
pub async fn try_lock(id: i64, conn: &mut SqliteConnection) -> Result<Option<Rider>, sqlx::Error> {
    let rider = sqlx::query_as(
        r#"UPDATE riders SET is_available = 0, updated_at = CURRENT_TIMESTAMP
           WHERE id = $1 AND is_working = 1 AND is_available = 1 RETURNING *"#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;
    if rider.is_some() {
        debug!("📝️ Rider #{id} locked for assignment");
    }
    Ok(rider)
}

/// Releases the assignment lock once the rider's leg is fully settled.
pub async fn unlock(id: i64, conn: &mut SqliteConnection) -> Result<Rider, TrackingApiError> {
    let rider = sqlx::query_as(
        "UPDATE riders SET is_available = 1, updated_at = CURRENT_TIMESTAMP WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| TrackingApiError::NotFound("Rider not found".into()))?;
    debug!("📝️ Rider #{id} released");
    Ok(rider)
}

/// Bumps the rider's lifetime and daily delivery counters.
pub async fn record_delivery(id: i64, conn: &mut SqliteConnection) -> Result<Rider, TrackingApiError> {
    sqlx::query_as(
        r#"UPDATE riders SET
           total_orders = total_orders + 1,
           daily_orders = daily_orders + 1,
           updated_at = CURRENT_TIMESTAMP
           WHERE id = $1 RETURNING *"#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| TrackingApiError::NotFound("Rider not found".into()))
}

/// Credits the leg payment to the rider's lifetime and daily earnings.
pub async fn accrue_earnings(id: i64, amount: Paisa, conn: &mut SqliteConnection) -> Result<Rider, TrackingApiError> {
    let rider = sqlx::query_as(
        r#"UPDATE riders SET
           total_earnings = total_earnings + $1,
           daily_earnings = daily_earnings + $1,
           updated_at = CURRENT_TIMESTAMP
           WHERE id = $2 RETURNING *"#,
    )
    .bind(amount.value())
    .bind(id)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| TrackingApiError::NotFound("Rider not found".into()))?;
    debug!("📝️ Credited {amount} to rider #{id}");
    Ok(rider)
}

/// Flips the shift switch. Refused while the rider is locked to an active assignment.
pub async fn set_working_status(code: &str, is_working: bool, conn: &mut SqliteConnection) -> Result<Rider, RiderApiError> {
    let updated: Option<Rider> = sqlx::query_as(
        r#"UPDATE riders SET is_working = $1, updated_at = CURRENT_TIMESTAMP
           WHERE rider_code = $2 AND is_available = 1 RETURNING *"#,
    )
    .bind(is_working)
    .bind(code)
    .fetch_optional(&mut *conn)
    .await?;
    match updated {
        Some(rider) => Ok(rider),
        None => match fetch_rider_by_code(code, conn).await? {
            Some(_) => Err(RiderApiError::OnAssignment),
            None => Err(RiderApiError::NotFound),
        },
    }
}

pub async fn update_phone(code: &str, phone: &str, conn: &mut SqliteConnection) -> Result<Rider, RiderApiError> {
    sqlx::query_as(
        "UPDATE riders SET phone = $1, updated_at = CURRENT_TIMESTAMP WHERE rider_code = $2 RETURNING *",
    )
    .bind(phone)
    .bind(code)
    .fetch_optional(conn)
    .await?
    .ok_or(RiderApiError::NotFound)
}

pub async fn set_push_token(code: &str, token: &str, conn: &mut SqliteConnection) -> Result<Rider, RiderApiError> {
    sqlx::query_as(
        "UPDATE riders SET push_token = $1, updated_at = CURRENT_TIMESTAMP WHERE rider_code = $2 RETURNING *",
    )
    .bind(token)
    .bind(code)
    .fetch_optional(conn)
    .await?
    .ok_or(RiderApiError::NotFound)
}
