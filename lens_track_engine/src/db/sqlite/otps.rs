use chrono::Duration;
use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{OtpPurpose, OtpSubject, TrackingOtp},
    otp,
    traits::TrackingApiError,
};

/// Removes any outstanding codes for this subject and purpose. Issuing a new code always starts
/// with this, so at most one code per checkpoint is live at a time.
pub async fn delete_for_subject(
    subject: &OtpSubject,
    purpose: OtpPurpose,
    conn: &mut SqliteConnection,
) -> Result<u64, sqlx::Error> {
    let result = match subject {
        OtpSubject::GroupOrder(id) => {
            sqlx::query("DELETE FROM tracking_otps WHERE group_order_id = $1 AND purpose = $2")
                .bind(*id)
                .bind(purpose)
                .execute(conn)
                .await?
        },
        OtpSubject::Leg(key) => {
            sqlx::query("DELETE FROM tracking_otps WHERE order_key = $1 AND purpose = $2")
                .bind(key.as_str())
                .bind(purpose)
                .execute(conn)
                .await?
        },
    };
    Ok(result.rows_affected())
}

/// Issues a fresh four-digit code for the checkpoint, superseding any earlier one.
pub async fn issue(subject: &OtpSubject, purpose: OtpPurpose, conn: &mut SqliteConnection) -> Result<TrackingOtp, TrackingApiError> {
    delete_for_subject(subject, purpose, &mut *conn).await?;
    let code = otp::generate_code();
    let row: TrackingOtp = match subject {
        OtpSubject::GroupOrder(id) => {
            sqlx::query_as(
                "INSERT INTO tracking_otps (group_order_id, purpose, otp_code) VALUES ($1, $2, $3) RETURNING *",
            )
            .bind(*id)
            .bind(purpose)
            .bind(&code)
            .fetch_one(conn)
            .await?
        },
        OtpSubject::Leg(key) => {
            sqlx::query_as(
                "INSERT INTO tracking_otps (order_key, purpose, otp_code) VALUES ($1, $2, $3) RETURNING *",
            )
            .bind(key.as_str())
            .bind(purpose)
            .bind(&code)
            .fetch_one(conn)
            .await?
        },
    };
    debug!("📝️ Issued {purpose} code for {subject}");
    Ok(row)
}

/// Deletes the row matching (subject, purpose, code) if it has not aged out, returning whether a
/// row was consumed. Expired rows never match, so they cannot validate a checkpoint; the sweeper
/// picks them up later.
pub async fn consume(
    subject: &OtpSubject,
    purpose: OtpPurpose,
    code: &str,
    ttl: Duration,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let window = ttl.num_seconds();
    let result = match subject {
        OtpSubject::GroupOrder(id) => {
            let q = format!(
                "DELETE FROM tracking_otps WHERE group_order_id = $1 AND purpose = $2 AND otp_code = $3 \
                 AND (unixepoch(CURRENT_TIMESTAMP) - unixepoch(created_at)) <= {window}"
            );
            sqlx::query(&q).bind(*id).bind(purpose).bind(code).execute(conn).await?
        },
        OtpSubject::Leg(key) => {
            let q = format!(
                "DELETE FROM tracking_otps WHERE order_key = $1 AND purpose = $2 AND otp_code = $3 \
                 AND (unixepoch(CURRENT_TIMESTAMP) - unixepoch(created_at)) <= {window}"
            );
            sqlx::query(&q).bind(key.as_str()).bind(purpose).bind(code).execute(conn).await?
        },
    };
    let hit = result.rows_affected() > 0;
    debug!("📝️ {purpose} code for {subject} {}", if hit { "consumed" } else { "rejected" });
    Ok(hit)
}

/// The live (unexpired) code for a checkpoint, if one is outstanding.
pub async fn current_for_subject(
    subject: &OtpSubject,
    purpose: OtpPurpose,
    ttl: Duration,
    conn: &mut SqliteConnection,
) -> Result<Option<TrackingOtp>, sqlx::Error> {
    let window = ttl.num_seconds();
    match subject {
        OtpSubject::GroupOrder(id) => {
            let q = format!(
                "SELECT * FROM tracking_otps WHERE group_order_id = $1 AND purpose = $2 \
                 AND (unixepoch(CURRENT_TIMESTAMP) - unixepoch(created_at)) <= {window} ORDER BY id DESC"
            );
            sqlx::query_as(&q).bind(*id).bind(purpose).fetch_optional(conn).await
        },
        OtpSubject::Leg(key) => {
            let q = format!(
                "SELECT * FROM tracking_otps WHERE order_key = $1 AND purpose = $2 \
                 AND (unixepoch(CURRENT_TIMESTAMP) - unixepoch(created_at)) <= {window} ORDER BY id DESC"
            );
            sqlx::query_as(&q).bind(key.as_str()).bind(purpose).fetch_optional(conn).await
        },
    }
}

/// Sweeps codes older than the TTL. Returns the number of rows removed.
pub async fn purge_expired(ttl: Duration, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let window = ttl.num_seconds();
    let q = format!(
        "DELETE FROM tracking_otps WHERE (unixepoch(CURRENT_TIMESTAMP) - unixepoch(created_at)) > {window}"
    );
    let result = sqlx::query(&q).execute(conn).await?;
    Ok(result.rows_affected())
}
