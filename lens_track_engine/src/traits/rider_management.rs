use thiserror::Error;

use crate::db_types::{DeliveryLeg, NewRider, Rider};

#[derive(Debug, Clone, Error)]
pub enum RiderApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Email already exists")]
    EmailExists,
    /// Login failure: no rider registered under the supplied email.
    #[error("Rider Not Found")]
    UnknownRider,
    #[error("Invalid Password")]
    WrongPassword,
    /// The rider is mid-assignment and cannot change their shift state.
    #[error("Rider is not available")]
    OnAssignment,
    #[error("Rider not found")]
    NotFound,
    #[error("No orders found for this rider")]
    NoHistory,
    #[error("Password hashing failed: {0}")]
    HashError(String),
}

impl From<sqlx::Error> for RiderApiError {
    fn from(e: sqlx::Error) -> Self {
        RiderApiError::DatabaseError(e.to_string())
    }
}

/// Backend contract for the rider account surface. Assignment locking is not here. It belongs
/// to the transition methods on [`TrackingGatewayDatabase`] so it stays atomic with leg binding.
///
/// [`TrackingGatewayDatabase`]: crate::traits::TrackingGatewayDatabase
#[allow(async_fn_in_trait)]
pub trait RiderManagement: Clone {
    /// Stores a new rider. The caller supplies the (already unique) public code and password
    /// hash. A duplicate email yields [`RiderApiError::EmailExists`].
    async fn insert_rider(&self, rider: NewRider) -> Result<Rider, RiderApiError>;

    async fn rider_code_exists(&self, code: &str) -> Result<bool, RiderApiError>;

    async fn fetch_rider(&self, id: i64) -> Result<Option<Rider>, RiderApiError>;

    async fn fetch_rider_by_code(&self, code: &str) -> Result<Option<Rider>, RiderApiError>;

    async fn fetch_rider_by_email(&self, email: &str) -> Result<Option<Rider>, RiderApiError>;

    async fn fetch_all_riders(&self) -> Result<Vec<Rider>, RiderApiError>;

    /// Flips the shift switch. Fails with [`RiderApiError::OnAssignment`] if the rider currently
    /// holds a leg (`is_available == false`).
    async fn set_working_status(&self, rider_code: &str, working: bool) -> Result<Rider, RiderApiError>;

    async fn update_phone(&self, rider_code: &str, phone: &str) -> Result<Rider, RiderApiError>;

    async fn register_push_token(&self, rider_code: &str, token: &str) -> Result<Rider, RiderApiError>;

    /// All legs ever bound to this rider, newest first.
    async fn rider_history(&self, rider_id: i64) -> Result<Vec<DeliveryLeg>, RiderApiError>;
}
