use chrono::Duration;
use ltg_common::Paisa;
use thiserror::Error;

use crate::{
    db_types::{GroupOrder, NewGroupOrder, OrderKey},
    otp::OtpCheck,
    traits::{
        data_objects::{
            AdminReceipt,
            DeliveryCall,
            DeliveryReceipt,
            GroupOrderBundle,
            OutboundDispatch,
            PickupAcceptance,
            PickupVerification,
            RiderAssignment,
            TransitCompletion,
        },
        TrackingQueries,
    },
};

#[derive(Debug, Clone, Error)]
pub enum TrackingApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    InvalidState(String),
    #[error("Some group orders are not in 'Work Completed' status")]
    BatchNotReady { invalid_ids: Vec<i64> },
    #[error("Invalid OTP")]
    InvalidOtp,
    #[error("Invalid Rider")]
    InvalidRider,
    #[error("Invalid Delivery Type")]
    InvalidDeliveryType,
    #[error("Rider is not available or not working")]
    RiderUnavailable,
    #[error("{0}")]
    AlreadyAssigned(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    ValidationError(String),
}

impl From<sqlx::Error> for TrackingApiError {
    fn from(e: sqlx::Error) -> Self {
        TrackingApiError::DatabaseError(e.to_string())
    }
}

/// The mutation contract of the tracking engine. One method per state-machine transition.
///
/// Implementations must make each method atomic: every precondition is re-checked against current
/// store state inside the same transaction that applies the writes, so two racing calls on the
/// same entity cannot both succeed. On any error the store is left untouched.
///
/// OTP policy is decided by the caller: verification methods receive an [`OtpCheck`] (already
/// classified as a real code or an operator bypass) plus the validity window. Freshly issued
/// codes are returned in the result objects so the caller can dispatch them.
#[allow(async_fn_in_trait)]
pub trait TrackingGatewayDatabase: Clone + TrackingQueries {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Bundles unpaid orders into a new group order, opens the shop-pickup leg, applies the
    /// payment split, and credits any carried-forward amount to the shop's balance.
    async fn create_group_order(&self, order: NewGroupOrder) -> Result<GroupOrderBundle, TrackingApiError>;

    /// A rider takes the shop-pickup job: locks the rider, binds them to the leg, advances the
    /// bundle to `Pickup Accepted`, and issues the shop_pickup OTP.
    async fn accept_pickup(&self, group_order_id: i64, rider_id: i64) -> Result<PickupAcceptance, TrackingApiError>;

    /// Shop hand-over checkpoint: consumes the shop_pickup OTP, marks the leg pickup-verified,
    /// advances to `Order Picked Up`, and issues the admin_delivery OTP.
    async fn verify_pickup_otp(
        &self,
        group_order_id: i64,
        check: OtpCheck,
        ttl: Duration,
    ) -> Result<PickupVerification, TrackingApiError>;

    /// Admin receipt checkpoint: the bound rider hands the parcel in against the admin_delivery
    /// OTP. Marks the leg drop-verified, bumps the rider's order counters, advances to
    /// `Order Received By Admin`.
    async fn verify_admin_otp(
        &self,
        group_order_id: i64,
        rider_id: i64,
        check: OtpCheck,
        ttl: Duration,
    ) -> Result<AdminReceipt, TrackingApiError>;

    /// Marks the lens work done: `Order Received By Admin` → `Work Completed`.
    async fn complete_work(&self, group_order_id: i64) -> Result<GroupOrder, TrackingApiError>;

    /// Opens an outbound delivery leg bundling the given work-completed group orders, grouped by
    /// owning shop, and moves them all to `Internal Tracking`.
    async fn call_for_pickup(
        &self,
        group_order_ids: &[i64],
        delivery_amount: Paisa,
        order_key: OrderKey,
    ) -> Result<DeliveryCall, TrackingApiError>;

    /// Binds a rider to an unassigned outbound leg, locks the rider, and issues the admin_pickup
    /// OTP keyed by the leg's routing key. Tracking status is unchanged until the pickup is
    /// verified.
    async fn assign_rider(&self, admin_pickup_key: &OrderKey, rider_id: i64)
        -> Result<RiderAssignment, TrackingApiError>;

    /// Facility hand-over checkpoint for the outbound batch: consumes the admin_pickup OTP,
    /// marks the leg pickup-verified, moves every bundled group order to `Out For Delivery`, and
    /// issues one shop_delivery OTP per group order.
    async fn verify_admin_pickup_otp(
        &self,
        order_key: &OrderKey,
        rider_id: i64,
        check: OtpCheck,
        ttl: Duration,
    ) -> Result<OutboundDispatch, TrackingApiError>;

    /// Shop receipt checkpoint: consumes the shop_delivery OTP for one group order, moves it to
    /// `Order Completed`, bumps the rider's order counters, and drop-verifies the leg once every
    /// bundle it carries has completed.
    async fn verify_delivery_otp(
        &self,
        group_order_id: i64,
        rider_id: i64,
        check: OtpCheck,
        ttl: Duration,
    ) -> Result<DeliveryReceipt, TrackingApiError>;

    /// The bound rider closes out a drop-verified leg: marks it completed, accrues the leg's
    /// payment into the rider's earnings, and releases the rider.
    async fn complete_transit(&self, order_key: &OrderKey, rider_id: i64)
        -> Result<TransitCompletion, TrackingApiError>;

    /// Deletes OTP rows older than `ttl`. Returns the number of rows removed.
    async fn purge_expired_otps(&self, ttl: Duration) -> Result<u64, TrackingApiError>;
}
