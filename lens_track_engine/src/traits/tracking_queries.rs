use chrono::Duration;

use crate::{
    db_types::{DeliveryLeg, GroupOrder, OrderKey},
    traits::{
        data_objects::{ActiveAdminLeg, ActiveShopOrder},
        TrackingApiError,
    },
};

/// Read-only companion to [`TrackingGatewayDatabase`]: lookups and the active-work views. None
/// of these consume OTPs; the codes they return are the currently stored, unexpired ones.
///
/// [`TrackingGatewayDatabase`]: crate::traits::TrackingGatewayDatabase
#[allow(async_fn_in_trait)]
pub trait TrackingQueries {
    async fn fetch_group_order(&self, id: i64) -> Result<Option<GroupOrder>, TrackingApiError>;

    async fn fetch_leg(&self, id: i64) -> Result<Option<DeliveryLeg>, TrackingApiError>;

    async fn fetch_leg_by_key(&self, key: &OrderKey) -> Result<Option<DeliveryLeg>, TrackingApiError>;

    async fn group_orders_for_leg(&self, leg_id: i64) -> Result<Vec<GroupOrder>, TrackingApiError>;

    /// In-flight bundles for a shop counter: `Pickup Accepted` bundles show the shop_pickup OTP,
    /// `Out For Delivery` bundles show the shop_delivery OTP, both with the rider's contact.
    /// Codes older than `otp_ttl` are treated as absent.
    async fn active_shop_orders(&self, shop_id: i64, otp_ttl: Duration) -> Result<Vec<ActiveShopOrder>, TrackingApiError>;

    /// Incomplete legs touching an admin facility: inbound parcels awaiting receipt
    /// (admin_delivery OTP) and outbound batches awaiting rider pickup (admin_pickup OTP).
    /// Codes older than `otp_ttl` are treated as absent.
    async fn active_admin_legs(&self, admin_id: &str, otp_ttl: Duration) -> Result<Vec<ActiveAdminLeg>, TrackingApiError>;
}
