use serde::{Deserialize, Serialize};

use crate::db_types::{DeliveryLeg, DeliveryType, GroupOrder, Order, OrderKey, Rider, Shop, TrackingStatus};

/// Everything created by a successful group-order creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupOrderBundle {
    pub group_order: GroupOrder,
    pub leg: DeliveryLeg,
    pub orders: Vec<Order>,
    pub shop: Shop,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickupAcceptance {
    pub group_order: GroupOrder,
    pub leg: DeliveryLeg,
    pub rider: Rider,
    pub shop: Shop,
    /// The freshly issued shop_pickup code.
    pub otp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickupVerification {
    pub group_order: GroupOrder,
    pub leg: DeliveryLeg,
    /// The admin_delivery code issued for the next checkpoint.
    pub admin_otp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminReceipt {
    pub group_order: GroupOrder,
    pub leg: DeliveryLeg,
    pub rider: Rider,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryCall {
    pub leg: DeliveryLeg,
    pub group_orders: Vec<GroupOrder>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiderAssignment {
    pub leg: DeliveryLeg,
    pub rider: Rider,
    /// The facility the batch leaves from, taken from the bundled group orders.
    pub admin_id: String,
    /// The freshly issued admin_pickup code.
    pub otp: String,
}

/// One shop_delivery code issued when an outbound batch leaves the facility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopOtp {
    pub group_order_id: i64,
    pub shop_email: String,
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundDispatch {
    pub leg: DeliveryLeg,
    pub group_orders: Vec<GroupOrder>,
    pub shop_otps: Vec<ShopOtp>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    pub group_order: GroupOrder,
    pub leg: DeliveryLeg,
    pub rider: Rider,
    /// True when this verification completed the last bundle on the leg and the leg is now
    /// drop-verified.
    pub leg_cleared: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitCompletion {
    pub leg: DeliveryLeg,
    pub rider: Rider,
}

/// Shop-dashboard row for one in-flight bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveShopOrder {
    pub group_order_id: i64,
    pub tracking_status: TrackingStatus,
    pub otp_code: Option<String>,
    pub rider_name: Option<String>,
    pub rider_phone: Option<String>,
}

/// Admin-dashboard row for one incomplete leg.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveAdminLeg {
    pub leg_id: i64,
    pub order_key: OrderKey,
    pub delivery_type: DeliveryType,
    pub otp_code: Option<String>,
    pub group_order_ids: Vec<i64>,
    pub rider_name: Option<String>,
    pub rider_phone: Option<String>,
}
