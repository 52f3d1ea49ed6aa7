//! Database types for the tracking engine.
//!
//! Every entity the ledger store persists is defined here, together with the enumerations that
//! drive the group-order state machine. Display implementations produce the exact strings stored
//! in the database and shown to clients, so the two never drift apart.

use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::*;
use ltg_common::Paisa;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

//--------------------------------------   TrackingStatus   ----------------------------------------------------------

/// The state a [`GroupOrder`] is in on its journey from the shop counter, through the admin
/// facility, and back to the shop. Statuses only ever advance; there is no way back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum TrackingStatus {
    /// The bundle exists and is waiting for a rider to accept the shop pickup.
    #[sqlx(rename = "Order Placed For Pickup")]
    #[serde(rename = "Order Placed For Pickup")]
    PlacedForPickup,
    /// A rider has taken the pickup job. The shop holds an OTP to hand the parcel over.
    #[sqlx(rename = "Pickup Accepted")]
    #[serde(rename = "Pickup Accepted")]
    PickupAccepted,
    /// The rider collected the parcel from the shop and is headed to the admin facility.
    #[sqlx(rename = "Order Picked Up")]
    #[serde(rename = "Order Picked Up")]
    PickedUp,
    /// The admin facility has received and signed for the parcel.
    #[sqlx(rename = "Order Received By Admin")]
    #[serde(rename = "Order Received By Admin")]
    ReceivedByAdmin,
    /// Lens work is done. The bundle is waiting to be called into a delivery batch.
    #[sqlx(rename = "Work Completed")]
    #[serde(rename = "Work Completed")]
    WorkCompleted,
    /// The bundle is part of an outbound delivery leg that has been opened but not yet picked up.
    #[sqlx(rename = "Internal Tracking")]
    #[serde(rename = "Internal Tracking")]
    InternalTracking,
    /// A rider verified the admin pickup and is delivering back to the shops.
    #[sqlx(rename = "Out For Delivery")]
    #[serde(rename = "Out For Delivery")]
    OutForDelivery,
    /// Terminal. The shop verified delivery of this bundle.
    #[sqlx(rename = "Order Completed")]
    #[serde(rename = "Order Completed")]
    Completed,
}

impl Display for TrackingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackingStatus::PlacedForPickup => write!(f, "Order Placed For Pickup"),
            TrackingStatus::PickupAccepted => write!(f, "Pickup Accepted"),
            TrackingStatus::PickedUp => write!(f, "Order Picked Up"),
            TrackingStatus::ReceivedByAdmin => write!(f, "Order Received By Admin"),
            TrackingStatus::WorkCompleted => write!(f, "Work Completed"),
            TrackingStatus::InternalTracking => write!(f, "Internal Tracking"),
            TrackingStatus::OutForDelivery => write!(f, "Out For Delivery"),
            TrackingStatus::Completed => write!(f, "Order Completed"),
        }
    }
}

impl From<String> for TrackingStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid tracking status: {value}. But this conversion cannot fail. Defaulting to PlacedForPickup");
            TrackingStatus::PlacedForPickup
        })
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid conversion: {0}")]
pub struct ConversionError(pub String);

impl FromStr for TrackingStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Order Placed For Pickup" => Ok(Self::PlacedForPickup),
            "Pickup Accepted" => Ok(Self::PickupAccepted),
            "Order Picked Up" => Ok(Self::PickedUp),
            "Order Received By Admin" => Ok(Self::ReceivedByAdmin),
            "Work Completed" => Ok(Self::WorkCompleted),
            "Internal Tracking" => Ok(Self::InternalTracking),
            "Out For Delivery" => Ok(Self::OutForDelivery),
            "Order Completed" => Ok(Self::Completed),
            s => Err(ConversionError(format!("Invalid tracking status: {s}"))),
        }
    }
}

//--------------------------------------   PaymentStatus   -----------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Unpaid,
    Pending,
    Completed,
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Unpaid => write!(f, "unpaid"),
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Completed => write!(f, "completed"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unpaid" => Ok(Self::Unpaid),
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            s => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

//--------------------------------------   PaymentOption   -----------------------------------------------------------

/// How the shop chose to pay for a bundle at creation time. `Full` settles everything up front;
/// `OnDelivery` pays the delivery charge now and carries the order total forward on credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentOption {
    #[serde(rename = "full")]
    Full,
    #[serde(rename = "delivery")]
    OnDelivery,
}

impl Display for PaymentOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentOption::Full => write!(f, "full"),
            PaymentOption::OnDelivery => write!(f, "delivery"),
        }
    }
}

impl FromStr for PaymentOption {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full" => Ok(Self::Full),
            "delivery" => Ok(Self::OnDelivery),
            s => Err(ConversionError(format!("Invalid payment option: {s}"))),
        }
    }
}

//--------------------------------------   DeliveryType   ------------------------------------------------------------

/// The direction of a [`DeliveryLeg`]: `Pickup` runs shop → admin facility, `Delivery` runs
/// admin facility → shop(s).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DeliveryType {
    Pickup,
    Delivery,
}

impl Display for DeliveryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryType::Pickup => write!(f, "pickup"),
            DeliveryType::Delivery => write!(f, "delivery"),
        }
    }
}

//--------------------------------------   OtpPurpose   --------------------------------------------------------------

/// Which checkpoint an OTP belongs to. A code is only ever valid for the exact purpose it was
/// issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OtpPurpose {
    /// Shop hands the parcel to the rider.
    ShopPickup,
    /// Rider hands the parcel to the admin facility.
    AdminDelivery,
    /// Rider collects the outbound batch from the admin facility.
    AdminPickup,
    /// Shop receives its finished orders back.
    ShopDelivery,
}

impl Display for OtpPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OtpPurpose::ShopPickup => write!(f, "shop_pickup"),
            OtpPurpose::AdminDelivery => write!(f, "admin_delivery"),
            OtpPurpose::AdminPickup => write!(f, "admin_pickup"),
            OtpPurpose::ShopDelivery => write!(f, "shop_delivery"),
        }
    }
}

//--------------------------------------     OrderKey     ------------------------------------------------------------

/// Opaque routing key for a delivery leg. Riders and admins quote this key, not database ids.
#[derive(Debug, Clone, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct OrderKey(pub String);

impl FromStr for OrderKey {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for OrderKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl OrderKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------    OtpSubject    ------------------------------------------------------------

/// What an OTP is bound to. Shop-side checkpoints key on the group order; admin-side batch
/// checkpoints key on the leg's routing key, since one leg can carry many group orders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OtpSubject {
    GroupOrder(i64),
    Leg(OrderKey),
}

impl OtpSubject {
    pub fn group_order_id(&self) -> Option<i64> {
        match self {
            OtpSubject::GroupOrder(id) => Some(*id),
            OtpSubject::Leg(_) => None,
        }
    }

    pub fn order_key(&self) -> Option<&str> {
        match self {
            OtpSubject::GroupOrder(_) => None,
            OtpSubject::Leg(key) => Some(key.as_str()),
        }
    }
}

impl Display for OtpSubject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OtpSubject::GroupOrder(id) => write!(f, "group order #{id}"),
            OtpSubject::Leg(key) => write!(f, "leg {key}"),
        }
    }
}

//--------------------------------------     JobSpec      ------------------------------------------------------------

/// The work a shop is asking the admin facility to do on one customer order. Stored as a JSON
/// column; unknown shapes are rejected at intake rather than carried around as loose maps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "job", rename_all = "snake_case")]
pub enum JobSpec {
    /// Move existing lenses into a new frame.
    Shifting { frame_type: String, shifting_charge: Paisa },
    /// Cut and fit new lenses.
    Fitting {
        frame_type: String,
        purchase_lens: bool,
        glass_type: String,
        lens_details: String,
        #[serde(default)]
        material_details: Option<String>,
        #[serde(default)]
        coating_details: Option<String>,
        power: PowerProfile,
        fitting_charge: Paisa,
    },
}

impl JobSpec {
    pub fn job_charge(&self) -> Paisa {
        match self {
            JobSpec::Shifting { shifting_charge, .. } => *shifting_charge,
            JobSpec::Fitting { fitting_charge, .. } => *fitting_charge,
        }
    }
}

/// Prescription details for a fitting job. Values are kept as entered by the optician.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PowerProfile {
    pub power_type: String,
    pub entry_type: String,
    #[serde(default)]
    pub right: Option<EyePower>,
    #[serde(default)]
    pub left: Option<EyePower>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EyePower {
    #[serde(default)]
    pub sph: Option<String>,
    #[serde(default)]
    pub cyl: Option<String>,
    #[serde(default)]
    pub axis: Option<String>,
    #[serde(default)]
    pub add: Option<String>,
}

//--------------------------------------    LegManifest   ------------------------------------------------------------

/// Denormalized display information carried on a delivery leg so riders see addresses and names
/// without extra lookups. Pickup legs serve one shop; delivery legs group many bundles per shop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LegManifest {
    Shop(ShopDetails),
    Grouped { shops: Vec<ShopGroup> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopDetails {
    pub shop_name: String,
    pub dealer_name: String,
    pub address: String,
    pub phone: String,
    #[serde(default)]
    pub alternate_phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopGroup {
    pub shop_id: i64,
    pub shop_name: String,
    pub dealer_name: String,
    pub address: String,
    pub phone: String,
    #[serde(default)]
    pub alternate_phone: Option<String>,
    pub group_order_ids: Vec<i64>,
}

//--------------------------------------       Shop       ------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Shop {
    pub id: i64,
    pub shop_name: String,
    pub dealer_name: String,
    pub email: String,
    pub phone: String,
    pub alternate_phone: Option<String>,
    pub address: String,
    /// Running ledger of amounts carried forward on pay-on-delivery bundles.
    pub credit_balance: Paisa,
    pub delivery_charge: Paisa,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewShop {
    pub shop_name: String,
    pub dealer_name: String,
    pub email: String,
    pub phone: String,
    pub alternate_phone: Option<String>,
    pub address: String,
    pub delivery_charge: Paisa,
}

impl Shop {
    pub fn details(&self) -> ShopDetails {
        ShopDetails {
            shop_name: self.shop_name.clone(),
            dealer_name: self.dealer_name.clone(),
            address: self.address.clone(),
            phone: self.phone.clone(),
            alternate_phone: self.alternate_phone.clone(),
        }
    }
}

//--------------------------------------       Order      ------------------------------------------------------------

/// A single customer job as placed by a shop. Once bundled, `group_order_id` is set and the
/// order's payment status mirrors the bundle's.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: i64,
    pub shop_id: i64,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    #[sqlx(json)]
    pub job_spec: JobSpec,
    pub total_amount: Paisa,
    pub payment_status: PaymentStatus,
    pub group_order_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    pub shop_id: i64,
    pub customer_name: String,
    #[serde(default)]
    pub customer_phone: Option<String>,
    pub job_spec: JobSpec,
    pub total_amount: Paisa,
}

impl NewOrder {
    pub fn new(shop_id: i64, customer_name: String, job_spec: JobSpec, total_amount: Paisa) -> Self {
        Self { shop_id, customer_name, customer_phone: None, job_spec, total_amount }
    }
}

//--------------------------------------    GroupOrder    ------------------------------------------------------------

/// A bundle of one shop's orders, tracked and billed as a unit. The two pickup slots point at the
/// inbound (shop pickup) and outbound (admin pickup) legs once those are opened.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GroupOrder {
    pub id: i64,
    pub shop_id: i64,
    /// The facility handling the work. Injected from configuration at creation time.
    pub admin_id: String,
    pub total_amount: Paisa,
    pub delivery_charge: Paisa,
    /// Always `total_amount + delivery_charge`.
    pub final_amount: Paisa,
    pub paid_amount: Paisa,
    pub left_amount: Paisa,
    pub payment_status: PaymentStatus,
    pub tracking_status: TrackingStatus,
    pub shop_pickup_leg: Option<i64>,
    pub shop_pickup_key: Option<OrderKey>,
    pub admin_pickup_leg: Option<i64>,
    pub admin_pickup_key: Option<OrderKey>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewGroupOrder {
    pub shop_id: i64,
    pub order_ids: Vec<i64>,
    pub payment_option: PaymentOption,
    pub admin_id: String,
    pub order_key: OrderKey,
}

impl NewGroupOrder {
    pub fn new(shop_id: i64, order_ids: Vec<i64>, payment_option: PaymentOption, admin_id: String) -> Self {
        let order_key = crate::helpers::new_order_key();
        Self { shop_id, order_ids, payment_option, admin_id, order_key }
    }
}

//--------------------------------------       Rider      ------------------------------------------------------------

/// A delivery agent. `is_working` is the shift switch the rider controls; `is_available` is the
/// assignment lock the engine controls.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Rider {
    pub id: i64,
    /// Public six-digit code riders identify themselves with.
    pub rider_code: String,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub vehicle_number: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub is_available: bool,
    pub is_working: bool,
    pub total_orders: i64,
    pub total_earnings: Paisa,
    pub daily_orders: i64,
    pub daily_earnings: Paisa,
    pub push_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewRider {
    pub rider_code: String,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub vehicle_number: String,
    pub password_hash: String,
}

//--------------------------------------    DeliveryLeg   ------------------------------------------------------------

/// One rider-executed transport segment. Several group orders can share a delivery leg; the
/// legs-to-bundles relation lives in the `leg_orders` table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DeliveryLeg {
    pub id: i64,
    pub rider_id: Option<i64>,
    pub delivery_type: DeliveryType,
    pub order_key: OrderKey,
    /// What the rider earns when this leg completes.
    pub payment_amount: Paisa,
    pub is_pickup_verified: bool,
    pub is_drop_verified: bool,
    pub is_completed: bool,
    #[sqlx(json)]
    pub manifest: LegManifest,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------   TrackingOtp    ------------------------------------------------------------

/// A short-lived checkpoint credential. Exactly one of `group_order_id` / `order_key` is set,
/// matching [`OtpSubject`]. Rows are deleted on use and swept on expiry.
#[derive(Debug, Clone, FromRow)]
pub struct TrackingOtp {
    pub id: i64,
    pub group_order_id: Option<i64>,
    pub order_key: Option<OrderKey>,
    pub otp_code: String,
    pub purpose: OtpPurpose,
    pub created_at: DateTime<Utc>,
}
