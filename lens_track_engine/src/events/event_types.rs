use serde::{Deserialize, Serialize};

use crate::db_types::{DeliveryType, OrderKey, OtpPurpose};

/// Why a job broadcast is going out to the rider pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BroadcastKind {
    /// A new leg is open and looking for a rider.
    New,
    /// The leg has been claimed and should disappear from other riders' feeds.
    Withdrawn,
}

/// A delivery job appearing in, or vanishing from, the rider pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiderBroadcastEvent {
    pub order_key: OrderKey,
    pub kind: BroadcastKind,
    pub delivery_type: DeliveryType,
}

impl RiderBroadcastEvent {
    pub fn new(order_key: OrderKey, kind: BroadcastKind, delivery_type: DeliveryType) -> Self {
        Self { order_key, kind, delivery_type }
    }
}

/// Who a freshly issued checkpoint code should be sent to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OtpRecipient {
    ShopEmail(String),
    Admin(String),
}

/// A checkpoint code that needs to reach its holder out-of-band. The engine has already stored
/// the code; delivery failures do not affect the transition that issued it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpDispatchEvent {
    pub recipient: OtpRecipient,
    pub purpose: OtpPurpose,
    pub code: String,
    /// Human-readable handle for logs and message bodies, e.g. "group order #12".
    pub reference: String,
}

impl OtpDispatchEvent {
    pub fn new(recipient: OtpRecipient, purpose: OtpPurpose, code: String, reference: String) -> Self {
        Self { recipient, purpose, code, reference }
    }
}

/// A rider completed signup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiderWelcomeEvent {
    pub name: String,
    pub email: String,
}

impl RiderWelcomeEvent {
    pub fn new(name: String, email: String) -> Self {
        Self { name, email }
    }
}
