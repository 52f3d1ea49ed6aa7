use std::fmt::Display;

use lens_track_engine::db_types::{OrderKey, PaymentOption};
use ltg_common::Paisa;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGroupOrderRequest {
    pub shop_id: i64,
    pub order_ids: Vec<i64>,
    pub payment_option: PaymentOption,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcceptPickupRequest {
    pub pickup_rider_id: i64,
}

/// Shop-side checkpoints identify the rider through the leg, so only the code is submitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpRequest {
    pub otp_code: String,
}

/// Rider-side checkpoints require the rider to identify themselves alongside the code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiderOtpRequest {
    pub otp_code: String,
    pub rider_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallForPickupRequest {
    pub group_order_ids: Vec<i64>,
    /// What the rider earns for carrying the whole batch.
    pub delivery_amount: Paisa,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignRiderRequest {
    pub admin_pickup_key: OrderKey,
    pub delivery_rider_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteTransitRequest {
    pub rider_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiderLoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkingStatusRequest {
    pub working: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePhoneRequest {
    pub phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushTokenRequest {
    pub push_token: String,
}
