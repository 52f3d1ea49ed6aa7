use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use lens_track_engine::{
    db_types::{
        DeliveryLeg,
        DeliveryType,
        GroupOrder,
        JobSpec,
        LegManifest,
        Order,
        OrderKey,
        PaymentStatus,
        Rider,
        Shop,
        ShopDetails,
        TrackingStatus,
    },
    events::EventProducers,
    otp::OtpSettings,
    traits::{ActiveShopOrder, DeliveryCall, GroupOrderBundle, PickupAcceptance, TrackingApiError},
    TrackingApi,
};
use ltg_common::Paisa;
use serde_json::{json, Value};

use super::helpers::{get_request, patch_request, post_request, server_options, TEST_API_KEY};
use crate::{
    endpoint_tests::mocks::MockTrackingDb,
    routes::{
        AcceptPickupRoute,
        ActiveShopOrdersRoute,
        CallForPickupRoute,
        CompleteWorkRoute,
        CreateGroupOrderRoute,
        FetchGroupOrderRoute,
        VerifyDeliveryOtpRoute,
    },
};

#[actix_web::test]
async fn requests_without_api_key_are_refused() {
    let _ = env_logger::try_init().ok();
    let err = get_request("", "/active-shop-orders/3", configure_success).await.expect_err("Expected error");
    assert_eq!(err, "API key is missing.");
}

#[actix_web::test]
async fn requests_with_wrong_api_key_are_refused() {
    let _ = env_logger::try_init().ok();
    let err =
        get_request("definitely-not-the-key", "/active-shop-orders/3", configure_success).await.expect_err("Expected error");
    assert_eq!(err, "Access denied. Invalid API key.");
}

#[actix_web::test]
async fn create_group_order_bundles_orders() {
    let _ = env_logger::try_init().ok();
    let body = json!({"shop_id": 3, "order_ids": [31, 32], "payment_option": "delivery"});
    let (status, body) =
        post_request(TEST_API_KEY, "/create-group-order", body, configure_success).await.expect("Request failed");
    assert_eq!(status, StatusCode::CREATED);
    let v: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(v["success"], json!(true));
    assert_eq!(v["message"], json!("Group order created successfully"));
    assert_eq!(v["data"]["group_order"]["tracking_status"], json!("Order Placed For Pickup"));
    assert_eq!(v["data"]["group_order"]["left_amount"], json!(120_000));
    assert_eq!(v["data"]["orders"].as_array().map(Vec::len), Some(2));
}

#[actix_web::test]
async fn create_group_order_for_unknown_shop() {
    let _ = env_logger::try_init().ok();
    let body = json!({"shop_id": 999, "order_ids": [31], "payment_option": "full"});
    let (status, body) =
        post_request(TEST_API_KEY, "/create-group-order", body, configure_failures).await.expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"message":"Shop not found","success":false}"#);
}

#[actix_web::test]
async fn accept_pickup_returns_the_shop_code() {
    let _ = env_logger::try_init().ok();
    let body = json!({"pickup_rider_id": 7});
    let (status, body) =
        post_request(TEST_API_KEY, "/16/accept-pickup", body, configure_success).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let v: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(v["message"], json!("Pickup accepted successfully. OTP sent to your email."));
    assert_eq!(v["otp"], json!("4821"));
    assert_eq!(v["data"]["tracking_status"], json!("Pickup Accepted"));
}

#[actix_web::test]
async fn accept_pickup_with_locked_rider() {
    let _ = env_logger::try_init().ok();
    let body = json!({"pickup_rider_id": 7});
    let (status, body) =
        post_request(TEST_API_KEY, "/16/accept-pickup", body, configure_failures).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"message":"Rider is not available or not working","success":false}"#);
}

#[actix_web::test]
async fn complete_work_marks_bundle_ready() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        patch_request(TEST_API_KEY, "/16/complete-work", json!({}), configure_success).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let v: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(v["message"], json!("Work completed successfully"));
    assert_eq!(v["data"]["tracking_status"], json!("Work Completed"));
}

#[actix_web::test]
async fn complete_work_out_of_turn_names_the_blocking_status() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        patch_request(TEST_API_KEY, "/16/complete-work", json!({}), configure_failures).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let v: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(v["message"], json!("Group order #16 is in 'Order Picked Up', not 'Order Received By Admin'"));
}

#[actix_web::test]
async fn call_for_pickup_returns_the_routing_key() {
    let _ = env_logger::try_init().ok();
    let body = json!({"group_order_ids": [16, 17], "delivery_amount": 15000});
    let (status, body) =
        post_request(TEST_API_KEY, "/call-for-pickup", body, configure_success).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let v: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(v["message"], json!("Admin pickup key assigned successfully"));
    assert_eq!(v["data"]["admin_pickup_key"], json!("77001122cdd4"));
    assert_eq!(v["data"]["group_order_ids"], json!([16, 17]));
}

#[actix_web::test]
async fn call_for_pickup_rejects_unready_batches() {
    let _ = env_logger::try_init().ok();
    let body = json!({"group_order_ids": [7, 9, 16], "delivery_amount": 15000});
    let (status, body) =
        post_request(TEST_API_KEY, "/call-for-pickup", body, configure_failures).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        r#"{"invalid_ids":[7,9],"message":"Some group orders are not in 'Work Completed' status","success":false}"#
    );
}

#[actix_web::test]
async fn verify_delivery_otp_with_wrong_code() {
    let _ = env_logger::try_init().ok();
    let body = json!({"otp_code": "1111", "rider_id": 7});
    let (status, body) =
        post_request(TEST_API_KEY, "/16/verify-delivery-otp", body, configure_failures).await.expect("Request failed");
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"message":"Invalid OTP","success":false}"#);
}

#[actix_web::test]
async fn active_shop_orders_lists_live_checkpoints() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request(TEST_API_KEY, "/active-shop-orders/3", configure_success).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, ACTIVE_SHOP_ORDERS_JSON);
}

#[actix_web::test]
async fn fetch_group_order_that_does_not_exist() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request(TEST_API_KEY, "/get-group-order/999", configure_success).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "null");
}

fn configure_success(cfg: &mut ServiceConfig) {
    let mut db = MockTrackingDb::new();
    db.expect_create_group_order().returning(|_| {
        Ok(GroupOrderBundle {
            group_order: canned_group_order(TrackingStatus::PlacedForPickup),
            leg: canned_leg(DeliveryType::Pickup),
            orders: vec![canned_order(31), canned_order(32)],
            shop: canned_shop(),
        })
    });
    db.expect_accept_pickup().returning(|_, _| {
        Ok(PickupAcceptance {
            group_order: canned_group_order(TrackingStatus::PickupAccepted),
            leg: canned_leg(DeliveryType::Pickup),
            rider: canned_rider(),
            shop: canned_shop(),
            otp: "4821".to_string(),
        })
    });
    db.expect_complete_work().returning(|_| Ok(canned_group_order(TrackingStatus::WorkCompleted)));
    db.expect_call_for_pickup().returning(|_, _, _| {
        let mut leg = canned_leg(DeliveryType::Delivery);
        leg.order_key = OrderKey("77001122cdd4".to_string());
        let mut second = canned_group_order(TrackingStatus::InternalTracking);
        second.id = 17;
        Ok(DeliveryCall { leg, group_orders: vec![canned_group_order(TrackingStatus::InternalTracking), second] })
    });
    db.expect_active_shop_orders().returning(|_, _| Ok(dashboard_rows()));
    db.expect_fetch_group_order().returning(|_| Ok(None));
    let api = TrackingApi::new(db, EventProducers::default(), OtpSettings::default());
    cfg.service(CreateGroupOrderRoute::<MockTrackingDb>::new())
        .service(AcceptPickupRoute::<MockTrackingDb>::new())
        .service(CompleteWorkRoute::<MockTrackingDb>::new())
        .service(CallForPickupRoute::<MockTrackingDb>::new())
        .service(ActiveShopOrdersRoute::<MockTrackingDb>::new())
        .service(FetchGroupOrderRoute::<MockTrackingDb>::new())
        .app_data(web::Data::new(api))
        .app_data(web::Data::new(server_options()));
}

fn configure_failures(cfg: &mut ServiceConfig) {
    let mut db = MockTrackingDb::new();
    db.expect_create_group_order().returning(|_| Err(TrackingApiError::NotFound("Shop not found".to_string())));
    db.expect_accept_pickup().returning(|_, _| Err(TrackingApiError::RiderUnavailable));
    db.expect_complete_work().returning(|_| {
        Err(TrackingApiError::InvalidState(
            "Group order #16 is in 'Order Picked Up', not 'Order Received By Admin'".to_string(),
        ))
    });
    db.expect_call_for_pickup()
        .returning(|_, _, _| Err(TrackingApiError::BatchNotReady { invalid_ids: vec![7, 9] }));
    db.expect_verify_delivery_otp()
        .returning(|_, _, _, _| Err(TrackingApiError::Unauthorized("Invalid OTP".to_string())));
    let api = TrackingApi::new(db, EventProducers::default(), OtpSettings::default());
    cfg.service(CreateGroupOrderRoute::<MockTrackingDb>::new())
        .service(AcceptPickupRoute::<MockTrackingDb>::new())
        .service(CompleteWorkRoute::<MockTrackingDb>::new())
        .service(CallForPickupRoute::<MockTrackingDb>::new())
        .service(VerifyDeliveryOtpRoute::<MockTrackingDb>::new())
        .app_data(web::Data::new(api))
        .app_data(web::Data::new(server_options()));
}

fn canned_group_order(status: TrackingStatus) -> GroupOrder {
    GroupOrder {
        id: 16,
        shop_id: 3,
        admin_id: "LTG-ADMIN-01".to_string(),
        total_amount: Paisa::from_rupees(1200),
        delivery_charge: Paisa::from_rupees(60),
        final_amount: Paisa::from_rupees(1260),
        paid_amount: Paisa::from_rupees(60),
        left_amount: Paisa::from_rupees(1200),
        payment_status: PaymentStatus::Pending,
        tracking_status: status,
        shop_pickup_leg: Some(9),
        shop_pickup_key: Some(OrderKey("58231907aefb".to_string())),
        admin_pickup_leg: None,
        admin_pickup_key: None,
        created_at: Utc.with_ymd_and_hms(2024, 7, 14, 9, 30, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 7, 14, 9, 30, 0).unwrap(),
    }
}

fn canned_leg(delivery_type: DeliveryType) -> DeliveryLeg {
    DeliveryLeg {
        id: 9,
        rider_id: None,
        delivery_type,
        order_key: OrderKey("58231907aefb".to_string()),
        payment_amount: Paisa::from_rupees(60),
        is_pickup_verified: false,
        is_drop_verified: false,
        is_completed: false,
        manifest: LegManifest::Shop(ShopDetails {
            shop_name: "Roshni Opticals".to_string(),
            dealer_name: "S. Qureshi".to_string(),
            address: "14 MG Road, Pune".to_string(),
            phone: "9800011122".to_string(),
            alternate_phone: None,
        }),
        created_at: Utc.with_ymd_and_hms(2024, 7, 14, 9, 30, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 7, 14, 9, 30, 0).unwrap(),
    }
}

fn canned_shop() -> Shop {
    Shop {
        id: 3,
        shop_name: "Roshni Opticals".to_string(),
        dealer_name: "S. Qureshi".to_string(),
        email: "roshni@example.com".to_string(),
        phone: "9800011122".to_string(),
        alternate_phone: None,
        address: "14 MG Road, Pune".to_string(),
        credit_balance: Paisa::from_rupees(1200),
        delivery_charge: Paisa::from_rupees(60),
        created_at: Utc.with_ymd_and_hms(2024, 7, 1, 8, 0, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 7, 14, 9, 30, 0).unwrap(),
    }
}

fn canned_order(id: i64) -> Order {
    Order {
        id,
        shop_id: 3,
        customer_name: "Ravi Kumar".to_string(),
        customer_phone: Some("9822001100".to_string()),
        job_spec: JobSpec::Shifting { frame_type: "full_rim".to_string(), shifting_charge: Paisa::from_rupees(150) },
        total_amount: Paisa::from_rupees(600),
        payment_status: PaymentStatus::Unpaid,
        group_order_id: Some(16),
        created_at: Utc.with_ymd_and_hms(2024, 7, 13, 17, 45, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 7, 14, 9, 30, 0).unwrap(),
    }
}

fn canned_rider() -> Rider {
    Rider {
        id: 7,
        rider_code: "482193".to_string(),
        name: "Arjun Pal".to_string(),
        phone: "9811100223".to_string(),
        email: "arjun@example.com".to_string(),
        vehicle_number: "MH12AB3456".to_string(),
        password_hash: "$2b$12$abcdefghijklmnopqrstuv".to_string(),
        is_available: false,
        is_working: true,
        total_orders: 41,
        total_earnings: Paisa::from_rupees(2460),
        daily_orders: 3,
        daily_earnings: Paisa::from_rupees(180),
        push_token: None,
        created_at: Utc.with_ymd_and_hms(2024, 5, 2, 11, 0, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 7, 14, 9, 30, 0).unwrap(),
    }
}

// Mock response to `active_shop_orders`
fn dashboard_rows() -> Vec<ActiveShopOrder> {
    vec![
        ActiveShopOrder {
            group_order_id: 16,
            tracking_status: TrackingStatus::PickupAccepted,
            otp_code: Some("4821".to_string()),
            rider_name: Some("Arjun Pal".to_string()),
            rider_phone: Some("9811100223".to_string()),
        },
        ActiveShopOrder {
            group_order_id: 14,
            tracking_status: TrackingStatus::OutForDelivery,
            otp_code: None,
            rider_name: Some("Meera Shah".to_string()),
            rider_phone: Some("9822210033".to_string()),
        },
    ]
}

const ACTIVE_SHOP_ORDERS_JSON: &str = r#"[{"group_order_id":16,"tracking_status":"Pickup Accepted","otp_code":"4821","rider_name":"Arjun Pal","rider_phone":"9811100223"},{"group_order_id":14,"tracking_status":"Out For Delivery","otp_code":null,"rider_name":"Meera Shah","rider_phone":"9822210033"}]"#;
