use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use lens_track_engine::{
    db_types::{NewRider, Rider},
    events::EventProducers,
    traits::RiderApiError,
    RiderApi,
};
use ltg_common::Paisa;
use serde_json::{json, Value};

use super::helpers::{get_request, post_request, put_request, TEST_API_KEY};
use crate::{
    endpoint_tests::mocks::MockRiderDb,
    routes::{EditWorkingStatusRoute, RiderHistoryRoute, RiderLoginRoute, RiderSignupRoute},
};

#[actix_web::test]
async fn signup_creates_an_account_and_hides_the_hash() {
    let _ = env_logger::try_init().ok();
    let body = json!({
        "name": "Kabir Das",
        "phone": "9833312345",
        "email": "kabir@example.com",
        "vehicle_number": "MH12KD7788",
        "password": "hunter2",
    });
    let (status, body) = post_request(TEST_API_KEY, "/signup", body, configure_success).await.expect("Request failed");
    assert_eq!(status, StatusCode::CREATED);
    let v: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(v["message"], json!("Signup successful"));
    assert_eq!(v["data"]["name"], json!("Kabir Das"));
    assert_eq!(v["data"]["rider_code"].as_str().map(str::len), Some(6));
    assert!(!body.contains("password"), "The password hash must never leave the server: {body}");
}

#[actix_web::test]
async fn signup_with_a_taken_email() {
    let _ = env_logger::try_init().ok();
    let body = json!({
        "name": "Kabir Das",
        "phone": "9833312345",
        "email": "meera@example.com",
        "vehicle_number": "MH12KD7788",
        "password": "hunter2",
    });
    let (status, body) = post_request(TEST_API_KEY, "/signup", body, configure_failures).await.expect("Request failed");
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"message":"Email already exists","success":false}"#);
}

#[actix_web::test]
async fn login_with_valid_credentials() {
    let _ = env_logger::try_init().ok();
    let body = json!({"email": "meera@example.com", "password": "hunter2"});
    let (status, body) = post_request(TEST_API_KEY, "/login", body, configure_success).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let v: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(v["message"], json!("Login Successful"));
    assert_eq!(v["data"]["rider_code"], json!("560921"));
}

#[actix_web::test]
async fn login_with_unknown_email() {
    let _ = env_logger::try_init().ok();
    let body = json!({"email": "nobody@example.com", "password": "hunter2"});
    let (status, body) = post_request(TEST_API_KEY, "/login", body, configure_failures).await.expect("Request failed");
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"message":"Rider Not Found","success":false}"#);
}

#[actix_web::test]
async fn login_with_wrong_password() {
    let _ = env_logger::try_init().ok();
    let body = json!({"email": "meera@example.com", "password": "password123"});
    let (status, body) = post_request(TEST_API_KEY, "/login", body, configure_success).await.expect("Request failed");
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"message":"Invalid Password","success":false}"#);
}

#[actix_web::test]
async fn working_status_flips_the_shift_switch() {
    let _ = env_logger::try_init().ok();
    let body = json!({"working": false});
    let (status, body) =
        put_request(TEST_API_KEY, "/560921/edit-working-status", body, configure_success).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let v: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(v["message"], json!("Working Status updated successfully"));
    assert_eq!(v["data"]["is_working"], json!(false));
}

#[actix_web::test]
async fn working_status_is_refused_mid_assignment() {
    let _ = env_logger::try_init().ok();
    let body = json!({"working": false});
    let (status, body) =
        put_request(TEST_API_KEY, "/560921/edit-working-status", body, configure_failures).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"message":"Rider is not available","success":false}"#);
}

#[actix_web::test]
async fn empty_history_is_a_not_found() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        get_request(TEST_API_KEY, "/order-history/560921", configure_failures).await.expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"message":"No orders found for this rider","success":false}"#);
}

fn configure_success(cfg: &mut ServiceConfig) {
    let mut db = MockRiderDb::new();
    db.expect_rider_code_exists().returning(|_| Ok(false));
    db.expect_insert_rider().returning(|rider| Ok(rider_from(rider)));
    db.expect_fetch_rider_by_email().returning(|_| Ok(Some(stored_rider())));
    db.expect_set_working_status().returning(|_, working| {
        let mut rider = stored_rider();
        rider.is_working = working;
        Ok(rider)
    });
    let api = RiderApi::new(db, EventProducers::default());
    cfg.service(RiderSignupRoute::<MockRiderDb>::new())
        .service(RiderLoginRoute::<MockRiderDb>::new())
        .service(EditWorkingStatusRoute::<MockRiderDb>::new())
        .app_data(web::Data::new(api));
}

fn configure_failures(cfg: &mut ServiceConfig) {
    let mut db = MockRiderDb::new();
    db.expect_rider_code_exists().returning(|_| Ok(false));
    db.expect_insert_rider().returning(|_| Err(RiderApiError::EmailExists));
    db.expect_fetch_rider_by_email().returning(|_| Ok(None));
    db.expect_set_working_status().returning(|_, _| Err(RiderApiError::OnAssignment));
    db.expect_fetch_rider_by_code().returning(|_| Ok(Some(stored_rider())));
    db.expect_rider_history().returning(|_| Ok(vec![]));
    let api = RiderApi::new(db, EventProducers::default());
    cfg.service(RiderSignupRoute::<MockRiderDb>::new())
        .service(RiderLoginRoute::<MockRiderDb>::new())
        .service(EditWorkingStatusRoute::<MockRiderDb>::new())
        .service(RiderHistoryRoute::<MockRiderDb>::new())
        .app_data(web::Data::new(api));
}

// Builds the stored row a backend would return for a freshly inserted rider.
fn rider_from(rider: NewRider) -> Rider {
    Rider {
        id: 12,
        rider_code: rider.rider_code,
        name: rider.name,
        phone: rider.phone,
        email: rider.email,
        vehicle_number: rider.vehicle_number,
        password_hash: rider.password_hash,
        is_available: true,
        is_working: false,
        total_orders: 0,
        total_earnings: Paisa::default(),
        daily_orders: 0,
        daily_earnings: Paisa::default(),
        push_token: None,
        created_at: Utc.with_ymd_and_hms(2024, 7, 14, 9, 30, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 7, 14, 9, 30, 0).unwrap(),
    }
}

fn stored_rider() -> Rider {
    Rider {
        id: 7,
        rider_code: "560921".to_string(),
        name: "Meera Shah".to_string(),
        phone: "9822210033".to_string(),
        email: "meera@example.com".to_string(),
        vehicle_number: "MH14XY9911".to_string(),
        // Low cost keeps the login tests quick
        password_hash: bcrypt::hash("hunter2", 4).unwrap(),
        is_available: true,
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
