use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use lens_track_engine::{
    db_types::{NewOrder, NewShop, Order, PaymentStatus, Shop},
    traits::ShopOrderApiError,
    ShopOrderApi,
};
use ltg_common::Paisa;
use serde_json::{json, Value};

use super::helpers::{delete_request, get_request, post_request, TEST_API_KEY};
use crate::{
    endpoint_tests::mocks::MockShopOrderDb,
    routes::{CreateShopRoute, DeleteOrderRoute, OrderByIdRoute, PlaceOrderRoute, ShopByIdRoute},
};

#[actix_web::test]
async fn create_shop_registers_the_counter() {
    let _ = env_logger::try_init().ok();
    let body = json!({
        "shop_name": "Roshni Opticals",
        "dealer_name": "S. Qureshi",
        "email": "roshni@example.com",
        "phone": "9800011122",
        "address": "14 MG Road, Pune",
        "delivery_charge": 6000,
    });
    let (status, body) = post_request(TEST_API_KEY, "/shops", body, configure_success).await.expect("Request failed");
    assert_eq!(status, StatusCode::CREATED);
    let v: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(v["message"], json!("Shop created successfully"));
    assert_eq!(v["data"]["shop_name"], json!("Roshni Opticals"));
    assert_eq!(v["data"]["credit_balance"], json!(0));
}

#[actix_web::test]
async fn place_order_accepts_a_fitting_job() {
    let _ = env_logger::try_init().ok();
    let body = json!({
        "shop_id": 3,
        "customer_name": "Ravi Kumar",
        "customer_phone": "9822001100",
        "job_spec": {
            "job": "fitting",
            "frame_type": "full_rim",
            "purchase_lens": true,
            "glass_type": "single_vision",
            "lens_details": "1.56 blue cut",
            "power": {
                "power_type": "distance",
                "entry_type": "manual",
                "right": {"sph": "-1.25", "cyl": "-0.50", "axis": "180"},
                "left": {"sph": "-1.00"},
            },
            "fitting_charge": 45000,
        },
        "total_amount": 120000,
    });
    let (status, body) = post_request(TEST_API_KEY, "/place-order", body, configure_success).await.expect("Request failed");
    assert_eq!(status, StatusCode::CREATED);
    let v: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(v["message"], json!("Order placed successfully"));
    assert_eq!(v["data"]["payment_status"], json!("unpaid"));
    assert_eq!(v["data"]["group_order_id"], json!(null));
    assert_eq!(v["data"]["job_spec"]["job"], json!("fitting"));
}

#[actix_web::test]
async fn place_order_with_zero_total() {
    let _ = env_logger::try_init().ok();
    let body = json!({
        "shop_id": 3,
        "customer_name": "Ravi Kumar",
        "job_spec": {"job": "shifting", "frame_type": "half_rim", "shifting_charge": 15000},
        "total_amount": 0,
    });
    let (status, body) = post_request(TEST_API_KEY, "/place-order", body, configure_success).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"message":"total_amount must be positive","success":false}"#);
}

#[actix_web::test]
async fn order_lookup_that_misses() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request(TEST_API_KEY, "/order/999", configure_success).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "null");
}

#[actix_web::test]
async fn delete_an_unbundled_order() {
    let _ = env_logger::try_init().ok();
    let (status, body) = delete_request(TEST_API_KEY, "/delete-order/31", configure_success).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":true,"message":"Order deleted successfully"}"#);
}

#[actix_web::test]
async fn delete_a_bundled_order_is_refused() {
    let _ = env_logger::try_init().ok();
    let (status, body) = delete_request(TEST_API_KEY, "/delete-order/31", configure_failures).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"message":"Order is already part of a group order","success":false}"#);
}

fn configure_success(cfg: &mut ServiceConfig) {
    let mut db = MockShopOrderDb::new();
    db.expect_insert_shop().returning(|shop| Ok(shop_from(shop)));
    db.expect_insert_order().returning(|order| Ok(order_from(order)));
    db.expect_fetch_order().returning(|_| Ok(None));
    db.expect_delete_order().returning(|_| Ok(()));
    let api = ShopOrderApi::new(db);
    cfg.service(
        web::scope("/shops")
            .service(CreateShopRoute::<MockShopOrderDb>::new())
            .service(ShopByIdRoute::<MockShopOrderDb>::new()),
    )
    .service(PlaceOrderRoute::<MockShopOrderDb>::new())
    .service(OrderByIdRoute::<MockShopOrderDb>::new())
    .service(DeleteOrderRoute::<MockShopOrderDb>::new())
    .app_data(web::Data::new(api));
}

fn configure_failures(cfg: &mut ServiceConfig) {
    let mut db = MockShopOrderDb::new();
    db.expect_delete_order().returning(|_| Err(ShopOrderApiError::OrderBundled));
    let api = ShopOrderApi::new(db);
    cfg.service(DeleteOrderRoute::<MockShopOrderDb>::new()).app_data(web::Data::new(api));
}

// Builds the stored row a backend would return for a freshly inserted shop.
fn shop_from(shop: NewShop) -> Shop {
    Shop {
        id: 3,
        shop_name: shop.shop_name,
        dealer_name: shop.dealer_name,
        email: shop.email,
        phone: shop.phone,
        alternate_phone: shop.alternate_phone,
        address: shop.address,
        credit_balance: Paisa::default(),
        delivery_charge: shop.delivery_charge,
        created_at: Utc.with_ymd_and_hms(2024, 7, 1, 8, 0, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 7, 1, 8, 0, 0).unwrap(),
    }
}

fn order_from(order: NewOrder) -> Order {
    Order {
        id: 31,
        shop_id: order.shop_id,
        customer_name: order.customer_name,
        customer_phone: order.customer_phone,
        job_spec: order.job_spec,
        total_amount: order.total_amount,
        payment_status: PaymentStatus::Unpaid,
        group_order_id: None,
        created_at: Utc.with_ymd_and_hms(2024, 7, 13, 17, 45, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 7, 13, 17, 45, 0).unwrap(),
    }
}
