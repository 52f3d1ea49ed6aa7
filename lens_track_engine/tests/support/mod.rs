#![allow(dead_code)]

use lens_track_engine::{
    db_types::{EyePower, GroupOrder, JobSpec, NewGroupOrder, NewOrder, NewShop, PaymentOption, PowerProfile, Rider},
    events::EventProducers,
    otp::OtpSettings,
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    RiderApi,
    RiderRegistration,
    ShopOrderApi,
    SqliteDatabase,
    TrackingApi,
};
use log::*;
use ltg_common::Paisa;
use sqlx::{migrate::MigrateDatabase, Sqlite};

pub const ADMIN_ID: &str = "LAB-ADMIN-01";

pub struct TestRig {
    pub tracking: TrackingApi<SqliteDatabase>,
    pub riders: RiderApi<SqliteDatabase>,
    pub shops: ShopOrderApi<SqliteDatabase>,
    pub url: String,
}

pub async fn setup() -> TestRig {
    setup_with(OtpSettings::default(), EventProducers::default()).await
}

pub async fn setup_with(otp_settings: OtpSettings, producers: EventProducers) -> TestRig {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
    TestRig {
        tracking: TrackingApi::new(db.clone(), producers.clone(), otp_settings),
        riders: RiderApi::new(db.clone(), producers),
        shops: ShopOrderApi::new(db),
        url,
    }
}

pub async fn tear_down(mut rig: TestRig) {
    rig.tracking.db_mut().close().await;
    if let Err(e) = Sqlite::drop_database(&rig.url).await {
        error!("🚀️ Failed to drop test database: {e}");
    }
}

pub fn sample_shop(tag: &str) -> NewShop {
    NewShop {
        shop_name: format!("{tag} Opticals"),
        dealer_name: "R. Sharma".into(),
        email: format!("{tag}@lenstrack.test"),
        phone: "9811000001".into(),
        alternate_phone: None,
        address: "14 MG Road, Pune".into(),
        delivery_charge: Paisa::from_rupees(80),
    }
}

pub fn shifting_order(shop_id: i64, customer: &str, total: Paisa) -> NewOrder {
    let job = JobSpec::Shifting { frame_type: "full-rim".into(), shifting_charge: Paisa::from_rupees(150) };
    NewOrder::new(shop_id, customer.into(), job, total)
}

pub fn fitting_order(shop_id: i64, customer: &str, total: Paisa) -> NewOrder {
    let job = JobSpec::Fitting {
        frame_type: "half-rim".into(),
        purchase_lens: true,
        glass_type: "single-vision".into(),
        lens_details: "1.56 blue-cut".into(),
        material_details: None,
        coating_details: Some("anti-glare".into()),
        power: PowerProfile {
            power_type: "distance".into(),
            entry_type: "manual".into(),
            right: Some(EyePower { sph: Some("-1.25".into()), cyl: None, axis: None, add: None }),
            left: Some(EyePower { sph: Some("-1.00".into()), cyl: Some("-0.50".into()), axis: Some("90".into()), add: None }),
        },
        fitting_charge: Paisa::from_rupees(350),
    };
    NewOrder::new(shop_id, customer.into(), job, total)
}

pub fn rider_registration(tag: &str) -> RiderRegistration {
    RiderRegistration {
        name: format!("Rider {tag}"),
        phone: "9900112233".into(),
        email: format!("{tag}@riders.lenstrack.test"),
        vehicle_number: format!("MH12-{tag}"),
        password: "wheels".into(),
    }
}

/// Registers a rider and puts them on shift.
pub async fn working_rider(rig: &TestRig, tag: &str) -> Rider {
    let rider = rig.riders.register(rider_registration(tag)).await.expect("Error registering rider");
    rig.riders.set_working_status(&rider.rider_code, true).await.expect("Error putting rider on shift")
}

/// Runs one bundle through the whole inbound flow and the lens work, leaving it `Work Completed`
/// and the rider free again.
pub async fn drive_to_work_completed(rig: &TestRig, shop_id: i64, rider_id: i64, total: Paisa) -> GroupOrder {
    let order = rig.shops.place_order(shifting_order(shop_id, "Batch", total)).await.expect("Error placing order");
    let bundle = rig
        .tracking
        .create_group_order(NewGroupOrder::new(shop_id, vec![order.id], PaymentOption::Full, ADMIN_ID.into()))
        .await
        .expect("Error creating group order");
    let id = bundle.group_order.id;
    let acceptance = rig.tracking.accept_pickup(id, rider_id).await.expect("Error accepting pickup");
    let verification = rig.tracking.verify_pickup_otp(id, &acceptance.otp).await.expect("Error verifying pickup");
    rig.tracking.verify_admin_otp(id, rider_id, &verification.admin_otp).await.expect("Error verifying admin receipt");
    rig.tracking.complete_transit(&acceptance.leg.order_key, rider_id).await.expect("Error completing transit");
    rig.tracking.complete_work(id).await.expect("Error completing work")
}
