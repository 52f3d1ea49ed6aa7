use chrono::Duration;
use lens_track_engine::{
    db_types::{DeliveryLeg, GroupOrder, NewGroupOrder, NewOrder, NewRider, NewShop, Order, OrderKey, Rider, Shop},
    otp::OtpCheck,
    traits::{
        ActiveAdminLeg,
        ActiveShopOrder,
        AdminReceipt,
        DeliveryCall,
        DeliveryReceipt,
        GroupOrderBundle,
        OutboundDispatch,
        PickupAcceptance,
        PickupVerification,
        RiderApiError,
        RiderAssignment,
        RiderManagement,
        ShopOrderApiError,
        ShopOrderManagement,
        TrackingApiError,
        TrackingGatewayDatabase,
        TrackingQueries,
        TransitCompletion,
    },
};
use ltg_common::Paisa;
use mockall::mock;

mock! {
    pub TrackingDb {}
    impl Clone for TrackingDb {
        fn clone(&self) -> Self;
    }
    impl TrackingQueries for TrackingDb {
        async fn fetch_group_order(&self, id: i64) -> Result<Option<GroupOrder>, TrackingApiError>;
        async fn fetch_leg(&self, id: i64) -> Result<Option<DeliveryLeg>, TrackingApiError>;
        async fn fetch_leg_by_key(&self, key: &OrderKey) -> Result<Option<DeliveryLeg>, TrackingApiError>;
        async fn group_orders_for_leg(&self, leg_id: i64) -> Result<Vec<GroupOrder>, TrackingApiError>;
        async fn active_shop_orders(&self, shop_id: i64, otp_ttl: Duration) -> Result<Vec<ActiveShopOrder>, TrackingApiError>;
        async fn active_admin_legs(&self, admin_id: &str, otp_ttl: Duration) -> Result<Vec<ActiveAdminLeg>, TrackingApiError>;
    }
    impl TrackingGatewayDatabase for TrackingDb {
        fn url(&self) -> &str;
        async fn create_group_order(&self, order: NewGroupOrder) -> Result<GroupOrderBundle, TrackingApiError>;
        async fn accept_pickup(&self, group_order_id: i64, rider_id: i64) -> Result<PickupAcceptance, TrackingApiError>;
        async fn verify_pickup_otp(&self, group_order_id: i64, check: OtpCheck, ttl: Duration) -> Result<PickupVerification, TrackingApiError>;
        async fn verify_admin_otp(&self, group_order_id: i64, rider_id: i64, check: OtpCheck, ttl: Duration) -> Result<AdminReceipt, TrackingApiError>;
        async fn complete_work(&self, group_order_id: i64) -> Result<GroupOrder, TrackingApiError>;
        async fn call_for_pickup(&self, group_order_ids: &[i64], delivery_amount: Paisa, order_key: OrderKey) -> Result<DeliveryCall, TrackingApiError>;
        async fn assign_rider(&self, admin_pickup_key: &OrderKey, rider_id: i64) -> Result<RiderAssignment, TrackingApiError>;
        async fn verify_admin_pickup_otp(&self, order_key: &OrderKey, rider_id: i64, check: OtpCheck, ttl: Duration) -> Result<OutboundDispatch, TrackingApiError>;
        async fn verify_delivery_otp(&self, group_order_id: i64, rider_id: i64, check: OtpCheck, ttl: Duration) -> Result<DeliveryReceipt, TrackingApiError>;
        async fn complete_transit(&self, order_key: &OrderKey, rider_id: i64) -> Result<TransitCompletion, TrackingApiError>;
        async fn purge_expired_otps(&self, ttl: Duration) -> Result<u64, TrackingApiError>;
    }
}

mock! {
    pub RiderDb {}
    impl Clone for RiderDb {
        fn clone(&self) -> Self;
    }
    impl RiderManagement for RiderDb {
        async fn insert_rider(&self, rider: NewRider) -> Result<Rider, RiderApiError>;
        async fn rider_code_exists(&self, code: &str) -> Result<bool, RiderApiError>;
        async fn fetch_rider(&self, id: i64) -> Result<Option<Rider>, RiderApiError>;
        async fn fetch_rider_by_code(&self, code: &str) -> Result<Option<Rider>, RiderApiError>;
        async fn fetch_rider_by_email(&self, email: &str) -> Result<Option<Rider>, RiderApiError>;
        async fn fetch_all_riders(&self) -> Result<Vec<Rider>, RiderApiError>;
        async fn set_working_status(&self, rider_code: &str, working: bool) -> Result<Rider, RiderApiError>;
        async fn update_phone(&self, rider_code: &str, phone: &str) -> Result<Rider, RiderApiError>;
        async fn register_push_token(&self, rider_code: &str, token: &str) -> Result<Rider, RiderApiError>;
        async fn rider_history(&self, rider_id: i64) -> Result<Vec<DeliveryLeg>, RiderApiError>;
    }
}

mock! {
    pub ShopOrderDb {}
    impl Clone for ShopOrderDb {
        fn clone(&self) -> Self;
    }
    impl ShopOrderManagement for ShopOrderDb {
        async fn insert_shop(&self, shop: NewShop) -> Result<Shop, ShopOrderApiError>;
        async fn fetch_shop(&self, id: i64) -> Result<Option<Shop>, ShopOrderApiError>;
        async fn insert_order(&self, order: NewOrder) -> Result<Order, ShopOrderApiError>;
        async fn fetch_order(&self, id: i64) -> Result<Option<Order>, ShopOrderApiError>;
        async fn orders_for_shop(&self, shop_id: i64) -> Result<Vec<Order>, ShopOrderApiError>;
        async fn delete_order(&self, id: i64) -> Result<(), ShopOrderApiError>;
    }
}
