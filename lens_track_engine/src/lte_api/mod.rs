pub mod rider_api;
pub mod shop_order_api;
pub mod tracking_api;
