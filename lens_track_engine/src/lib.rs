//! Lens Track Engine
//!
//! The core of the lens logistics gateway: a state machine that walks eyewear group orders from
//! shop pickup, through the admin facility's lens work, and back out to the shops, with OTP
//! hand-over checkpoints and rider assignment along the way.
//!
//! The library is split into three layers:
//! 1. Storage ([`mod@db`]). Sqlite is the supported backend. Its row types live in [`db_types`]
//!    and are public; everything else goes through the traits in [`traits`], one method per
//!    state-machine transition, each applied in a single transaction.
//! 2. The public APIs ([`TrackingApi`], [`RiderApi`], [`ShopOrderApi`]). These wrap any backend
//!    implementing the traits, apply OTP policy, and fire post-commit event hooks.
//! 3. Events ([`events`]). A small actor scheme for reacting to engine events (job broadcasts,
//!    OTP dispatch, rider welcomes) without coupling the engine to any messaging provider.
mod db;

pub mod db_types;
pub mod events;
pub mod helpers;
mod lte_api;
pub mod otp;
pub mod settlement;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use db::sqlite;
#[cfg(feature = "sqlite")]
pub use db::sqlite::SqliteDatabase;
pub use lte_api::{
    rider_api::{RiderApi, RiderRegistration},
    shop_order_api::ShopOrderApi,
    tracking_api::TrackingApi,
};
pub use traits::{RiderManagement, ShopOrderManagement, TrackingGatewayDatabase, TrackingQueries};
