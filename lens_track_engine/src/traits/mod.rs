//! Interface contracts for tracking engine database backends.
//!
//! The engine never talks to a store directly; it goes through these traits so that the public
//! APIs can be exercised against mocks in endpoint tests and against SQLite in production.
//!
//! * [`TrackingGatewayDatabase`] is the mutation surface: every state-machine transition is one
//!   method, and a backend must apply each transition atomically (all of its writes commit
//!   together or none do).
//! * [`TrackingQueries`] is the read-only companion: lookups and the active-work views used by
//!   shop and admin dashboards.
//! * [`RiderManagement`] covers the rider account surface and the availability flags.
//! * [`ShopOrderManagement`] covers shop records and single-order intake.
mod data_objects;
mod rider_management;
mod shop_order_management;
mod tracking_gateway_database;
mod tracking_queries;

pub use data_objects::{
    ActiveAdminLeg,
    ActiveShopOrder,
    AdminReceipt,
    DeliveryCall,
    DeliveryReceipt,
    GroupOrderBundle,
    OutboundDispatch,
    PickupAcceptance,
    PickupVerification,
    RiderAssignment,
    ShopOtp,
    TransitCompletion,
};
pub use rider_management::{RiderApiError, RiderManagement};
pub use shop_order_management::{ShopOrderApiError, ShopOrderManagement};
pub use tracking_gateway_database::{TrackingApiError, TrackingGatewayDatabase};
pub use tracking_queries::TrackingQueries;
