//! # Lens Track server
//! This crate hosts the HTTP gateway for the lens tracking engine. It is responsible for:
//! Accepting group order, rider and shop requests from the client apps.
//! Checking the shared API key on every /api route.
//! Driving the tracking engine's state machine and relaying its responses.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following route groups:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/orders`: Order intake, group order tracking, checkpoint verification and dashboards.
//! * `/api/riders`: Rider signup, login and profile upkeep.
//! * `/api/shops`: Shop registration and lookup.

pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;

pub mod expiry_worker;
pub mod helpers;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
