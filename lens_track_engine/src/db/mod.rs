//! Database backends for the tracking engine.
//!
//! Sqlite is the only backend currently wired up. All access goes through the traits in
//! [`crate::traits`]; the row types live in [`crate::db_types`].

#[cfg(feature = "sqlite")]
pub mod sqlite;
