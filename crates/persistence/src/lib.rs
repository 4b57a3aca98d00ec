//! Persistence layer for Safe Circle.
//!
//! This crate contains:
//! - Database connection management
//! - Entity definitions (database row mappings)
//! - Repository implementations
//! - Postgres adapters for the roster source and status feed ports

pub mod db;
pub mod entities;
pub mod error;
pub mod feed;
pub mod metrics;
pub mod repositories;
pub mod source;

pub use feed::{PgStatusFeed, DEFAULT_FEED_CHANNEL};
pub use source::PgRosterSource;
