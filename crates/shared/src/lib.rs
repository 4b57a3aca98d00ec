//! Shared utilities and common types for Safe Circle.
//!
//! This crate provides functionality used across all other crates:
//! - Great-circle distance and movement detection
//! - Localized relative-time rendering
//! - Coordinate validation

pub mod distance;
pub mod relative_time;
pub mod validation;

pub use distance::{distance_km, has_moved_significantly, round_km, Coordinates};
pub use relative_time::{format_elapsed, Locale};
