//! Domain layer for Safe Circle.
//!
//! This crate contains:
//! - Domain models (Group, Member, SafetyStatus, RosterEntry)
//! - The roster reconciliation services and the backend ports they consume
//! - Domain error types

pub mod error;
pub mod models;
pub mod services;

pub use error::{BackendError, LoadErrorCategory, LoadFailure, RosterError};
