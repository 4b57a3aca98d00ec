//! HTTP route handlers.

pub mod health;
pub mod position;
pub mod roster;
pub mod session;
