//! HTTP request handlers.
//!
//! This module contains all HTTP handlers organized by resource.

pub mod health;
pub mod members;
pub mod reservations;
pub mod sessions;

pub use health::{health_check, readiness_check};
