//! Booking server support code.
//!
//! The binary lives in `main.rs`; this library holds what it needs to be
//! testable on its own.

pub mod config;
pub mod probe;
