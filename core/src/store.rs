//! Storage contracts for sessions and reservations.
//!
//! # Implementations
//!
//! - `PostgresBookingStore` (in `studio-booking-postgres`): production, row locks
//! - `InMemoryBookingStore` (in `studio-booking-testing`): fast, deterministic tests
//!
//! # Atomicity
//!
//! [`ReservationStore::admit`] and [`ReservationStore::transition`] are the only
//! writes to reservations. Each one must run the pure decision
//! ([`crate::capacity::AdmissionCheck::evaluate`] or [`crate::lifecycle::apply`])
//! and the write inside the same serialized unit of work. Two admissions for
//! the same session must never both observe the same free seat.
//!
//! # Dyn Compatibility
//!
//! The traits return `Pin<Box<dyn Future>>` so that a single store can be
//! shared as `Arc<dyn ReservationStore>` by the service and HTTP handlers.

use crate::error::{Result, StoreError};
use crate::lifecycle::Transition;
use crate::types::{MemberId, Reservation, ReservationId, Session, SessionId};
use chrono::{DateTime, Utc};
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by store methods.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Admission request handed to [`ReservationStore::admit`].
///
/// The ID and timestamp are chosen by the caller so that stores stay free of
/// ambient clocks and random sources.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NewReservation {
    /// ID to assign on success
    pub id: ReservationId,
    /// Member asking for a seat
    pub member_id: MemberId,
    /// Session to book
    pub session_id: SessionId,
    /// Admission time
    pub created_at: DateTime<Utc>,
}

/// Read and administrative access to scheduled sessions.
pub trait SessionCatalog: Send + Sync {
    /// Load a session joined with its class.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the backend fails.
    fn get_session(&self, session_id: SessionId) -> StoreFuture<'_, std::result::Result<Option<Session>, StoreError>>;

    /// Mark a session cancelled.
    ///
    /// Takes the same lock as admission, so no reservation can be admitted
    /// after this returns. Existing reservations are left as they are.
    ///
    /// # Errors
    ///
    /// - [`crate::BookingError::SessionNotFound`]
    /// - [`crate::BookingError::SessionCancelled`] if it already was
    /// - [`crate::BookingError::Store`]
    fn cancel_session(&self, session_id: SessionId, at: DateTime<Utc>) -> StoreFuture<'_, Result<Session>>;
}

/// Transactional reservation writes.
pub trait ReservationStore: Send + Sync {
    /// Atomically admit a member into a session.
    ///
    /// # Errors
    ///
    /// Any rejection from [`crate::capacity::AdmissionCheck::evaluate`], or
    /// [`crate::BookingError::Store`].
    fn admit(&self, request: NewReservation) -> StoreFuture<'_, Result<Reservation>>;

    /// Atomically apply a lifecycle transition to a reservation.
    ///
    /// # Errors
    ///
    /// - [`crate::BookingError::ReservationNotFound`]
    /// - any rejection from [`crate::lifecycle::validate`]
    /// - [`crate::BookingError::Store`]
    fn transition(
        &self,
        reservation_id: ReservationId,
        transition: Transition,
        at: DateTime<Utc>,
    ) -> StoreFuture<'_, Result<Reservation>>;

    /// Load a single reservation.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the backend fails.
    fn get_reservation(
        &self,
        reservation_id: ReservationId,
    ) -> StoreFuture<'_, std::result::Result<Option<Reservation>, StoreError>>;

    /// Count seat-holding reservations for a session.
    ///
    /// Unlocked read; the answer can be stale by the time it is used.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the backend fails.
    fn occupancy(&self, session_id: SessionId) -> StoreFuture<'_, std::result::Result<u32, StoreError>>;
}
