//! Booking service - the public entry point for every booking operation.
//!
//! The service coordinates between the store and the outside world:
//! 1. Stamp the request with an ID and the current time
//! 2. Run the atomic store operation (the decision happens inside it)
//! 3. Record metrics
//! 4. Publish a booking event once the change is committed
//! 5. Return result

use crate::capacity::Availability;
use crate::environment::{Clock, SystemClock};
use crate::error::{BookingError, Result};
use crate::events::{BookingEvent, BookingEventSink, TracingEventSink};
use crate::lifecycle::Transition;
use crate::metrics;
use crate::query::{MemberReservation, ReservationQuery, RosterEntry};
use crate::store::{NewReservation, ReservationStore, SessionCatalog};
use crate::types::{
    MemberId, Outcome, Reservation, ReservationId, Session, SessionId, TimeWindow,
};
use std::sync::Arc;
use std::time::Instant;

/// Booking operations over injected storage.
///
/// Cheap to clone; all state lives in the store.
#[derive(Clone)]
pub struct BookingService {
    sessions: Arc<dyn SessionCatalog>,
    reservations: Arc<dyn ReservationStore>,
    query: Arc<dyn ReservationQuery>,
    clock: Arc<dyn Clock>,
    events: Arc<dyn BookingEventSink>,
}

impl BookingService {
    /// Create a service backed by one store implementing every contract.
    ///
    /// Uses the system clock and logs events through `tracing`.
    #[must_use]
    pub fn new<S>(store: Arc<S>) -> Self
    where
        S: SessionCatalog + ReservationStore + ReservationQuery + 'static,
    {
        Self {
            sessions: store.clone(),
            reservations: store.clone(),
            query: store,
            clock: Arc::new(SystemClock),
            events: Arc::new(TracingEventSink),
        }
    }

    /// Replace the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, events: Arc<dyn BookingEventSink>) -> Self {
        self.events = events;
        self
    }

    /// Request a seat for a member in a session.
    ///
    /// # Errors
    ///
    /// `MemberNotFound`, `MemberInactive`, `SessionNotFound`,
    /// `SessionCancelled`, `ClassInactive`, `Duplicate`, `Full` or `Store`.
    #[tracing::instrument(skip_all, fields(%member_id, %session_id))]
    pub async fn request_reservation(
        &self,
        member_id: MemberId,
        session_id: SessionId,
    ) -> Result<Reservation> {
        let request = NewReservation {
            id: ReservationId::new(),
            member_id,
            session_id,
            created_at: self.clock.now(),
        };

        let started = Instant::now();
        let result = self.reservations.admit(request).await;
        metrics::record_admission(
            result.as_ref().map(|_| ()),
            started.elapsed().as_secs_f64(),
        );

        match &result {
            Ok(reservation) => {
                tracing::info!(reservation_id = %reservation.id, "Reservation confirmed");
                self.publish(BookingEvent::ReservationConfirmed {
                    reservation_id: reservation.id,
                    member_id,
                    session_id,
                    at: reservation.created_at,
                })
                .await;
            },
            Err(BookingError::Store(error)) => {
                tracing::error!(%error, "Admission failed in store");
            },
            Err(rejection) => {
                tracing::info!(code = rejection.code(), %rejection, "Reservation rejected");
            },
        }

        result
    }

    /// Load a single reservation.
    ///
    /// # Errors
    ///
    /// `ReservationNotFound` or `Store`.
    #[tracing::instrument(skip_all, fields(%reservation_id))]
    pub async fn get_reservation(&self, reservation_id: ReservationId) -> Result<Reservation> {
        self.reservations
            .get_reservation(reservation_id)
            .await?
            .ok_or(BookingError::ReservationNotFound(reservation_id))
    }

    /// Cancel a confirmed reservation, freeing its seat.
    ///
    /// # Errors
    ///
    /// `ReservationNotFound`, `AlreadyTerminal` or `Store`.
    #[tracing::instrument(skip_all, fields(%reservation_id))]
    pub async fn cancel_reservation(&self, reservation_id: ReservationId) -> Result<Reservation> {
        let reservation = self.transition(reservation_id, Transition::Cancel).await?;
        self.publish(BookingEvent::ReservationCancelled {
            reservation_id,
            session_id: reservation.session_id,
            at: reservation.updated_at,
        })
        .await;
        Ok(reservation)
    }

    /// Record whether the member attended. The seat stays taken.
    ///
    /// # Errors
    ///
    /// `ReservationNotFound`, `NotConfirmed` or `Store`.
    #[tracing::instrument(skip_all, fields(%reservation_id, ?outcome))]
    pub async fn set_outcome(
        &self,
        reservation_id: ReservationId,
        outcome: Outcome,
    ) -> Result<Reservation> {
        let reservation = self
            .transition(reservation_id, Transition::RecordOutcome(outcome))
            .await?;
        self.publish(BookingEvent::OutcomeRecorded {
            reservation_id,
            outcome,
            at: reservation.updated_at,
        })
        .await;
        Ok(reservation)
    }

    /// Call off a session. Existing reservations keep their status.
    ///
    /// # Errors
    ///
    /// `SessionNotFound`, `SessionCancelled` or `Store`.
    #[tracing::instrument(skip_all, fields(%session_id))]
    pub async fn cancel_session(&self, session_id: SessionId) -> Result<Session> {
        let at = self.clock.now();
        let session = self.sessions.cancel_session(session_id, at).await?;
        metrics::record_session_cancelled();
        tracing::info!("Session cancelled");
        self.publish(BookingEvent::SessionCancelled { session_id, at }).await;
        Ok(session)
    }

    /// Current capacity, occupancy and remaining seats of a session.
    ///
    /// # Errors
    ///
    /// `SessionNotFound` or `Store`.
    #[tracing::instrument(skip_all, fields(%session_id))]
    pub async fn session_availability(&self, session_id: SessionId) -> Result<Availability> {
        let session = self
            .sessions
            .get_session(session_id)
            .await?
            .ok_or(BookingError::SessionNotFound(session_id))?;
        let occupancy = self.reservations.occupancy(session_id).await?;
        Ok(Availability::of(&session, occupancy))
    }

    /// A member's reservations in a time window.
    ///
    /// # Errors
    ///
    /// `MemberNotFound` or `Store`.
    #[tracing::instrument(skip_all, fields(%member_id))]
    pub async fn member_reservations(
        &self,
        member_id: MemberId,
        window: TimeWindow,
    ) -> Result<Vec<MemberReservation>> {
        self.query.member_reservations(member_id, window).await
    }

    /// Every reservation of a session.
    ///
    /// # Errors
    ///
    /// `SessionNotFound` or `Store`.
    #[tracing::instrument(skip_all, fields(%session_id))]
    pub async fn session_roster(&self, session_id: SessionId) -> Result<Vec<RosterEntry>> {
        self.query.session_roster(session_id).await
    }

    async fn transition(
        &self,
        reservation_id: ReservationId,
        transition: Transition,
    ) -> Result<Reservation> {
        let result = self
            .reservations
            .transition(reservation_id, transition, self.clock.now())
            .await;
        metrics::record_transition(transition, result.as_ref().map(|_| ()));

        match &result {
            Ok(reservation) => {
                tracing::info!(transition = transition.as_str(), status = %reservation.status, "Reservation updated");
            },
            Err(BookingError::Store(error)) => {
                tracing::error!(transition = transition.as_str(), %error, "Transition failed in store");
            },
            Err(rejection) => {
                tracing::info!(transition = transition.as_str(), code = rejection.code(), %rejection, "Transition rejected");
            },
        }

        result
    }

    async fn publish(&self, event: BookingEvent) {
        let event_type = event.event_type();
        if let Err(error) = self.events.publish(event).await {
            tracing::warn!(event_type, %error, "Failed to publish booking event");
        }
    }
}
