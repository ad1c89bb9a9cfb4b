//! In-memory booking store for fast, deterministic tests.
//!
//! Implements every storage contract of the booking core behind a single
//! mutex. Holding that mutex across the whole admit or transition stands in
//! for the row lock a database would take: the capacity check and the insert
//! can never interleave with another request.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Only panics on a poisoned lock

use chrono::{DateTime, Duration, Utc};
use studio_booking_core::capacity::{self, AdmissionCheck};
use studio_booking_core::lifecycle::{self, Transition};
use studio_booking_core::query::{self, MemberReservation, ReservationQuery, RosterEntry};
use studio_booking_core::store::{NewReservation, ReservationStore, SessionCatalog, StoreFuture};
use studio_booking_core::{
    BookingError, Capacity, ClassDefinition, ClassId, Member, MemberId, Reservation, ReservationId,
    ReservationStatus, Result, Session, SessionId, StoreError, TimeWindow,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Clone, Debug)]
struct SessionRecord {
    id: SessionId,
    class_id: ClassId,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    room: Option<String>,
    cancelled_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct State {
    members: HashMap<MemberId, Member>,
    classes: HashMap<ClassId, ClassDefinition>,
    sessions: HashMap<SessionId, SessionRecord>,
    reservations: HashMap<ReservationId, Reservation>,
    unavailable: bool,
}

impl State {
    fn check_available(&self) -> std::result::Result<(), StoreError> {
        if self.unavailable {
            return Err(StoreError::Unavailable("in-memory store switched off".to_string()));
        }
        Ok(())
    }

    fn session(&self, session_id: SessionId) -> Option<Session> {
        let record = self.sessions.get(&session_id)?;
        let class = self.classes.get(&record.class_id)?;
        Some(Session {
            id: record.id,
            class_id: class.id,
            class_name: class.name.clone(),
            capacity: class.capacity,
            starts_at: record.starts_at,
            ends_at: record.ends_at,
            room: record.room.clone(),
            cancelled: record.cancelled_at.is_some(),
            cancelled_at: record.cancelled_at,
            class_active: class.active,
        })
    }

    fn session_reservations(&self, session_id: SessionId) -> impl Iterator<Item = &Reservation> {
        self.reservations
            .values()
            .filter(move |reservation| reservation.session_id == session_id)
    }

    fn occupancy(&self, session_id: SessionId) -> u32 {
        capacity::occupancy(self.session_reservations(session_id).map(|r| &r.status))
    }
}

/// In-memory implementation of [`SessionCatalog`], [`ReservationStore`] and
/// [`ReservationQuery`].
///
/// # Example
///
/// ```
/// use studio_booking_testing::InMemoryBookingStore;
/// use chrono::Utc;
///
/// let store = InMemoryBookingStore::new();
/// let class = store.create_class("Spin", 12, 45);
/// let session = store.schedule_session(&class, Utc::now(), Some("Studio A"));
/// let member = store.register_member("Ada", "ada@example.com");
///
/// assert_eq!(session.capacity.seats(), 12);
/// assert!(member.active);
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryBookingStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryBookingStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an active class to the catalog.
    ///
    /// # Panics
    ///
    /// If `capacity` is zero.
    pub fn create_class(&self, name: &str, capacity: u32, duration_minutes: u32) -> ClassDefinition {
        let class = ClassDefinition {
            id: ClassId::new(),
            name: name.to_string(),
            capacity: Capacity::new(capacity).unwrap(),
            duration_minutes,
            active: true,
        };
        self.state
            .lock()
            .unwrap()
            .classes
            .insert(class.id, class.clone());
        class
    }

    /// Schedule a session of `class` starting at `starts_at`.
    ///
    /// # Panics
    ///
    /// If the class was not created in this store.
    pub fn schedule_session(
        &self,
        class: &ClassDefinition,
        starts_at: DateTime<Utc>,
        room: Option<&str>,
    ) -> Session {
        let record = SessionRecord {
            id: SessionId::new(),
            class_id: class.id,
            starts_at,
            ends_at: starts_at + Duration::minutes(i64::from(class.duration_minutes)),
            room: room.map(str::to_string),
            cancelled_at: None,
        };
        let mut state = self.state.lock().unwrap();
        state.sessions.insert(record.id, record.clone());
        state.session(record.id).unwrap()
    }

    /// Register an active member.
    pub fn register_member(&self, name: &str, email: &str) -> Member {
        let member = Member {
            id: MemberId::new(),
            name: name.to_string(),
            email: email.to_string(),
            active: true,
        };
        self.state
            .lock()
            .unwrap()
            .members
            .insert(member.id, member.clone());
        member
    }

    /// Activate or deactivate a member. Returns `false` if unknown.
    pub fn set_member_active(&self, member_id: MemberId, active: bool) -> bool {
        let mut state = self.state.lock().unwrap();
        state
            .members
            .get_mut(&member_id)
            .map(|member| member.active = active)
            .is_some()
    }

    /// Activate or deactivate a class. Returns `false` if unknown.
    pub fn set_class_active(&self, class_id: ClassId, active: bool) -> bool {
        let mut state = self.state.lock().unwrap();
        state
            .classes
            .get_mut(&class_id)
            .map(|class| class.active = active)
            .is_some()
    }

    /// Make every subsequent operation fail with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().unwrap().unavailable = unavailable;
    }

    /// Number of reservation rows, in every status.
    #[must_use]
    pub fn reservation_count(&self) -> usize {
        self.state.lock().unwrap().reservations.len()
    }

    /// All reservation rows of a session, in no particular order.
    #[must_use]
    pub fn reservations_for(&self, session_id: SessionId) -> Vec<Reservation> {
        self.state
            .lock()
            .unwrap()
            .session_reservations(session_id)
            .cloned()
            .collect()
    }

    fn admit_locked(&self, request: NewReservation) -> Result<Reservation> {
        let mut state = self.state.lock().unwrap();
        state.check_available()?;

        let session = state.session(request.session_id);
        let member_confirmed = state
            .session_reservations(request.session_id)
            .any(|r| r.member_id == request.member_id && r.status == ReservationStatus::Confirmed);

        AdmissionCheck {
            member_id: request.member_id,
            session_id: request.session_id,
            member: state.members.get(&request.member_id),
            session: session.as_ref(),
            occupancy: state.occupancy(request.session_id),
            member_confirmed,
        }
        .evaluate()?;

        let reservation = lifecycle::admit(
            request.id,
            request.member_id,
            request.session_id,
            request.created_at,
        );
        state.reservations.insert(reservation.id, reservation.clone());
        Ok(reservation)
    }

    fn transition_locked(
        &self,
        reservation_id: ReservationId,
        transition: Transition,
        at: DateTime<Utc>,
    ) -> Result<Reservation> {
        let mut state = self.state.lock().unwrap();
        state.check_available()?;

        let reservation = state
            .reservations
            .get_mut(&reservation_id)
            .ok_or(BookingError::ReservationNotFound(reservation_id))?;
        lifecycle::apply(reservation, transition, at)?;
        Ok(reservation.clone())
    }

    fn cancel_session_locked(&self, session_id: SessionId, at: DateTime<Utc>) -> Result<Session> {
        let mut state = self.state.lock().unwrap();
        state.check_available()?;

        let record = state
            .sessions
            .get_mut(&session_id)
            .ok_or(BookingError::SessionNotFound(session_id))?;
        if record.cancelled_at.is_some() {
            return Err(BookingError::SessionCancelled(session_id));
        }
        record.cancelled_at = Some(at);
        state
            .session(session_id)
            .ok_or(BookingError::SessionNotFound(session_id))
    }

    fn member_view(&self, member_id: MemberId, window: TimeWindow) -> Result<Vec<MemberReservation>> {
        let state = self.state.lock().unwrap();
        state.check_available()?;
        if !state.members.contains_key(&member_id) {
            return Err(BookingError::MemberNotFound(member_id));
        }

        let mut view: Vec<MemberReservation> = state
            .reservations
            .values()
            .filter(|reservation| reservation.member_id == member_id)
            .filter_map(|reservation| {
                let session = state.session(reservation.session_id)?;
                window.contains(session.starts_at).then(|| MemberReservation {
                    reservation: reservation.clone(),
                    class_name: session.class_name,
                    starts_at: session.starts_at,
                    ends_at: session.ends_at,
                    room: session.room,
                    session_cancelled: session.cancelled,
                })
            })
            .collect();
        query::sort_member_view(&mut view);
        Ok(view)
    }

    fn roster(&self, session_id: SessionId) -> Result<Vec<RosterEntry>> {
        let state = self.state.lock().unwrap();
        state.check_available()?;
        if !state.sessions.contains_key(&session_id) {
            return Err(BookingError::SessionNotFound(session_id));
        }

        let mut roster: Vec<RosterEntry> = state
            .session_reservations(session_id)
            .map(|reservation| RosterEntry {
                reservation_id: reservation.id,
                member_id: reservation.member_id,
                member_name: state
                    .members
                    .get(&reservation.member_id)
                    .map(|member| member.name.clone())
                    .unwrap_or_default(),
                status: reservation.status,
                created_at: reservation.created_at,
                updated_at: reservation.updated_at,
            })
            .collect();
        query::sort_roster(&mut roster);
        Ok(roster)
    }
}

impl SessionCatalog for InMemoryBookingStore {
    fn get_session(&self, session_id: SessionId) -> StoreFuture<'_, std::result::Result<Option<Session>, StoreError>> {
        Box::pin(async move {
            let state = self.state.lock().unwrap();
            state.check_available()?;
            Ok(state.session(session_id))
        })
    }

    fn cancel_session(&self, session_id: SessionId, at: DateTime<Utc>) -> StoreFuture<'_, Result<Session>> {
        Box::pin(async move { self.cancel_session_locked(session_id, at) })
    }
}

impl ReservationStore for InMemoryBookingStore {
    fn admit(&self, request: NewReservation) -> StoreFuture<'_, Result<Reservation>> {
        Box::pin(async move { self.admit_locked(request) })
    }

    fn transition(
        &self,
        reservation_id: ReservationId,
        transition: Transition,
        at: DateTime<Utc>,
    ) -> StoreFuture<'_, Result<Reservation>> {
        Box::pin(async move { self.transition_locked(reservation_id, transition, at) })
    }

    fn get_reservation(
        &self,
        reservation_id: ReservationId,
    ) -> StoreFuture<'_, std::result::Result<Option<Reservation>, StoreError>> {
        Box::pin(async move {
            let state = self.state.lock().unwrap();
            state.check_available()?;
            Ok(state.reservations.get(&reservation_id).cloned())
        })
    }

    fn occupancy(&self, session_id: SessionId) -> StoreFuture<'_, std::result::Result<u32, StoreError>> {
        Box::pin(async move {
            let state = self.state.lock().unwrap();
            state.check_available()?;
            Ok(state.occupancy(session_id))
        })
    }
}

impl ReservationQuery for InMemoryBookingStore {
    fn member_reservations(
        &self,
        member_id: MemberId,
        window: TimeWindow,
    ) -> StoreFuture<'_, Result<Vec<MemberReservation>>> {
        Box::pin(async move { self.member_view(member_id, window) })
    }

    fn session_roster(&self, session_id: SessionId) -> StoreFuture<'_, Result<Vec<RosterEntry>>> {
        Box::pin(async move { self.roster(session_id) })
    }
}
