//! # Studio Booking Testing
//!
//! Testing utilities for the booking core.
//!
//! This crate provides:
//! - [`InMemoryBookingStore`]: every storage contract behind one mutex
//! - [`FixedClock`] / [`test_clock`]: deterministic time
//! - [`RecordingEventSink`]: captures published booking events
//!
//! ## Example
//!
//! ```ignore
//! use studio_booking_testing::{InMemoryBookingStore, test_clock};
//! use studio_booking_core::BookingService;
//! use std::sync::Arc;
//!
//! #[tokio::test]
//! async fn books_a_seat() {
//!     let store = Arc::new(InMemoryBookingStore::new());
//!     let class = store.create_class("Spin", 1, 45);
//!     let session = store.schedule_session(&class, Utc::now(), None);
//!     let member = store.register_member("Ada", "ada@example.com");
//!
//!     let service = BookingService::new(store).with_clock(Arc::new(test_clock()));
//!     service.request_reservation(member.id, session.id).await.unwrap();
//! }
//! ```

pub mod store;

use chrono::{DateTime, Utc};
use studio_booking_core::environment::Clock;

/// Mock implementations of injected dependencies.
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use std::sync::{Arc, Mutex};
    use studio_booking_core::events::{BookingEvent, BookingEventSink, PublishError};
    use studio_booking_core::store::StoreFuture;

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use studio_booking_testing::mocks::FixedClock;
    /// use studio_booking_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }

    /// Event sink that keeps every published event, optionally failing.
    #[derive(Debug, Clone, Default)]
    pub struct RecordingEventSink {
        events: Arc<Mutex<Vec<BookingEvent>>>,
        failing: bool,
    }

    impl RecordingEventSink {
        /// Create a sink that accepts every event
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Create a sink that rejects every event (nothing is recorded)
        #[must_use]
        pub fn failing() -> Self {
            Self {
                events: Arc::default(),
                failing: true,
            }
        }

        /// Events published so far, in order
        ///
        /// # Panics
        ///
        /// If the internal lock is poisoned.
        #[must_use]
        #[allow(clippy::unwrap_used)]
        pub fn events(&self) -> Vec<BookingEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    impl BookingEventSink for RecordingEventSink {
        #[allow(clippy::unwrap_used)]
        fn publish(&self, event: BookingEvent) -> StoreFuture<'_, Result<(), PublishError>> {
            Box::pin(async move {
                if self.failing {
                    return Err(PublishError::Transport("sink is failing".to_string()));
                }
                self.events.lock().unwrap().push(event);
                Ok(())
            })
        }
    }
}

/// Test helpers for concurrency scenarios.
pub mod helpers {
    use futures::future::join_all;
    use std::future::Future;
    use std::sync::Arc;
    use tokio::sync::Barrier;

    /// Run `count` copies of `task` on separate tokio tasks, released together.
    ///
    /// Each task receives its index. Results come back in index order.
    ///
    /// # Panics
    ///
    /// If any task panics.
    #[allow(clippy::unwrap_used)]
    pub async fn run_concurrently<F, Fut, T>(count: usize, task: F) -> Vec<T>
    where
        F: Fn(usize) -> Fut,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let barrier = Arc::new(Barrier::new(count));
        let handles = (0..count).map(|index| {
            let barrier = Arc::clone(&barrier);
            let work = task(index);
            tokio::spawn(async move {
                barrier.wait().await;
                work.await
            })
        });

        join_all(handles)
            .await
            .into_iter()
            .map(|joined| joined.unwrap())
            .collect()
    }
}

// Re-export commonly used items
pub use helpers::run_concurrently;
pub use mocks::{FixedClock, RecordingEventSink, test_clock};
pub use store::InMemoryBookingStore;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        assert_eq!(clock.now(), clock.now());
        assert_eq!(clock.now().to_rfc3339(), "2025-01-01T00:00:00+00:00");
    }
}
