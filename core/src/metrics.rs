//! Booking metrics.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `booking_admissions_total{result}` - Admission attempts by outcome
//!   (`confirmed` or the rejection code, lowercased)
//! - `booking_transitions_total{transition,result}` - Lifecycle transitions
//! - `booking_sessions_cancelled_total` - Sessions called off
//!
//! ## Histograms
//! - `booking_admission_duration_seconds` - Time spent in the admission transaction

use crate::error::BookingError;
use crate::lifecycle::Transition;
use metrics::{describe_counter, describe_histogram};

/// Register metric descriptions.
///
/// Call once at startup, after the recorder is installed.
pub fn register_booking_metrics() {
    describe_counter!(
        "booking_admissions_total",
        "Total number of admission attempts by result"
    );
    describe_histogram!(
        "booking_admission_duration_seconds",
        "Time taken to run an admission against the store"
    );
    describe_counter!(
        "booking_transitions_total",
        "Total number of reservation lifecycle transitions by kind and result"
    );
    describe_counter!(
        "booking_sessions_cancelled_total",
        "Total number of sessions cancelled"
    );

    tracing::info!("Booking metrics registered");
}

// ============================================================================
// Metric Recording Functions
// ============================================================================

/// Metric label for a rejected operation.
fn rejection_label(error: &BookingError) -> &'static str {
    match error {
        BookingError::MemberNotFound(_)
        | BookingError::SessionNotFound(_)
        | BookingError::ReservationNotFound(_) => "not_found",
        BookingError::MemberInactive(_) | BookingError::ClassInactive(_) => "inactive",
        BookingError::SessionCancelled(_) => "cancelled",
        BookingError::AlreadyTerminal { .. } => "already_terminal",
        BookingError::NotConfirmed { .. } => "not_confirmed",
        BookingError::Duplicate { .. } => "duplicate",
        BookingError::Full { .. } => "full",
        BookingError::Store(_) => "store_error",
    }
}

/// Record an admission attempt.
///
/// # Arguments
///
/// * `result` - `Ok` for a confirmed reservation, or the rejection
/// * `duration_secs` - Time spent in the store
pub fn record_admission(result: Result<(), &BookingError>, duration_secs: f64) {
    let label = match result {
        Ok(()) => "confirmed",
        Err(error) => rejection_label(error),
    };
    metrics::counter!("booking_admissions_total", "result" => label).increment(1);
    metrics::histogram!("booking_admission_duration_seconds").record(duration_secs);
    tracing::debug!(result = label, duration_secs, "Recorded admission metric");
}

/// Record a lifecycle transition attempt.
pub fn record_transition(transition: Transition, result: Result<(), &BookingError>) {
    let label = match result {
        Ok(()) => "ok",
        Err(error) => rejection_label(error),
    };
    metrics::counter!(
        "booking_transitions_total",
        "transition" => transition.as_str(),
        "result" => label
    )
    .increment(1);
    tracing::debug!(transition = transition.as_str(), result = label, "Recorded transition metric");
}

/// Record a session cancellation.
pub fn record_session_cancelled() {
    metrics::counter!("booking_sessions_cancelled_total").increment(1);
    tracing::debug!("Recorded session_cancelled metric");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SessionId;

    #[test]
    fn rejection_labels_are_stable() {
        let full = BookingError::Full {
            session_id: SessionId::new(),
            capacity: 3,
        };
        assert_eq!(rejection_label(&full), "full");
        assert_eq!(
            rejection_label(&BookingError::SessionCancelled(SessionId::new())),
            "cancelled"
        );
    }

    #[test]
    fn recording_without_recorder_is_a_no_op() {
        register_booking_metrics();
        record_admission(Ok(()), 0.01);
        record_transition(Transition::Cancel, Ok(()));
        record_session_cancelled();
    }
}
