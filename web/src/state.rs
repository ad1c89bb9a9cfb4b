//! Application state for booking handlers.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use studio_booking_core::BookingService;

/// Dependency check used by the readiness endpoint.
pub trait ReadinessProbe: Send + Sync {
    /// Name reported in the readiness body (e.g. `"database"`).
    fn name(&self) -> &'static str;

    /// Whether the dependency is reachable.
    fn check(&self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>>;
}

/// Probe that always reports ready. Used with the in-memory store.
#[derive(Clone, Copy, Debug, Default)]
pub struct AlwaysReady;

impl ReadinessProbe for AlwaysReady {
    fn name(&self) -> &'static str {
        "store"
    }

    fn check(&self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>> {
        Box::pin(async { true })
    }
}

/// Application state shared across all HTTP handlers.
///
/// Cloned for each request; everything inside is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Booking operations
    pub service: BookingService,

    /// Dependencies checked by `/ready`
    pub probes: Arc<[Arc<dyn ReadinessProbe>]>,
}

impl AppState {
    /// Create state with no readiness probes.
    #[must_use]
    pub fn new(service: BookingService) -> Self {
        Self {
            service,
            probes: Vec::new().into(),
        }
    }

    /// Replace the readiness probes.
    #[must_use]
    pub fn with_probes(mut self, probes: Vec<Arc<dyn ReadinessProbe>>) -> Self {
        self.probes = probes.into();
        self
    }
}
