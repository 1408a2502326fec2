//! Telemetry utilities for event timing and log correlation.

use std::time::Instant;

/// Guard for timing host event handling and recording metrics.
///
/// Records latency when dropped.
pub struct EventTimer {
    event: &'static str,
    start: Instant,
}

impl EventTimer {
    /// Start timing an event.
    pub fn new(event: &'static str) -> Self {
        Self {
            event,
            start: Instant::now(),
        }
    }
}

impl Drop for EventTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        crate::metrics::record_event(self.event, duration);
    }
}

/// Standardized span constructors.
pub mod spans {
    use crate::host::ServerId;
    use tracing::{Span, info_span};

    /// Span for one host event.
    pub fn event(server_id: ServerId, event: &'static str) -> Span {
        info_span!("event", server_id = server_id, event = event)
    }

    /// Span for work on behalf of one user session.
    pub fn user(server_id: ServerId, session: u32, name: &str) -> Span {
        info_span!("user", server_id = server_id, session = session, user = %name)
    }
}
