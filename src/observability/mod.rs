//! Observability for change application and persistence
//!
//! - Structured logging (JSON lines)
//! - Deterministic counters
//! - Begin/complete tracing for CLI operations
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on execution
//! 3. No background threads
//! 4. Deterministic output
//!
//! # Usage
//!
//! ```ignore
//! use rowsplice::observability::{Logger, MetricsRegistry, ObservationScope};
//!
//! Logger::info("CHANGE_APPLIED", &[("rows", "42")]);
//!
//! let metrics = MetricsRegistry::new();
//! metrics.increment_reverted();
//!
//! let scope = ObservationScope::new("APPLY");
//! // ... do work ...
//! scope.complete();
//! ```

mod events;
mod logger;
mod metrics;
mod scope;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};
pub use scope::{ObservationScope, Timer};

fn severity_of(event: Event) -> Severity {
    if event.is_fatal() {
        Severity::Fatal
    } else if event.is_warning() {
        Severity::Warn
    } else {
        Severity::Info
    }
}

/// Log a lifecycle event
pub fn log_event(event: Event) {
    log_event_with_fields(event, &[]);
}

/// Log a lifecycle event with fields
///
/// Fatal events go to stderr.
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    let severity = severity_of(event);
    if severity == Severity::Fatal {
        Logger::log_stderr(severity, event.as_str(), fields);
    } else {
        Logger::log(severity, event.as_str(), fields);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_of_event() {
        assert_eq!(severity_of(Event::ChangeApplied), Severity::Info);
        assert_eq!(severity_of(Event::ChangeContractViolated), Severity::Fatal);
    }

    #[test]
    fn test_log_event() {
        log_event(Event::HistoryUndo);
        log_event(Event::HistoryRedo);
    }

    #[test]
    fn test_log_event_with_fields() {
        log_event_with_fields(Event::ConfigLoaded, &[("path", "/tmp/rowsplice.json")]);
    }
}
