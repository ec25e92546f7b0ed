//! Observer plumbing for the engine's out-of-band diagnostics channel.
//!
//! The engine reports two kinds of events while a call is in flight: warnings
//! (recoverable anomalies that must not abort the call) and progress reports
//! (periodic, cancellable). Both are delivered synchronously on the calling
//! thread through an [`EventSink`] passed explicitly into each entry point.
//! There is no global registration, so wiring is visible at every call site.

/// Severity attached to an engine diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    /// Recoverable anomaly; the operation keeps going.
    Warning,
    /// Unrecoverable for the current operation.
    Error,
    /// Unrecoverable and the engine state may be damaged.
    Fatal,
}

/// A non-fatal diagnostic reported by the engine during a call.
#[derive(Clone, Debug, PartialEq)]
pub struct Warning {
    /// The engine's diagnostic text, verbatim.
    pub message: String,
    /// Reported severity; always below fatal for this channel.
    pub severity: Severity,
}

impl Warning {
    /// Convenience constructor for a plain warning-severity event.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Warning,
        }
    }
}

/// A progress report emitted by the engine during a long-running call.
#[derive(Clone, Debug, PartialEq)]
pub struct Progress {
    /// Name of the operation reporting progress.
    pub origin: String,
    /// Work units finished so far.
    pub completed: u64,
    /// Total work units, zero when the engine cannot estimate.
    pub total: u64,
}

impl Progress {
    /// Completion as a percentage; 100 when the total is unknown.
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            self.completed as f64 / self.total as f64 * 100.0
        }
    }
}

/// Receiver for events emitted while an engine call is in flight.
///
/// Implementations run synchronously on the calling thread, inside the engine
/// call that produced the event.
pub trait EventSink {
    /// Called once per warning. Warnings never abort the operation that
    /// produced them.
    fn warning(&mut self, warning: &Warning);

    /// Called on every progress tick. Return `false` to request cooperative
    /// cancellation; the engine polls this result and stops with
    /// [`EngineError::Cancelled`](crate::EngineError::Cancelled).
    fn progress(&mut self, progress: &Progress) -> bool {
        let _ = progress;
        true
    }
}

/// Sink that ignores every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn warning(&mut self, _warning: &Warning) {}
}
