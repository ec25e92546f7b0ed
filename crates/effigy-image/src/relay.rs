use std::fmt;

use effigy_engine::{EventSink, Progress, Warning};

/// Boxed warning observer.
pub type WarningHandler = Box<dyn FnMut(&Warning) + Send>;

/// Boxed progress observer; return `false` to request cooperative
/// cancellation.
pub type ProgressHandler = Box<dyn FnMut(&Progress) -> bool + Send>;

/// Explicitly registered observers, handed to every engine call that can
/// emit events.
///
/// Registration is evaluated at each call site: there is no global wiring,
/// and a relay with no handlers behaves like
/// [`NullSink`](effigy_engine::NullSink). Handlers run synchronously on the
/// calling thread, inside the engine call that produced the event.
#[derive(Default)]
pub struct Relay {
    warning: Option<WarningHandler>,
    progress: Option<ProgressHandler>,
}

impl Relay {
    /// A relay with no observers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the warning observer, replacing any previous one.
    pub fn set_warning_handler(&mut self, handler: impl FnMut(&Warning) + Send + 'static) {
        self.warning = Some(Box::new(handler));
    }

    /// Registers the progress observer, replacing any previous one.
    pub fn set_progress_handler(
        &mut self,
        handler: impl FnMut(&Progress) -> bool + Send + 'static,
    ) {
        self.progress = Some(Box::new(handler));
    }

    /// Drops both observers.
    pub fn clear(&mut self) {
        self.warning = None;
        self.progress = None;
    }

    /// Whether any observer is registered.
    pub fn has_observers(&self) -> bool {
        self.warning.is_some() || self.progress.is_some()
    }
}

impl EventSink for Relay {
    fn warning(&mut self, warning: &Warning) {
        if let Some(handler) = self.warning.as_mut() {
            handler(warning);
        }
    }

    fn progress(&mut self, progress: &Progress) -> bool {
        match self.progress.as_mut() {
            Some(handler) => handler(progress),
            None => true,
        }
    }
}

impl fmt::Debug for Relay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Relay")
            .field("warning", &self.warning.is_some())
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[test]
    fn relay_without_observers_never_cancels() {
        let mut relay = Relay::new();
        let progress = Progress {
            origin: "read".into(),
            completed: 1,
            total: 4,
        };
        assert!(relay.progress(&progress));
        relay.warning(&Warning::new("ignored"));
    }

    #[test]
    fn registered_warning_handler_sees_each_event() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let mut relay = Relay::new();
        relay.set_warning_handler(move |warning| {
            sink.lock().unwrap().push(warning.message.clone());
        });

        relay.warning(&Warning::new("first"));
        relay.warning(&Warning::new("second"));
        assert_eq!(*seen.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn clear_unregisters_observers() {
        let mut relay = Relay::new();
        relay.set_progress_handler(|_| false);
        assert!(relay.has_observers());

        relay.clear();
        assert!(!relay.has_observers());
        let progress = Progress {
            origin: "write".into(),
            completed: 1,
            total: 1,
        };
        assert!(relay.progress(&progress));
    }
}
