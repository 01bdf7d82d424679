use crate::Event;

/// A trait for observing events that were delivered to the collection endpoint, e.g., to mirror
/// them into your own analytics.
pub trait EventLogger {
    /// Called once for every event that was sent successfully.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use attribution::{EventLogger, Event};
    /// struct MyEventLogger;
    ///
    /// impl EventLogger for MyEventLogger {
    ///     fn log_event(&self, event: &Event) {
    ///         // Forward the event here
    ///     }
    /// }
    /// ```
    ///
    /// # Notes
    ///
    /// This method is called before `send` returns, so it should not block the calling thread.
    /// It should not panic.
    fn log_event(&self, event: &Event);
}

pub(crate) struct NoopEventLogger;
impl EventLogger for NoopEventLogger {
    fn log_event(&self, _event: &Event) {}
}

impl<T: Fn(&Event)> EventLogger for T {
    fn log_event(&self, event: &Event) {
        self(event);
    }
}
