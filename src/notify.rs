//! Notification sinks for human-readable progress and failure messages
//!
//! Notifiers are fire-and-forget: they return nothing and must not fail.

/// One-way sink for progress and failure messages
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// Emits messages as `info` tracing events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str) {
        tracing::info!(target: "catalog_harvest::notify", "{}", message);
    }
}

/// Prints messages to stdout
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, message: &str) {
        println!("{}", message);
    }
}
