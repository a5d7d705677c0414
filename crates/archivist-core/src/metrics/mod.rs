//! Metrics emitted through the `metrics` facade.
//!
//! No exporter is installed here; whichever recorder the embedding process
//! sets up receives the events, and without one they are dropped.

pub mod events;

/// Macro for emitting metric events (Vector-style pattern).
///
/// # Example
///
/// ```
/// use archivist_core::emit;
/// use archivist_core::metrics::events::IssueRecorded;
///
/// emit!(IssueRecorded {
///     reason: "quota_exceeded".into(),
///     count: 1,
///     bytes: 2048,
///     target: "nightly".into(),
/// });
/// ```
#[macro_export]
macro_rules! emit {
    ($event:expr) => {
        $crate::metrics::events::InternalEvent::emit($event)
    };
}
