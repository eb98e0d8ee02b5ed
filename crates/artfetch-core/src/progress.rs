//! Progress reporting abstraction for long-running transfers.
//!
//! This module provides a trait-based progress reporting system so the CLI
//! (or any other adapter) can receive byte-count updates without the library
//! crates coupling to a terminal UI. Components take a `&dyn
//! ProgressReporter`; there is no ambient global reporter.

/// Trait for receiving progress updates during long-running operations.
///
/// Implementors can display progress bars, update UI elements, or simply
/// ignore the updates ([`NoopProgress`]).
pub trait ProgressReporter: Send + Sync {
    /// Called when a transfer/operation starts.
    ///
    /// `total` is the declared size if known. Implementations should treat
    /// `None` as indeterminate and render accordingly (the two modes are
    /// observable behavior, not cosmetics).
    fn start(&self, message: &str, total: Option<u64>);

    /// Called to update progress with the current byte count.
    fn update(&self, current: u64, total: Option<u64>);

    /// Called to surface a line of diagnostic output during the operation
    /// (for example an external encoder's progress line).
    fn message(&self, msg: &str);

    /// Called when the operation completes successfully.
    fn finish(&self, message: &str);

    /// Called when the operation fails.
    fn finish_with_error(&self, message: &str);
}

/// A no-op progress reporter that ignores all updates.
///
/// Use this when progress reporting is not needed (e.g., in tests or when
/// running headless).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn start(&self, _message: &str, _total: Option<u64>) {}
    fn update(&self, _current: u64, _total: Option<u64>) {}
    fn message(&self, _msg: &str) {}
    fn finish(&self, _message: &str) {}
    fn finish_with_error(&self, _message: &str) {}
}

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils {
    //! A reporter that records every call, for assertions in crate tests.

    use std::sync::Mutex;

    use super::ProgressReporter;

    /// One recorded reporter call.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum ProgressEvent {
        Started { message: String, total: Option<u64> },
        Updated { current: u64, total: Option<u64> },
        Message(String),
        Finished(String),
        Failed(String),
    }

    /// Records all reporter calls in order.
    #[derive(Debug, Default)]
    pub struct RecordingReporter {
        events: Mutex<Vec<ProgressEvent>>,
    }

    impl RecordingReporter {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Snapshot of the recorded events.
        pub fn events(&self) -> Vec<ProgressEvent> {
            self.events.lock().unwrap().clone()
        }

        fn push(&self, event: ProgressEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    impl ProgressReporter for RecordingReporter {
        fn start(&self, message: &str, total: Option<u64>) {
            self.push(ProgressEvent::Started {
                message: message.to_string(),
                total,
            });
        }

        fn update(&self, current: u64, total: Option<u64>) {
            self.push(ProgressEvent::Updated { current, total });
        }

        fn message(&self, msg: &str) {
            self.push(ProgressEvent::Message(msg.to_string()));
        }

        fn finish(&self, message: &str) {
            self.push(ProgressEvent::Finished(message.to_string()));
        }

        fn finish_with_error(&self, message: &str) {
            self.push(ProgressEvent::Failed(message.to_string()));
        }
    }
}
