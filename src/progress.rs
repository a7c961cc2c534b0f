//! Progress-callback trait for per-stage extraction events.
//!
//! Inject an [`Arc<dyn ExtractionProgressCallback>`] via
//! [`crate::config::ExtractionConfigBuilder::progress_callback`] to receive
//! events as the orchestrator moves through its stages. The CLI uses this to
//! drive a spinner; a server could forward the same events to a log or a
//! websocket.
//!
//! # Example
//!
//! ```rust
//! use edgequake_docparse::{ExtractionConfig, ExtractionMode, ExtractionProgressCallback};
//! use std::sync::Arc;
//!
//! struct PrintMode;
//!
//! impl ExtractionProgressCallback for PrintMode {
//!     fn on_mode_selected(&self, mode: ExtractionMode) {
//!         eprintln!("using {mode} mode");
//!     }
//! }
//!
//! let config = ExtractionConfig::builder()
//!     .progress_callback(Arc::new(PrintMode) as Arc<dyn ExtractionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::output::ExtractionMode;
use std::sync::Arc;

/// Called by the orchestrator as it processes a document.
///
/// Implementations must be `Send + Sync`: one parser may serve many
/// documents concurrently. All methods default to no-ops.
pub trait ExtractionProgressCallback: Send + Sync {
    /// Called once the input has been validated.
    fn on_extraction_start(&self, filename: &str, size_bytes: usize, page_count: usize) {
        let _ = (filename, size_bytes, page_count);
    }

    /// Called when the text path fails and the vision fallback begins.
    fn on_fallback(&self, text_error: &str) {
        let _ = text_error;
    }

    /// Called once document content is ready in the given mode.
    fn on_mode_selected(&self, mode: ExtractionMode) {
        let _ = mode;
    }

    /// Called just before the prompt is sent to the model.
    fn on_request_sent(&self, model: &str) {
        let _ = model;
    }

    /// Called after the reply has been normalised.
    fn on_extraction_complete(&self, mode: ExtractionMode, duration_ms: u64) {
        let _ = (mode, duration_ms);
    }

    /// Called when the extraction terminates with an error.
    fn on_extraction_error(&self, error: &str) {
        let _ = error;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ExtractionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ExtractionConfig`].
pub type ProgressCallback = Arc<dyn ExtractionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingCallback {
        events: Mutex<Vec<String>>,
    }

    impl ExtractionProgressCallback for RecordingCallback {
        fn on_fallback(&self, text_error: &str) {
            self.events.lock().unwrap().push(format!("fallback:{text_error}"));
        }

        fn on_mode_selected(&self, mode: ExtractionMode) {
            self.events.lock().unwrap().push(format!("mode:{mode}"));
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_extraction_start("a.pdf", 10, 1);
        cb.on_fallback("no text");
        cb.on_mode_selected(ExtractionMode::Text);
        cb.on_request_sent("gpt-4o-mini");
        cb.on_extraction_complete(ExtractionMode::Text, 12);
        cb.on_extraction_error("boom");
    }

    #[test]
    fn overridden_methods_receive_events() {
        let cb = RecordingCallback::default();
        cb.on_request_sent("ignored");
        cb.on_fallback("No text could be extracted from the PDF");
        cb.on_mode_selected(ExtractionMode::Vision);
        let events = cb.events.lock().unwrap();
        assert_eq!(
            *events,
            vec![
                "fallback:No text could be extracted from the PDF".to_string(),
                "mode:vision".to_string()
            ]
        );
    }

    #[test]
    fn arc_dyn_callback_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn ExtractionProgressCallback>();
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_mode_selected(ExtractionMode::Text);
    }
}
