use crate::core::classifier::ErrorClassifier;
use crate::core::progress::ProgressAggregator;
use crate::domain::ports::DisplaySink;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Couples classification with its side effects: display the error, force
/// progress into the failed state and flag the session as errored.
///
/// Shared with the initializer's hooks, which may fire after hand-off.
pub struct ErrorReporter {
    classifier: ErrorClassifier,
    display: Arc<dyn DisplaySink>,
    progress: Arc<ProgressAggregator>,
    errored: AtomicBool,
}

impl ErrorReporter {
    pub fn new(
        classifier: ErrorClassifier,
        display: Arc<dyn DisplaySink>,
        progress: Arc<ProgressAggregator>,
    ) -> Self {
        Self {
            classifier,
            display,
            progress,
            errored: AtomicBool::new(false),
        }
    }

    /// Reports `what`; an explicit non-empty `info` replaces the derived detail.
    /// Returns `true` if the message was surfaced.
    pub fn report(&self, what: &str, info: Option<&str>) -> bool {
        let classification = self.classifier.classify(what);
        if classification.suppressed {
            return false;
        }

        let detail = match info.map(str::trim) {
            Some(info) if !info.is_empty() => info.to_string(),
            _ => classification.detail,
        };

        tracing::warn!("{} {}", classification.headline, detail);
        self.errored.store(true, Ordering::SeqCst);
        self.display.set_error(&classification.headline, &detail);
        self.progress.fail();
        true
    }

    /// Handles a synchronous throw from the initializer.
    pub fn report_init_failure(&self, thrown: &str) -> bool {
        if self.classifier.is_fallback_in_progress(thrown) {
            tracing::debug!("Initializer fallback still running: {}", thrown);
            return false;
        }
        self.report("load wasm error", Some(thrown))
    }

    pub fn is_errored(&self) -> bool {
        self.errored.load(Ordering::SeqCst)
    }

    pub fn progress(&self) -> &ProgressAggregator {
        &self.progress
    }

    pub fn display(&self) -> &Arc<dyn DisplaySink> {
        &self.display
    }
}
