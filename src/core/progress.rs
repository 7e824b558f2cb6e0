use crate::domain::ports::DisplaySink;
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Default)]
struct ProgressState {
    running_total: u64,
    displayed: f64,
    failed: bool,
}

/// Folds byte deltas from every active fetch into one percentage.
///
/// The displayed value is clamped to `[0, 100]` and never goes down within a
/// session. After [`fail`](Self::fail) it stays pinned at 100 in error state.
pub struct ProgressAggregator {
    total_size: u64,
    display: Arc<dyn DisplaySink>,
    state: Mutex<ProgressState>,
}

impl ProgressAggregator {
    pub fn new(total_size: u64, display: Arc<dyn DisplaySink>) -> Self {
        Self {
            total_size,
            display,
            state: Mutex::new(ProgressState::default()),
        }
    }

    pub fn record_progress(&self, delta_bytes: u64) {
        let mut state = self.state.lock();
        if state.failed {
            return;
        }
        state.running_total = state.running_total.saturating_add(delta_bytes);

        let percent = percentage(state.running_total, self.total_size);
        if percent > state.displayed {
            state.displayed = percent;
        }
        self.display.set_progress(state.displayed, false);
    }

    pub fn reset(&self) {
        let mut state = self.state.lock();
        *state = ProgressState::default();
        self.display.set_progress(0.0, false);
    }

    pub fn fail(&self) {
        let mut state = self.state.lock();
        state.failed = true;
        state.displayed = 100.0;
        self.display.set_progress(100.0, true);
    }

    pub fn running_total(&self) -> u64 {
        self.state.lock().running_total
    }

    pub fn displayed(&self) -> f64 {
        self.state.lock().displayed
    }
}

fn percentage(running_total: u64, total_size: u64) -> f64 {
    if total_size == 0 {
        return if running_total > 0 { 100.0 } else { 0.0 };
    }
    (running_total as f64 / total_size as f64 * 100.0).clamp(0.0, 100.0)
}
