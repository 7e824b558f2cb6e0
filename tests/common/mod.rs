use parking_lot::Mutex;
use triad_loader::domain::ports::DisplaySink;

#[derive(Default)]
pub struct RecordingDisplay {
    pub statuses: Mutex<Vec<String>>,
    pub errors: Mutex<Vec<(String, String)>>,
    pub progress: Mutex<Vec<(f64, bool)>>,
}

impl RecordingDisplay {
    pub fn percents(&self) -> Vec<f64> {
        self.progress.lock().iter().map(|(p, _)| *p).collect()
    }

    pub fn any_error_state(&self) -> bool {
        self.progress.lock().iter().any(|(_, error)| *error)
    }
}

impl DisplaySink for RecordingDisplay {
    fn set_status(&self, message: &str) {
        self.statuses.lock().push(message.to_string());
    }

    fn set_progress(&self, percent: f64, error: bool) {
        self.progress.lock().push((percent, error));
    }

    fn set_error(&self, headline: &str, detail: &str) {
        self.errors.lock().push((headline.to_string(), detail.to_string()));
    }
}
