use crate::domain::ports::DisplaySink;
use parking_lot::Mutex;
use std::io::Write;

/// Terminal rendering of the status line and progress.
///
/// Progress is only printed when the whole-number percentage moves, so a
/// stream of small chunks does not flood the terminal.
#[derive(Default)]
pub struct ConsoleDisplay {
    last_percent: Mutex<Option<(u32, bool)>>,
}

impl ConsoleDisplay {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DisplaySink for ConsoleDisplay {
    fn set_status(&self, message: &str) {
        if message.is_empty() {
            return;
        }
        println!("{}", message);
    }

    fn set_progress(&self, percent: f64, error: bool) {
        let whole = percent.floor() as u32;
        let mut last = self.last_percent.lock();
        if *last == Some((whole, error)) {
            return;
        }
        *last = Some((whole, error));

        let mut stdout = std::io::stdout().lock();
        if error {
            let _ = writeln!(stdout, "[{:>3}%] ✗", whole);
        } else {
            let _ = writeln!(stdout, "[{:>3}%]", whole);
        }
    }

    fn set_error(&self, headline: &str, detail: &str) {
        eprintln!("❌ {}", headline);
        let detail = detail.trim();
        if !detail.is_empty() {
            eprintln!("   {}", detail);
        }
    }
}
