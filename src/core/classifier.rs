use crate::utils::error::Result;
use regex::RegexSet;

/// Diagnostics the runtime prints while it tries its delivery strategies.
pub const DEFAULT_BENIGN_PATTERNS: &[&str] =
    &["^(trying binaryen method|binaryen method succeeded)"];

/// Wording of the throw the runtime raises while its own fallback is still running.
pub const DEFAULT_FALLBACK_PATTERNS: &[&str] = &["no binaryen method succeeded"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub suppressed: bool,
    pub headline: String,
    pub detail: String,
}

impl Classification {
    fn suppressed() -> Self {
        Self {
            suppressed: true,
            headline: String::new(),
            detail: String::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ErrorClassifier {
    benign: RegexSet,
    fallback: RegexSet,
}

impl ErrorClassifier {
    pub fn new<B, F>(benign_patterns: B, fallback_patterns: F) -> Result<Self>
    where
        B: IntoIterator,
        B::Item: AsRef<str>,
        F: IntoIterator,
        F::Item: AsRef<str>,
    {
        Ok(Self {
            benign: RegexSet::new(benign_patterns)?,
            fallback: RegexSet::new(fallback_patterns)?,
        })
    }

    pub fn classify(&self, raw_message: &str) -> Classification {
        let message = raw_message.trim();
        if self.benign.is_match(message) {
            tracing::debug!("Suppressed runtime diagnostic: {}", message);
            return Classification::suppressed();
        }

        let (headline, detail) = split_message(message);
        Classification {
            suppressed: false,
            headline: headline.to_string(),
            detail: detail.to_string(),
        }
    }

    /// True when an initializer throw only signals that its internal
    /// fallback is still in progress.
    pub fn is_fallback_in_progress(&self, thrown: &str) -> bool {
        self.fallback.is_match(thrown)
    }
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self {
            benign: RegexSet::new(DEFAULT_BENIGN_PATTERNS).unwrap_or_else(|_| RegexSet::empty()),
            fallback: RegexSet::new(DEFAULT_FALLBACK_PATTERNS)
                .unwrap_or_else(|_| RegexSet::empty()),
        }
    }
}

/// Splits at the first `:` or `.` past index 0.
fn split_message(message: &str) -> (&str, &str) {
    match message
        .char_indices()
        .skip(1)
        .find(|(_, c)| *c == ':' || *c == '.')
    {
        Some((at, _)) => (&message[..at], &message[at + 1..]),
        None => (message, ""),
    }
}
