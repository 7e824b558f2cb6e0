pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::cli::CliConfig;

pub use crate::adapters::{console::ConsoleDisplay, http::HttpTransport, storage::LocalStorage};
pub use crate::app::engine::{LoadOutcome, LoaderEngine};
pub use crate::config::{ConfigProvider, LoaderConfig};
pub use crate::core::orchestrator::LoadOrchestrator;
pub use crate::domain::model::{ResourceUrls, SessionReport, SessionState};
pub use crate::utils::error::{LoaderError, Result};
