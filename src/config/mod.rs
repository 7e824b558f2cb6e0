#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::core::classifier::ErrorClassifier;
use crate::core::session::RuntimeOptions;
use crate::domain::model::ResourceUrls;
use crate::utils::error::Result;
use std::time::Duration;

pub use toml_config::LoaderConfig;

pub trait ConfigProvider: Send + Sync {
    fn resource_urls(&self) -> ResourceUrls;
    fn total_size(&self) -> u64;
    fn output_path(&self) -> &str;
    fn runtime_options(&self) -> RuntimeOptions;
    fn request_timeout(&self) -> Option<Duration>;
    fn benign_patterns(&self) -> Vec<String>;
    fn fallback_patterns(&self) -> Vec<String>;
    fn monitoring_enabled(&self) -> bool;

    fn classifier(&self) -> Result<ErrorClassifier> {
        ErrorClassifier::new(self.benign_patterns(), self.fallback_patterns())
    }
}
