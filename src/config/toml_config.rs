use crate::config::ConfigProvider;
use crate::core::classifier::{DEFAULT_BENIGN_PATTERNS, DEFAULT_FALLBACK_PATTERNS};
use crate::core::session::RuntimeOptions;
use crate::domain::model::ResourceUrls;
use crate::utils::error::{LoaderError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_OUTPUT_PATH: &str = "./staged";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    pub resources: ResourcesConfig,
    pub runtime: Option<RuntimeConfig>,
    pub transport: Option<TransportConfig>,
    pub diagnostics: Option<DiagnosticsConfig>,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourcesConfig {
    pub js: String,
    pub data: String,
    pub wasm: String,
    pub total_size: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub data_file_name: Option<String>,
    pub canvas: Option<String>,
    pub arguments: Option<Vec<String>>,
    pub output_path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransportConfig {
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiagnosticsConfig {
    pub benign_patterns: Option<Vec<String>>,
    pub fallback_patterns: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

impl LoaderConfig {
    pub fn new(resources: ResourcesConfig) -> Self {
        Self {
            resources,
            runtime: None,
            transport: None,
            diagnostics: None,
            monitoring: None,
        }
    }

    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(LoaderError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| LoaderError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${ASSET_HOST})
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}")?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn runtime_mut(&mut self) -> &mut RuntimeConfig {
        self.runtime.get_or_insert_with(RuntimeConfig::default)
    }

    pub fn set_monitoring(&mut self, enabled: bool) {
        self.monitoring = Some(MonitoringConfig { enabled });
    }

    fn validate_config(&self) -> Result<()> {
        validation::validate_resource_url("resources.js", &self.resources.js)?;
        validation::validate_resource_url("resources.data", &self.resources.data)?;
        validation::validate_resource_url("resources.wasm", &self.resources.wasm)?;
        validation::validate_positive_number("resources.total_size", self.resources.total_size, 1)?;
        validation::validate_path("runtime.output_path", self.output_path())?;

        if let Some(runtime) = &self.runtime {
            if let Some(name) = &runtime.data_file_name {
                validation::validate_file_name("runtime.data_file_name", name)?;
            }
        }

        validation::validate_patterns("diagnostics.benign_patterns", &self.benign_patterns())?;
        validation::validate_patterns("diagnostics.fallback_patterns", &self.fallback_patterns())?;

        if let Some(timeout) = self.transport.as_ref().and_then(|t| t.timeout_seconds) {
            validation::validate_positive_number("transport.timeout_seconds", timeout, 1)?;
        }

        Ok(())
    }
}

impl ConfigProvider for LoaderConfig {
    fn resource_urls(&self) -> ResourceUrls {
        ResourceUrls {
            js: self.resources.js.clone(),
            data: self.resources.data.clone(),
            wasm: self.resources.wasm.clone(),
        }
    }

    fn total_size(&self) -> u64 {
        self.resources.total_size
    }

    fn output_path(&self) -> &str {
        self.runtime
            .as_ref()
            .and_then(|r| r.output_path.as_deref())
            .unwrap_or(DEFAULT_OUTPUT_PATH)
    }

    fn runtime_options(&self) -> RuntimeOptions {
        let defaults = RuntimeOptions::default();
        match &self.runtime {
            Some(runtime) => RuntimeOptions {
                data_file_name: runtime
                    .data_file_name
                    .clone()
                    .unwrap_or(defaults.data_file_name),
                canvas: runtime.canvas.clone().unwrap_or(defaults.canvas),
                arguments: runtime.arguments.clone().unwrap_or(defaults.arguments),
            },
            None => defaults,
        }
    }

    fn request_timeout(&self) -> Option<Duration> {
        self.transport
            .as_ref()
            .and_then(|t| t.timeout_seconds)
            .map(Duration::from_secs)
    }

    fn benign_patterns(&self) -> Vec<String> {
        self.diagnostics
            .as_ref()
            .and_then(|d| d.benign_patterns.clone())
            .unwrap_or_else(|| DEFAULT_BENIGN_PATTERNS.iter().map(|p| p.to_string()).collect())
    }

    fn fallback_patterns(&self) -> Vec<String> {
        self.diagnostics
            .as_ref()
            .and_then(|d| d.fallback_patterns.clone())
            .unwrap_or_else(|| DEFAULT_FALLBACK_PATTERNS.iter().map(|p| p.to_string()).collect())
    }

    fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }
}

impl Validate for LoaderConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
