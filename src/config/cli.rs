use crate::config::toml_config::{LoaderConfig, ResourcesConfig};
use crate::utils::error::Result;
use crate::utils::validation::validate_required_field;
use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "triad-loader")]
#[command(about = "Fetches a runtime's code, data and module concurrently and hands them off")]
pub struct CliConfig {
    /// URL of the code resource
    #[arg(long)]
    pub js: Option<String>,

    /// URL of the data blob
    #[arg(long)]
    pub data: Option<String>,

    /// URL of the binary module
    #[arg(long)]
    pub wasm: Option<String>,

    /// Combined size of the three resources, used for the progress display
    #[arg(long)]
    pub total_size: Option<u64>,

    /// Directory the staged resources are written to
    #[arg(short, long)]
    pub output: Option<String>,

    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log memory usage around the hand-off")]
    pub monitor: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub log_json: bool,
}

impl CliConfig {
    /// 合併設定檔與命令列參數；命令列優先
    pub fn into_loader_config(self) -> Result<LoaderConfig> {
        let mut config = match &self.config {
            Some(path) => LoaderConfig::from_file(path)?,
            None => LoaderConfig::new(ResourcesConfig {
                js: validate_required_field("js", &self.js)?.clone(),
                data: validate_required_field("data", &self.data)?.clone(),
                wasm: validate_required_field("wasm", &self.wasm)?.clone(),
                total_size: *validate_required_field("total_size", &self.total_size)?,
            }),
        };

        if let Some(js) = self.js {
            config.resources.js = js;
        }
        if let Some(data) = self.data {
            config.resources.data = data;
        }
        if let Some(wasm) = self.wasm {
            config.resources.wasm = wasm;
        }
        if let Some(total_size) = self.total_size {
            config.resources.total_size = total_size;
        }
        if let Some(output) = self.output {
            config.runtime_mut().output_path = Some(output);
        }
        if self.monitor {
            config.set_monitoring(true);
        }

        Ok(config)
    }
}
