use crate::core::handle::HandleRegistry;
use crate::domain::ports::{InitConfig, InitError, Initializer, InitializerResolver, Storage};
use crate::utils::error::{LoaderError, Result};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task::JoinHandle;

pub const CODE_FILE: &str = "runtime.js";
pub const MODULE_FILE: &str = "module.wasm";
pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedFile {
    pub name: String,
    pub bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagingManifest {
    pub canvas: String,
    pub arguments: Vec<String>,
    pub files: Vec<StagedFile>,
    pub staged_at: DateTime<Utc>,
}

/// Runtime used by the CLI: writes the three resources out through a
/// [`Storage`] instead of executing them.
pub struct StagingRuntime<S: Storage + Clone + 'static> {
    storage: S,
    registry: Arc<HandleRegistry>,
    data_file_name: String,
    code: Mutex<Option<String>>,
    task: Mutex<Option<JoinHandle<Result<StagingManifest>>>>,
}

impl<S: Storage + Clone + 'static> StagingRuntime<S> {
    pub fn new(storage: S, registry: Arc<HandleRegistry>, data_file_name: String) -> Arc<Self> {
        Arc::new(Self {
            storage,
            registry,
            data_file_name,
            code: Mutex::new(None),
            task: Mutex::new(None),
        })
    }

    /// Waits for the background write started by the hand-off, if any.
    pub async fn finish(&self) -> Option<Result<StagingManifest>> {
        let task = self.task.lock().take()?;
        Some(match task.await {
            Ok(result) => result,
            Err(e) => Err(LoaderError::StagingError {
                message: e.to_string(),
            }),
        })
    }
}

impl<S: Storage + Clone + 'static> Initializer for StagingRuntime<S> {
    fn initialize(&self, config: InitConfig) -> std::result::Result<(), InitError> {
        let code = self
            .code
            .lock()
            .take()
            .ok_or_else(|| InitError("runtime code was never installed".to_string()))?;

        let data_url = (config.locate_file)(&self.data_file_name);
        let data = self
            .registry
            .open(&data_url)
            .ok_or_else(|| InitError(format!("could not locate {}", self.data_file_name)))?;

        // 資料已讀出，釋放暫時位置
        for hook in config.pre_run {
            hook();
        }

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| InitError(format!("no async runtime: {}", e)))?;

        (config.print)("staging resources ...");

        let storage = self.storage.clone();
        let data_file_name = self.data_file_name.clone();
        let canvas = config.canvas;
        let arguments = config.arguments;
        let module_binary = config.module_binary;
        let print = config.print;
        let print_err = config.print_err;

        let task = runtime.spawn(async move {
            let result = write_artifacts(
                &storage,
                Bytes::from(code),
                (data_file_name, data),
                module_binary,
                canvas,
                arguments,
            )
            .await;
            match &result {
                Ok(manifest) => print(&format!("staged {} files", manifest.files.len())),
                Err(e) => print_err(&format!("staging failed: {}", e)),
            }
            result
        });
        *self.task.lock() = Some(task);
        Ok(())
    }
}

async fn write_artifacts<S: Storage>(
    storage: &S,
    code: Bytes,
    data: (String, Bytes),
    module_binary: Bytes,
    canvas: String,
    arguments: Vec<String>,
) -> Result<StagingManifest> {
    let (data_file_name, data) = data;
    let mut files = Vec::with_capacity(3);
    for (name, bytes) in [
        (CODE_FILE.to_string(), code),
        (data_file_name, data),
        (MODULE_FILE.to_string(), module_binary),
    ] {
        storage.write_file(&name, &bytes).await?;
        tracing::debug!("Staged {} ({} bytes)", name, bytes.len());
        files.push(StagedFile {
            name,
            bytes: bytes.len(),
        });
    }

    let manifest = StagingManifest {
        canvas,
        arguments,
        files,
        staged_at: Utc::now(),
    };
    storage
        .write_file(MANIFEST_FILE, serde_json::to_string_pretty(&manifest)?.as_bytes())
        .await?;
    Ok(manifest)
}

/// Makes the staging runtime discoverable once the code resource arrived.
pub struct StagingResolver<S: Storage + Clone + 'static> {
    runtime: Arc<StagingRuntime<S>>,
}

impl<S: Storage + Clone + 'static> StagingResolver<S> {
    pub fn new(runtime: Arc<StagingRuntime<S>>) -> Self {
        Self { runtime }
    }
}

impl<S: Storage + Clone + 'static> InitializerResolver for StagingResolver<S> {
    fn install(&self, code: String) {
        tracing::debug!("Installing runtime code ({} bytes)", code.len());
        *self.runtime.code.lock() = Some(code);
    }

    fn resolve(&self) -> Option<Arc<dyn Initializer>> {
        if self.runtime.code.lock().is_some() {
            Some(self.runtime.clone() as Arc<dyn Initializer>)
        } else {
            None
        }
    }
}
