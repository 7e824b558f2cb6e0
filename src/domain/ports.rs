use crate::utils::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use thiserror::Error;

/// Raw outcome of one GET, before the fetcher applies its status rules.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// `None` for local contexts that carry no status line.
    pub status: Option<u16>,
    pub status_text: String,
    pub body: Bytes,
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),

    #[error("unsupported location: {0}")]
    Unsupported(String),

    #[error("could not read local file: {0}")]
    Local(#[from] std::io::Error),
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Issues one GET. `on_progress` receives cumulative byte counts.
    async fn get(
        &self,
        url: &str,
        on_progress: &mut (dyn FnMut(u64) + Send),
    ) -> std::result::Result<TransportResponse, TransportError>;
}

/// Where status text and progress end up. The loader never reads back.
pub trait DisplaySink: Send + Sync {
    fn set_status(&self, message: &str);

    fn set_progress(&self, percent: f64, error: bool);

    fn set_error(&self, headline: &str, detail: &str) {
        if detail.is_empty() {
            self.set_status(headline);
        } else {
            self.set_status(&format!("{}\n{}", headline, detail));
        }
    }
}

/// A synchronous throw from the initializer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct InitError(pub String);

pub type PrintHook = Box<dyn Fn(&str) + Send + Sync>;
pub type LocateHook = Box<dyn Fn(&str) -> String + Send + Sync>;
pub type SetupHook = Box<dyn FnOnce() + Send>;

/// Everything the external runtime receives at hand-off.
pub struct InitConfig {
    pub print: PrintHook,
    pub print_err: PrintHook,
    pub canvas: String,
    pub arguments: Vec<String>,
    pub module_binary: Bytes,
    pub locate_file: LocateHook,
    /// Run by the initializer once it starts consuming the data handle.
    pub pre_run: Vec<SetupHook>,
}

pub trait Initializer: Send + Sync {
    fn initialize(&self, config: InitConfig) -> std::result::Result<(), InitError>;
}

/// Capability discovery for the late-bound initializer.
pub trait InitializerResolver: Send + Sync {
    /// Receives the code resource once it has been fetched.
    fn install(&self, code: String);

    fn resolve(&self) -> Option<Arc<dyn Initializer>>;
}

pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}
