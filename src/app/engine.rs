use crate::adapters::console::ConsoleDisplay;
use crate::adapters::http::HttpTransport;
use crate::adapters::staging::{StagingManifest, StagingResolver, StagingRuntime};
use crate::adapters::storage::LocalStorage;
use crate::config::ConfigProvider;
use crate::core::handle::HandleRegistry;
use crate::core::orchestrator::LoadOrchestrator;
use crate::domain::model::SessionReport;
use crate::domain::ports::DisplaySink;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub report: SessionReport,
    /// Present when the hand-off happened and staging finished.
    pub manifest: Option<StagingManifest>,
}

/// Wires the HTTP transport, a display and the staging runtime into one
/// load session.
pub struct LoaderEngine<C: ConfigProvider> {
    config: C,
    display: Arc<dyn DisplaySink>,
    monitor: SystemMonitor,
}

impl<C: ConfigProvider> LoaderEngine<C> {
    pub fn new(config: C) -> Self {
        Self::new_with_monitoring(config, false)
    }

    pub fn new_with_monitoring(config: C, monitor_enabled: bool) -> Self {
        Self {
            config,
            display: Arc::new(ConsoleDisplay::new()),
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub fn with_display(mut self, display: Arc<dyn DisplaySink>) -> Self {
        self.display = display;
        self
    }

    pub async fn run(&self) -> Result<LoadOutcome> {
        let classifier = self.config.classifier()?;
        let transport = HttpTransport::with_timeout(self.config.request_timeout())?;
        let options = self.config.runtime_options();

        let registry = HandleRegistry::new();
        let storage = LocalStorage::new(self.config.output_path().to_string());
        let runtime = StagingRuntime::new(storage, registry.clone(), options.data_file_name.clone());
        let resolver = StagingResolver::new(runtime.clone());

        let orchestrator = LoadOrchestrator::new(
            Arc::new(transport),
            Arc::clone(&self.display),
            Arc::new(resolver),
        )
        .with_classifier(classifier)
        .with_runtime_options(options)
        .with_registry(registry);

        self.monitor.log_stats("Session start");
        let report = orchestrator
            .start(self.config.resource_urls(), self.config.total_size())
            .await;

        let manifest = match runtime.finish().await {
            Some(result) => Some(result?),
            None => None,
        };
        self.monitor.log_stats("After hand-off");

        Ok(LoadOutcome { report, manifest })
    }
}
