use crate::core::classifier::ErrorClassifier;
use crate::core::fetcher::ResourceFetcher;
use crate::core::handle::HandleRegistry;
use crate::core::progress::ProgressAggregator;
use crate::core::reporter::ErrorReporter;
use crate::core::session::{RuntimeOptions, Session};
use crate::domain::model::{FetchResult, ResourceKind, ResourceUrls, SessionReport};
use crate::domain::ports::{DisplaySink, InitializerResolver, Transport};
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug)]
enum FetchEvent {
    Progress { kind: ResourceKind, loaded: u64 },
    Done { kind: ResourceKind, result: FetchResult },
}

/// Runs one load session: three concurrent fetches feeding a single event
/// loop that owns the [`Session`] state.
pub struct LoadOrchestrator {
    transport: Arc<dyn Transport>,
    display: Arc<dyn DisplaySink>,
    resolver: Arc<dyn InitializerResolver>,
    registry: Arc<HandleRegistry>,
    classifier: ErrorClassifier,
    options: RuntimeOptions,
}

impl LoadOrchestrator {
    pub fn new(
        transport: Arc<dyn Transport>,
        display: Arc<dyn DisplaySink>,
        resolver: Arc<dyn InitializerResolver>,
    ) -> Self {
        Self {
            transport,
            display,
            resolver,
            registry: HandleRegistry::new(),
            classifier: ErrorClassifier::default(),
            options: RuntimeOptions::default(),
        }
    }

    pub fn with_classifier(mut self, classifier: ErrorClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_runtime_options(mut self, options: RuntimeOptions) -> Self {
        self.options = options;
        self
    }

    /// Shares a handle registry with a runtime that needs to read blobs back.
    pub fn with_registry(mut self, registry: Arc<HandleRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Starts the session and resolves once every fetch has reported.
    /// Failures end up on the display sink and in the report, never as `Err`.
    pub async fn start(self, urls: ResourceUrls, total_size: u64) -> SessionReport {
        let progress = Arc::new(ProgressAggregator::new(total_size, Arc::clone(&self.display)));
        let reporter = Arc::new(ErrorReporter::new(
            self.classifier,
            Arc::clone(&self.display),
            progress,
        ));
        let mut session = Session::new(
            urls.clone(),
            reporter,
            self.resolver,
            self.registry,
            self.options,
        );

        tracing::info!(
            "Starting load session: js={} data={} wasm={} total_size={}",
            urls.js,
            urls.data,
            urls.wasm,
            total_size
        );
        session.begin();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let fetcher = ResourceFetcher::new(self.transport);
        for kind in ResourceKind::ALL {
            let request = urls.request_for(kind);
            let fetcher = fetcher.clone();
            let progress_tx = tx.clone();
            let done_tx = tx.clone();
            tokio::spawn(async move {
                fetcher
                    .fetch(
                        request,
                        move |loaded| {
                            let _ = progress_tx.send(FetchEvent::Progress { kind, loaded });
                        },
                        move |result| {
                            let _ = done_tx.send(FetchEvent::Done { kind, result });
                        },
                    )
                    .await;
            });
        }
        drop(tx);

        while let Some(event) = rx.recv().await {
            match event {
                FetchEvent::Progress { kind, loaded } => session.on_progress(kind, loaded),
                FetchEvent::Done { kind, result } => session.on_complete(kind, result),
            }
        }

        let report = session.report();
        tracing::info!(
            "Load session finished: state={:?} handed_off={} bytes={} ({:.1}%)",
            report.state,
            report.handed_off,
            report.bytes_seen,
            report.percent
        );
        report
    }
}
