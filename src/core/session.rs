use crate::core::handle::HandleRegistry;
use crate::core::reporter::ErrorReporter;
use crate::domain::model::{
    FetchResult, LoadState, Payload, ResourceKind, ResourceUrls, SessionReport, SessionState,
};
use crate::domain::ports::{InitConfig, InitializerResolver, SetupHook};
use bytes::Bytes;
use std::sync::Arc;

pub const STATUS_LOADING: &str = "loading ...";
pub const STATUS_RUNNING: &str = "running ...";

/// What the runtime is told besides the resources themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeOptions {
    /// Logical file name the runtime asks for when it wants the data blob.
    pub data_file_name: String,
    pub canvas: String,
    pub arguments: Vec<String>,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            data_file_name: "deus.data".to_string(),
            canvas: "view".to_string(),
            arguments: vec!["view".to_string()],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GuardState {
    Armed,
    Consumed,
    Blocked,
}

/// Single-use token for the hand-off.
#[derive(Debug)]
pub struct HandoffGuard {
    state: GuardState,
}

impl HandoffGuard {
    pub fn new() -> Self {
        Self {
            state: GuardState::Armed,
        }
    }

    /// Returns `true` exactly once, and never after [`block`](Self::block).
    pub fn consume(&mut self) -> bool {
        if self.state == GuardState::Armed {
            self.state = GuardState::Consumed;
            true
        } else {
            false
        }
    }

    pub fn block(&mut self) {
        if self.state == GuardState::Armed {
            self.state = GuardState::Blocked;
        }
    }

    pub fn is_consumed(&self) -> bool {
        self.state == GuardState::Consumed
    }

    pub fn is_armed(&self) -> bool {
        self.state == GuardState::Armed
    }
}

impl Default for HandoffGuard {
    fn default() -> Self {
        Self::new()
    }
}

/// The per-session state machine. Every event goes through one of the
/// `on_*` methods; completions end in [`attempt_handoff`](Self::attempt_handoff),
/// progress only feeds the aggregator.
pub struct Session {
    urls: ResourceUrls,
    states: [LoadState; 3],
    loaded: [u64; 3],
    guard: HandoffGuard,
    reporter: Arc<ErrorReporter>,
    resolver: Arc<dyn InitializerResolver>,
    registry: Arc<HandleRegistry>,
    options: RuntimeOptions,
}

impl Session {
    pub fn new(
        urls: ResourceUrls,
        reporter: Arc<ErrorReporter>,
        resolver: Arc<dyn InitializerResolver>,
        registry: Arc<HandleRegistry>,
        options: RuntimeOptions,
    ) -> Self {
        Self {
            urls,
            states: [LoadState::Pending, LoadState::Pending, LoadState::Pending],
            loaded: [0; 3],
            guard: HandoffGuard::new(),
            reporter,
            resolver,
            registry,
            options,
        }
    }

    pub fn begin(&self) {
        self.reporter.progress().reset();
        self.reporter.display().set_status(STATUS_LOADING);
    }

    /// `loaded` is the cumulative count for `kind`; only the growth is recorded.
    pub fn on_progress(&mut self, kind: ResourceKind, loaded: u64) {
        let last = &mut self.loaded[kind.index()];
        if loaded <= *last {
            return;
        }
        let delta = loaded - *last;
        *last = loaded;
        tracing::debug!("{} progress: {} bytes", kind, loaded);
        self.reporter.progress().record_progress(delta);
    }

    pub fn on_complete(&mut self, kind: ResourceKind, result: FetchResult) {
        let slot = kind.index();
        if self.states[slot].is_terminal() {
            tracing::warn!("Ignoring second completion for {} resource", kind);
            return;
        }

        match result {
            FetchResult::Success(payload) => self.store(kind, payload),
            FetchResult::Failure(status_text) => {
                self.states[slot] = LoadState::Failed;
                let message = format!("{}: {}", status_text, self.urls.url_for(kind));
                tracing::warn!("Could not load {} resource: {}", kind, message);
                if self.reporter.report(&message, None) {
                    self.guard.block();
                }
            }
        }

        self.attempt_handoff();
    }

    fn store(&mut self, kind: ResourceKind, payload: Payload) {
        let slot = kind.index();
        match (kind, payload) {
            (ResourceKind::Code, Payload::Text(code)) => {
                tracing::info!("Code resource ready ({} bytes)", code.len());
                self.resolver.install(code);
                self.states[slot] = LoadState::Consumed;
            }
            (ResourceKind::Data, payload @ Payload::Blob(_))
            | (ResourceKind::Module, payload @ Payload::Buffer(_)) => {
                tracing::info!("{} resource ready ({} bytes)", kind, payload.len());
                self.states[slot] = LoadState::Ready(payload);
            }
            (kind, _) => {
                self.states[slot] = LoadState::Failed;
                let detail = format!("{} resource", kind);
                if self.reporter.report("unexpected payload", Some(detail.as_str())) {
                    self.guard.block();
                }
            }
        }
    }

    /// Invokes the initializer once every resource is ready, the session has
    /// not errored and the initializer can be resolved. Idempotent.
    pub fn attempt_handoff(&mut self) -> bool {
        if !self.guard.is_armed() {
            return false;
        }
        if self.reporter.is_errored() {
            self.guard.block();
            return false;
        }
        if !self.states.iter().all(LoadState::is_ready) {
            return false;
        }
        let Some(initializer) = self.resolver.resolve() else {
            tracing::debug!("All resources ready, initializer not available yet");
            return false;
        };
        if !self.guard.consume() {
            return false;
        }

        let data = self.take_bytes(ResourceKind::Data);
        let module_binary = self.take_bytes(ResourceKind::Module);
        let handle = self.registry.create(data);
        let data_url = handle.url().to_string();
        let data_file_name = self.options.data_file_name.clone();

        let display = Arc::clone(self.reporter.display());
        let reporter = Arc::clone(&self.reporter);
        let release: SetupHook = Box::new(move || handle.release());

        let config = InitConfig {
            print: Box::new(move |message: &str| {
                if !message.is_empty() {
                    display.set_status(message);
                }
            }),
            print_err: Box::new(move |message: &str| {
                reporter.report(message, None);
            }),
            canvas: self.options.canvas.clone(),
            arguments: self.options.arguments.clone(),
            module_binary,
            locate_file: Box::new(move |name: &str| {
                if name == data_file_name {
                    data_url.clone()
                } else {
                    name.to_string()
                }
            }),
            pre_run: vec![release],
        };

        tracing::info!("All resources ready, handing off to initializer");
        self.reporter.display().set_status(STATUS_RUNNING);
        if let Err(e) = initializer.initialize(config) {
            self.reporter.report_init_failure(&e.0);
        }
        true
    }

    fn take_bytes(&mut self, kind: ResourceKind) -> Bytes {
        let slot = kind.index();
        match std::mem::replace(&mut self.states[slot], LoadState::Consumed) {
            LoadState::Ready(Payload::Blob(bytes)) | LoadState::Ready(Payload::Buffer(bytes)) => {
                bytes
            }
            LoadState::Ready(Payload::Text(text)) => Bytes::from(text),
            _ => Bytes::new(),
        }
    }

    pub fn load_state(&self, kind: ResourceKind) -> &LoadState {
        &self.states[kind.index()]
    }

    pub fn is_handed_off(&self) -> bool {
        self.guard.is_consumed()
    }

    pub fn state(&self) -> SessionState {
        if self.reporter.is_errored()
            || self.states.iter().any(|s| matches!(s, LoadState::Failed))
        {
            SessionState::Errored
        } else if self.guard.is_consumed() {
            SessionState::HandedOff
        } else if self.states.iter().all(LoadState::is_ready) {
            SessionState::Complete
        } else {
            SessionState::Loading
        }
    }

    pub fn report(&self) -> SessionReport {
        let progress = self.reporter.progress();
        SessionReport {
            state: self.state(),
            handed_off: self.is_handed_off(),
            bytes_seen: progress.running_total(),
            percent: progress.displayed(),
        }
    }
}
