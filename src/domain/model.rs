use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The three resources one load session fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Code,
    Data,
    Module,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 3] = [ResourceKind::Code, ResourceKind::Data, ResourceKind::Module];

    pub fn index(self) -> usize {
        match self {
            ResourceKind::Code => 0,
            ResourceKind::Data => 1,
            ResourceKind::Module => 2,
        }
    }

    /// How the body of this resource has to be interpreted.
    pub fn response_kind(self) -> ResponseKind {
        match self {
            ResourceKind::Code => ResponseKind::Text,
            ResourceKind::Data => ResponseKind::Blob,
            ResourceKind::Module => ResponseKind::Buffer,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Code => write!(f, "code"),
            ResourceKind::Data => write!(f, "data"),
            ResourceKind::Module => write!(f, "module"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    Text,
    Blob,
    Buffer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    url: String,
    response_kind: ResponseKind,
}

impl FetchRequest {
    pub fn new(url: impl Into<String>, response_kind: ResponseKind) -> Self {
        Self {
            url: url.into(),
            response_kind,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn response_kind(&self) -> ResponseKind {
        self.response_kind
    }
}

/// A decoded response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Text(String),
    Blob(Bytes),
    Buffer(Bytes),
}

impl Payload {
    pub(crate) fn len(&self) -> usize {
        match self {
            Payload::Text(text) => text.len(),
            Payload::Blob(bytes) | Payload::Buffer(bytes) => bytes.len(),
        }
    }

}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    Success(Payload),
    Failure(String),
}

/// Per-resource state. Terminal states are never left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Pending,
    Ready(Payload),
    /// Ready, but the payload has already been handed over or released.
    Consumed,
    Failed,
}

impl LoadState {
    pub fn is_ready(&self) -> bool {
        matches!(self, LoadState::Ready(_) | LoadState::Consumed)
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, LoadState::Pending)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Loading,
    Complete,
    HandedOff,
    Errored,
}

/// The three resource locations of one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceUrls {
    pub js: String,
    pub data: String,
    pub wasm: String,
}

impl ResourceUrls {
    pub fn url_for(&self, kind: ResourceKind) -> &str {
        match kind {
            ResourceKind::Code => &self.js,
            ResourceKind::Data => &self.data,
            ResourceKind::Module => &self.wasm,
        }
    }

    pub fn request_for(&self, kind: ResourceKind) -> FetchRequest {
        FetchRequest::new(self.url_for(kind), kind.response_kind())
    }
}

/// Summary of a finished session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionReport {
    pub state: SessionState,
    pub handed_off: bool,
    pub bytes_seen: u64,
    pub percent: f64,
}
