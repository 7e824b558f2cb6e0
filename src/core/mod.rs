pub mod classifier;
pub mod fetcher;
pub mod handle;
pub mod orchestrator;
pub mod progress;
pub mod reporter;
pub mod session;

pub use crate::domain::model::{FetchRequest, FetchResult, Payload, ResourceKind, ResourceUrls};
pub use crate::domain::ports::{DisplaySink, Initializer, InitializerResolver, Transport};
pub use crate::utils::error::Result;
