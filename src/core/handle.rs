use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

const HANDLE_SCHEME: &str = "blob:triad/";

/// Hands out short-lived locations for fetched blobs, the way object URLs
/// work in a browser.
#[derive(Default)]
pub struct HandleRegistry {
    next_id: AtomicU64,
    entries: Mutex<HashMap<String, Bytes>>,
}

impl HandleRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn create(self: &Arc<Self>, blob: Bytes) -> TransientHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let url = format!("{}{}", HANDLE_SCHEME, id);
        tracing::debug!("Registered {} ({} bytes)", url, blob.len());
        self.entries.lock().insert(url.clone(), blob);
        TransientHandle {
            registry: Arc::clone(self),
            url,
            released: false,
        }
    }

    pub fn open(&self, url: &str) -> Option<Bytes> {
        self.entries.lock().get(url).cloned()
    }

    pub fn revoke(&self, url: &str) -> bool {
        let removed = self.entries.lock().remove(url).is_some();
        if removed {
            tracing::debug!("Revoked {}", url);
        }
        removed
    }

    pub fn live_handles(&self) -> usize {
        self.entries.lock().len()
    }
}

/// Owns one registered location until released; dropping it releases too.
pub struct TransientHandle {
    registry: Arc<HandleRegistry>,
    url: String,
    released: bool,
}

impl TransientHandle {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn release(mut self) {
        self.revoke();
    }

    fn revoke(&mut self) {
        if !self.released {
            self.released = true;
            self.registry.revoke(&self.url);
        }
    }
}

impl Drop for TransientHandle {
    fn drop(&mut self) {
        self.revoke();
    }
}

impl std::fmt::Debug for TransientHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransientHandle")
            .field("url", &self.url)
            .field("released", &self.released)
            .finish()
    }
}
