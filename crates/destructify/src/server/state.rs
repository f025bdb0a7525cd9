use std::{
    panic::AssertUnwindSafe,
    path::PathBuf,
    sync::{Arc, atomic::AtomicU64},
};

use dashmap::{DashMap, DashSet};
use futures::FutureExt;
use tokio::sync::{RwLock, watch};
use tower_lsp::{
    Client,
    lsp_types::{MessageType, Url},
};
use tracing::{debug, warn};

use crate::{catalog::SymbolCatalog, config::Settings, document::DocumentStore};

const CLIENT_NOTIFICATION_PREFIX: &str = "destructify:";

/// The destructify backend that implements the Language Server Protocol.
pub struct DestructifyServer {
    /// The LSP client handle, used for progress, messages and `showDocument`.
    pub(crate) client: Client,

    /// Open buffers; they shadow disk content for scans and expansions.
    pub(crate) document_store: Arc<DocumentStore>,

    /// The current catalog. Scans build a replacement and swap the `Arc`,
    /// so queries keep a consistent snapshot while a scan runs.
    pub(crate) catalog: Arc<RwLock<Arc<SymbolCatalog>>>,

    pub(crate) settings: Arc<RwLock<Settings>>,

    /// Workspace root folders, populated during `initialize`.
    pub(crate) workspace_roots: RwLock<Vec<PathBuf>>,

    /// Flips to `true` once the first workspace scan has been swapped in.
    pub(crate) ready: Arc<watch::Sender<bool>>,

    /// Bumped for every full scan; stale scans drop their result.
    pub(crate) scan_generation: Arc<AtomicU64>,

    /// Files rescanned since the current full scan started. The full scan
    /// scans them again before its catalog replaces the live one.
    pub(crate) rescanned_paths: Arc<DashSet<PathBuf>>,

    /// Per-document edit counter; a debounced rescan runs only for the
    /// latest edit.
    pub(crate) change_generation: Arc<DashMap<Url, u64>>,
}

impl DestructifyServer {
    pub fn new(client: Client) -> Self {
        let (ready, _) = watch::channel(false);
        Self {
            client,
            document_store: Arc::new(DocumentStore::new()),
            catalog: Arc::new(RwLock::new(Arc::new(SymbolCatalog::new()))),
            settings: Arc::new(RwLock::new(Settings::default())),
            workspace_roots: RwLock::new(Vec::new()),
            ready: Arc::new(ready),
            scan_generation: Arc::new(AtomicU64::new(0)),
            rescanned_paths: Arc::new(DashSet::new()),
            change_generation: Arc::new(DashMap::new()),
        }
    }

    pub(crate) async fn settings_snapshot(&self) -> Settings {
        self.settings.read().await.clone()
    }

    pub(crate) async fn apply_settings(
        &self,
        settings: Settings,
    ) {
        *self.settings.write().await = settings;
    }

    pub(crate) async fn catalog_snapshot(&self) -> Arc<SymbolCatalog> {
        self.catalog.read().await.clone()
    }

    pub(crate) fn is_ready(&self) -> bool {
        *self.ready.borrow()
    }

    /// Wait until the first scan has completed.
    pub(crate) async fn wait_until_ready(&self) {
        let mut receiver = self.ready.subscribe();
        if receiver.wait_for(|ready| *ready).await.is_err() {
            debug!("[server] readiness channel closed before first scan");
        }
    }

    /// Mirror a lifecycle message to the client when `logging.level` allows.
    pub(crate) async fn log_to_client(
        &self,
        level: MessageType,
        message: impl Into<String>,
    ) {
        let allowed = {
            let settings = self.settings.read().await;
            if level == MessageType::INFO || level == MessageType::LOG {
                settings.logging.level.allows_info()
            } else {
                settings.logging.level.allows_warn()
            }
        };
        if !allowed {
            return;
        }
        let result =
            AssertUnwindSafe(self.client.log_message(level, prefixed_client_message(message))).catch_unwind().await;
        if result.is_err() {
            warn!("[server] log_message panicked (client may have disconnected)");
        }
    }
}

pub(crate) fn prefixed_client_message(message: impl Into<String>) -> String {
    let message = message.into();
    let trimmed = message.trim_start();
    if trimmed.starts_with(CLIENT_NOTIFICATION_PREFIX) {
        return message;
    }
    format!("{CLIENT_NOTIFICATION_PREFIX} {trimmed}")
}

#[cfg(test)]
#[path = "../../tests/src/server/state_tests.rs"]
mod tests;
