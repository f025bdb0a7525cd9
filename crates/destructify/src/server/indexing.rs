use std::{
    panic::AssertUnwindSafe,
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use dashmap::DashSet;
use futures::FutureExt;
use tokio::sync::{RwLock, watch};
use tower_lsp::{Client, lsp_types::MessageType};
use tracing::{debug, info, warn};

use crate::{
    catalog::SymbolCatalog,
    config::Settings,
    document::DocumentStore,
    progress::{ProgressToken, percentage},
    scan::{ScanReport, Scanner},
    server::state::{DestructifyServer, prefixed_client_message},
    vfs::{FsSources, OverlaySources},
    workspace::{discover_source_files, has_source_extension, scan_into},
};

/// Files scanned per blocking task between progress reports.
const SCAN_BATCH_SIZE: usize = 64;

/// Scan problems echoed individually to the log before summarizing.
const MAX_LOGGED_PROBLEMS: usize = 20;

impl DestructifyServer {
    pub(crate) async fn clone_for_background(&self) -> BackgroundHandle {
        BackgroundHandle {
            client: self.client.clone(),
            document_store: self.document_store.clone(),
            catalog: self.catalog.clone(),
            settings: self.settings.clone(),
            workspace_roots: self.workspace_roots.read().await.clone(),
            ready: self.ready.clone(),
            scan_generation: self.scan_generation.clone(),
            rescanned_paths: self.rescanned_paths.clone(),
        }
    }
}

/// Everything a background scan needs, detached from the server borrow.
pub(crate) struct BackgroundHandle {
    client: Client,
    document_store: Arc<DocumentStore>,
    catalog: Arc<RwLock<Arc<SymbolCatalog>>>,
    settings: Arc<RwLock<Settings>>,
    workspace_roots: Vec<PathBuf>,
    ready: Arc<watch::Sender<bool>>,
    scan_generation: Arc<AtomicU64>,
    rescanned_paths: Arc<DashSet<PathBuf>>,
}

impl BackgroundHandle {
    fn reader(&self) -> OverlaySources<FsSources> {
        OverlaySources::new(self.document_store.clone(), FsSources)
    }

    /// Discover and scan every source file under the workspace roots, then
    /// swap the new catalog in.
    pub async fn index_workspace(&self) -> Option<ScanReport> {
        let generation = self.scan_generation.fetch_add(1, Ordering::SeqCst) + 1;
        // Files read from here on are current; only later saves need replaying.
        self.rescanned_paths.clear();
        let settings = self.settings.read().await.clone();
        if !settings.indexing.enable {
            info!("[scan] skipping workspace scan because destructify.indexing.enable=false");
            self.ready.send_replace(true);
            return None;
        }

        let roots = self.workspace_roots.clone();
        let indexing = settings.indexing.clone();
        let discovered = match tokio::task::spawn_blocking(move || discover_source_files(&roots, &indexing)).await {
            Ok(discovered) => discovered,
            Err(err) => {
                warn!("[scan] workspace discovery task failed: {err}");
                self.ready.send_replace(true);
                return None;
            },
        };

        let total = discovered.files.len();
        info!("[scan] scanning {total} source file(s) in workspace");
        let progress = ProgressToken::begin(&self.client, "Scanning", Some(format!("0 / {total} files"))).await;

        let scanner = Scanner::new(settings.flatten.max_scan_bytes);
        let mut catalog = SymbolCatalog::new();
        let mut report = ScanReport {
            files_skipped: discovered.skipped,
            ..ScanReport::default()
        };
        let mut done = 0;
        for batch in discovered.files.chunks(SCAN_BATCH_SIZE) {
            let batch = batch.to_vec();
            let reader = self.reader();
            let batch_len = batch.len();
            let scanned = tokio::task::spawn_blocking(move || {
                let batch_report = scan_into(&scanner, &reader, &mut catalog, &batch);
                (catalog, batch_report)
            })
            .await;
            let (returned, batch_report) = match scanned {
                Ok(result) => result,
                Err(err) => {
                    warn!("[scan] scan task failed: {err}");
                    progress.end(Some("Scan failed".to_string())).await;
                    self.ready.send_replace(true);
                    return None;
                },
            };
            catalog = returned;
            report.absorb(batch_report);
            done += batch_len;
            progress.report(Some(format!("{done} / {total} files")), Some(percentage(done, total))).await;
        }

        // Replay files saved while the batches ran. The swap happens only
        // once none are waiting.
        let mut replayed = Vec::new();
        let mut guard = loop {
            if self.scan_generation.load(Ordering::SeqCst) != generation {
                // The newer scan may have started before these were saved.
                for path in replayed {
                    self.rescanned_paths.insert(path);
                }
                debug!("[scan] dropping result of superseded scan #{generation}");
                progress.end(Some("Superseded".to_string())).await;
                return None;
            }
            let saved: Vec<PathBuf> = self.rescanned_paths.iter().map(|path| path.key().clone()).collect();
            let pending: Vec<PathBuf> =
                saved.into_iter().filter(|path| self.rescanned_paths.remove(path).is_some()).collect();
            if pending.is_empty() {
                let guard = self.catalog.write().await;
                if self.rescanned_paths.is_empty() && self.scan_generation.load(Ordering::SeqCst) == generation {
                    break guard;
                }
                continue;
            }

            debug!("[scan] replaying {} file(s) saved during scan #{generation}", pending.len());
            let reader = self.reader();
            let batch = pending.clone();
            let replay = tokio::task::spawn_blocking(move || {
                for path in &batch {
                    catalog.remove_path(path);
                }
                let batch_report = scan_into(&scanner, &reader, &mut catalog, &batch);
                (catalog, batch_report)
            })
            .await;
            match replay {
                Ok((returned, batch_report)) => {
                    catalog = returned;
                    log_problems(&batch_report);
                },
                Err(err) => {
                    warn!("[scan] replay task failed: {err}");
                    progress.end(Some("Scan failed".to_string())).await;
                    self.ready.send_replace(true);
                    return None;
                },
            }
            replayed.extend(pending);
        };

        catalog.set_max_alias_hops(settings.flatten.alias_hop_cap());
        let struct_count = catalog.struct_count();
        *guard = Arc::new(catalog);
        drop(guard);
        self.ready.send_replace(true);

        log_problems(&report);
        let summary = report.summary();
        info!("[scan] {summary}");
        if settings.logging.level.allows_info() {
            self.log_message(MessageType::INFO, format!("Scanned workspace: {summary}")).await;
        }
        progress.end(Some(format!("{struct_count} struct(s)"))).await;
        Some(report)
    }

    /// Patch the current catalog with a fresh scan of one file.
    ///
    /// No lock is held while scanning. If another scan swapped the catalog
    /// in the meantime, the patch is redone on the newer catalog.
    pub async fn rescan_file(
        &self,
        path: PathBuf,
    ) {
        let settings = self.settings.read().await.clone();
        if !settings.indexing.enable || !has_source_extension(&path, &settings.indexing.extensions) {
            return;
        }
        self.rescanned_paths.insert(path.clone());

        let scanner = Scanner::new(settings.flatten.max_scan_bytes);
        loop {
            let base = self.catalog.read().await.clone();
            let snapshot = base.clone();
            let reader = self.reader();
            let scanned_path = path.clone();
            let result = tokio::task::spawn_blocking(move || {
                let mut catalog = (*snapshot).clone();
                // An unreadable (deleted) file keeps none of its old entries.
                catalog.remove_path(&scanned_path);
                let report = scan_into(&scanner, &reader, &mut catalog, std::slice::from_ref(&scanned_path));
                (catalog, report)
            })
            .await;

            let (catalog, report) = match result {
                Ok(result) => result,
                Err(err) => {
                    warn!("[scan] rescan of {} failed: {err}", path.display());
                    return;
                },
            };

            let mut guard = self.catalog.write().await;
            if !Arc::ptr_eq(&*guard, &base) {
                debug!("[scan] catalog replaced while rescanning {}; patching again", path.display());
                continue;
            }
            *guard = Arc::new(catalog);
            drop(guard);
            log_problems(&report);
            debug!("[scan] rescanned {}: {}", path.display(), report.summary());
            return;
        }
    }

    async fn log_message(
        &self,
        level: MessageType,
        message: String,
    ) {
        let _ = AssertUnwindSafe(self.client.log_message(level, prefixed_client_message(message)))
            .catch_unwind()
            .await;
    }
}

fn log_problems(report: &ScanReport) {
    for problem in report.problems.iter().take(MAX_LOGGED_PROBLEMS) {
        warn!("[scan] {problem}");
    }
    if report.problems.len() > MAX_LOGGED_PROBLEMS {
        warn!("[scan] ... and {} more problem(s)", report.problems.len() - MAX_LOGGED_PROBLEMS);
    }
}
