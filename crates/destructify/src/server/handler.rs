use std::{collections::HashMap, path::PathBuf, time::Duration};

use tower_lsp::{LanguageServer, jsonrpc::Result, lsp_types::*};
use tracing::{debug, info, warn};

use crate::{
    catalog::CatalogEntry,
    config::Settings,
    document::Document,
    server::{
        commands::{EXPAND_COMMAND, RESCAN_COMMAND, supported_commands},
        state::DestructifyServer,
    },
    vfs::normalized_path,
};

/// Upper bound on `workspace/symbol` results.
const WORKSPACE_SYMBOL_LIMIT: usize = 100;

/// Idle time after the last edit before an open buffer is rescanned.
const CHANGE_RESCAN_DELAY: Duration = Duration::from_millis(300);

#[tower_lsp::async_trait]
impl LanguageServer for DestructifyServer {
    async fn initialize(
        &self,
        params: InitializeParams,
    ) -> Result<InitializeResult> {
        info!("Initializing destructify...");

        let roots = workspace_roots_from(&params);
        let base = match roots.first() {
            Some(root) => Settings::discover(root).unwrap_or_else(|err| {
                warn!("[config] {err}; using defaults");
                Settings::default()
            }),
            None => Settings::default(),
        };
        let settings = match params.initialization_options.as_ref() {
            Some(payload) => base.merged_with_payload(payload),
            None => base,
        };
        self.apply_settings(settings).await;
        *self.workspace_roots.write().await = roots;

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Options(TextDocumentSyncOptions {
                    open_close: Some(true),
                    change: Some(TextDocumentSyncKind::INCREMENTAL),
                    save: Some(TextDocumentSyncSaveOptions::Supported(true)),
                    ..Default::default()
                })),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                workspace_symbol_provider: Some(OneOf::Left(true)),
                execute_command_provider: Some(ExecuteCommandOptions {
                    commands: supported_commands(),
                    work_done_progress_options: Default::default(),
                }),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "destructify".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(
        &self,
        _: InitializedParams,
    ) {
        info!("destructify initialized");
        self.log_to_client(MessageType::INFO, "Server initialized").await;

        let handle = self.clone_for_background().await;
        tokio::spawn(async move {
            handle.index_workspace().await;
        });
    }

    async fn did_change_configuration(
        &self,
        params: DidChangeConfigurationParams,
    ) {
        let current = self.settings_snapshot().await;
        let merged = current.merged_with_payload(&params.settings);
        if merged == current {
            return;
        }

        let scan_inputs_changed = merged.indexing != current.indexing
            || merged.flatten.max_scan_bytes != current.flatten.max_scan_bytes
            || merged.flatten.max_alias_hops != current.flatten.max_alias_hops;
        self.apply_settings(merged).await;
        info!("Applied updated destructify settings");

        if scan_inputs_changed {
            let handle = self.clone_for_background().await;
            tokio::spawn(async move {
                handle.index_workspace().await;
            });
        }
    }

    async fn shutdown(&self) -> Result<()> {
        info!("Shutting down destructify");
        Ok(())
    }

    async fn did_open(
        &self,
        params: DidOpenTextDocumentParams,
    ) {
        let document = params.text_document;
        debug!("Opened {} (v{}, {} bytes)", short_name(&document.uri), document.version, document.text.len());
        self.document_store.open(document.uri, document.text, document.version);
    }

    async fn did_change(
        &self,
        params: DidChangeTextDocumentParams,
    ) {
        let uri = params.text_document.uri;
        self.document_store.apply_changes(&uri, params.content_changes, params.text_document.version);

        // Scanned offsets into this buffer are stale until it is rescanned.
        let generation = {
            let mut current = self.change_generation.entry(uri.clone()).or_insert(0);
            *current += 1;
            *current
        };
        let Ok(path) = uri.to_file_path() else {
            return;
        };
        let generations = self.change_generation.clone();
        let handle = self.clone_for_background().await;
        tokio::spawn(async move {
            tokio::time::sleep(CHANGE_RESCAN_DELAY).await;
            let still_latest = generations.get(&uri).is_some_and(|current| *current == generation);
            if still_latest {
                handle.rescan_file(normalized_path(&path)).await;
            }
        });
    }

    async fn did_save(
        &self,
        params: DidSaveTextDocumentParams,
    ) {
        let uri = params.text_document.uri;
        if let Some(text) = params.text {
            let version = self.document_store.get(&uri).map_or(0, |doc| doc.version);
            self.document_store.update(uri.clone(), text, version);
        }
        self.rescan_uri(&uri).await;
    }

    async fn did_close(
        &self,
        params: DidCloseTextDocumentParams,
    ) {
        let uri = params.text_document.uri;
        self.document_store.close(&uri);
        self.change_generation.remove(&uri);
        // Unsaved edits are gone; go back to what is on disk.
        self.rescan_uri(&uri).await;
    }

    async fn hover(
        &self,
        params: HoverParams,
    ) -> Result<Option<Hover>> {
        if !self.settings.read().await.hover.enable || !self.is_ready() {
            return Ok(None);
        }
        let position = params.text_document_position_params.position;
        let uri = params.text_document_position_params.text_document.uri;
        let Some((word, range)) = self.document_store.get(&uri).and_then(|doc| doc.word_at(position)) else {
            return Ok(None);
        };

        let catalog = self.catalog_snapshot().await;
        if !catalog.contains_struct(&word) && catalog.alias(&word).is_none() {
            return Ok(None);
        }

        match self.expand_symbol(word.clone()).await {
            Ok(expansion) => Ok(Some(Hover {
                contents: HoverContents::Markup(MarkupContent {
                    kind: MarkupKind::Markdown,
                    value: format!("```c\n{}\n```", expansion.text),
                }),
                range: Some(range),
            })),
            Err(err) => {
                debug!("[hover] '{word}': {err}");
                Ok(None)
            },
        }
    }

    async fn symbol(
        &self,
        params: WorkspaceSymbolParams,
    ) -> Result<Option<Vec<SymbolInformation>>> {
        let catalog = self.catalog_snapshot().await;
        let entries = catalog.search(&params.query, WORKSPACE_SYMBOL_LIMIT);
        let mut documents: HashMap<PathBuf, Option<Document>> = HashMap::new();
        let symbols = entries
            .into_iter()
            .filter_map(|entry| {
                let uri = Url::from_file_path(&entry.path).ok()?;
                let position = match entry.offset {
                    Some(offset) => documents
                        .entry(entry.path.clone())
                        .or_insert_with(|| self.load_document(&uri, &entry.path))
                        .as_ref()
                        .map_or_else(Position::default, |doc| doc.position_of(offset)),
                    None => Position::default(),
                };
                Some(symbol_information(entry, uri, position))
            })
            .collect();
        Ok(Some(symbols))
    }

    async fn execute_command(
        &self,
        params: ExecuteCommandParams,
    ) -> Result<Option<serde_json::Value>> {
        info!("[command] {}", params.command);
        match params.command.as_str() {
            EXPAND_COMMAND => self.run_expand_command(&params.arguments).await,
            RESCAN_COMMAND => self.run_rescan_command().await,
            other => Err(tower_lsp::jsonrpc::Error::invalid_params(format!("unknown command `{other}`"))),
        }
    }
}

impl DestructifyServer {
    async fn rescan_uri(
        &self,
        uri: &Url,
    ) {
        let Ok(path) = uri.to_file_path() else {
            return;
        };
        let handle = self.clone_for_background().await;
        handle.rescan_file(normalized_path(&path)).await;
    }

    /// Open buffer for `uri`, else the file on disk.
    fn load_document(
        &self,
        uri: &Url,
        path: &std::path::Path,
    ) -> Option<Document> {
        if let Some(doc) = self.document_store.get(uri) {
            return Some(doc);
        }
        std::fs::read_to_string(path).ok().map(|text| Document::new(uri.clone(), text, 0))
    }
}

fn workspace_roots_from(params: &InitializeParams) -> Vec<PathBuf> {
    let uris: Vec<&Url> = match &params.workspace_folders {
        Some(folders) if !folders.is_empty() => folders.iter().map(|f| &f.uri).collect(),
        _ => params.root_uri.iter().collect(),
    };
    uris.into_iter().filter_map(|uri| uri.to_file_path().ok()).map(|path| normalized_path(&path)).collect()
}

#[allow(deprecated)]
fn symbol_information(
    entry: CatalogEntry,
    uri: Url,
    position: Position,
) -> SymbolInformation {
    SymbolInformation {
        name: entry.name,
        kind: SymbolKind::STRUCT,
        tags: None,
        deprecated: None,
        location: Location {
            uri,
            range: Range::new(position, position),
        },
        container_name: entry.detail,
    }
}

fn short_name(uri: &Url) -> String {
    uri.path_segments().and_then(|mut segments| segments.next_back()).unwrap_or("unknown").to_string()
}

#[cfg(test)]
#[path = "../../tests/src/server/handler_tests.rs"]
mod tests;
