//! `workspace/executeCommand` handlers.

use std::{
    io,
    panic::AssertUnwindSafe,
    path::{Path, PathBuf},
};

use futures::FutureExt;
use serde::Deserialize;
use serde_json::Value;
use tower_lsp::{
    jsonrpc,
    lsp_types::{MessageType, Range, ShowDocumentParams, Url},
};
use tracing::{debug, info, warn};

use crate::{
    document::DocumentStore,
    error::{Error, Result},
    flatten::{Expansion, destructify},
    output::{FileSink, ResultSink},
    server::state::{DestructifyServer, prefixed_client_message},
    vfs::{FsSources, OverlaySources},
};

pub const EXPAND_COMMAND: &str = "destructify.expand";
pub const RESCAN_COMMAND: &str = "destructify.rescan";

pub(crate) fn supported_commands() -> Vec<String> {
    vec![EXPAND_COMMAND.to_string(), RESCAN_COMMAND.to_string()]
}

/// Arguments of [`EXPAND_COMMAND`]: either an explicit symbol or a
/// selection in an open document.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct ExpandArguments {
    pub(crate) symbol: Option<String>,
    pub(crate) uri: Option<Url>,
    pub(crate) range: Option<Range>,
}

impl ExpandArguments {
    /// Accepts `[{...}]` as sent by most clients, or a bare `["Symbol"]`.
    pub(crate) fn from_command_arguments(arguments: &[Value]) -> Option<Self> {
        match arguments.first()? {
            Value::String(symbol) => Some(Self {
                symbol: Some(symbol.clone()),
                ..Self::default()
            }),
            value => serde_json::from_value(value.clone()).ok(),
        }
    }

    /// The symbol to expand: the explicit one, the selected text, or the
    /// identifier under the cursor when the selection is empty.
    pub(crate) fn resolve_symbol(
        &self,
        documents: &DocumentStore,
    ) -> Option<String> {
        if let Some(symbol) = self.symbol.as_deref().map(str::trim)
            && !symbol.is_empty()
        {
            return Some(symbol.to_string());
        }

        let uri = self.uri.as_ref()?;
        let range = self.range?;
        let document = documents.get(uri)?;
        if range.start == range.end {
            return document.word_at(range.start).map(|(word, _)| word);
        }
        let selected = document.text_in(range)?.trim();
        (!selected.is_empty()).then(|| selected.to_string())
    }
}

impl DestructifyServer {
    /// Flatten `symbol` against the current catalog and open buffers.
    pub(crate) async fn expand_symbol(
        &self,
        symbol: String,
    ) -> Result<Expansion> {
        let catalog = self.catalog_snapshot().await;
        let flatten = self.settings.read().await.flatten.clone();
        let reader = OverlaySources::new(self.document_store.clone(), FsSources);
        tokio::task::spawn_blocking(move || destructify(&catalog, &reader, &symbol, &flatten))
            .await
            .map_err(|err| Error::Io(io::Error::other(err.to_string())))?
    }

    pub(crate) async fn run_expand_command(
        &self,
        arguments: &[Value],
    ) -> jsonrpc::Result<Option<Value>> {
        let arguments = ExpandArguments::from_command_arguments(arguments).unwrap_or_default();
        let Some(symbol) = arguments.resolve_symbol(&self.document_store) else {
            return Err(jsonrpc::Error::invalid_params(format!(
                "{EXPAND_COMMAND} needs a `symbol`, or a `uri` and `range` selecting one"
            )));
        };

        self.wait_until_ready().await;
        let expansion = match self.expand_symbol(symbol.clone()).await {
            Ok(expansion) => expansion,
            Err(err) => {
                info!("[expand] '{symbol}' failed: {err}");
                self.show_warning(err.to_string()).await;
                return Err(jsonrpc::Error::invalid_params(err.to_string()));
            },
        };

        for issue in &expansion.issues {
            debug!("[expand] '{symbol}': {issue}");
        }
        info!("[expand] '{symbol}' expanded with {} degraded field(s)", expansion.issues.len());
        self.log_to_client(MessageType::INFO, format!("Expanded {symbol}")).await;

        self.publish_expansion(&symbol, &expansion.text, arguments.uri.as_ref()).await;
        Ok(Some(Value::String(expansion.text)))
    }

    pub(crate) async fn run_rescan_command(&self) -> jsonrpc::Result<Option<Value>> {
        let handle = self.clone_for_background().await;
        let summary = handle.index_workspace().await.map(|report| report.summary());
        Ok(summary.map(Value::String))
    }

    /// Write the expansion to the results directory and ask the client to
    /// show it. Failures here never fail the command.
    async fn publish_expansion(
        &self,
        symbol: &str,
        text: &str,
        origin: Option<&Url>,
    ) {
        let Some(root) = self.results_root(origin).await else {
            debug!("[expand] no workspace root; not writing a results file");
            return;
        };
        let output = self.settings.read().await.output.clone();
        let mut sink = FileSink::for_workspace(&root, &output);
        if let Err(err) = sink.write(symbol, text) {
            warn!("[expand] failed to write results for '{symbol}': {err}");
            self.log_to_client(MessageType::WARNING, format!("Could not write results: {err}")).await;
            return;
        }

        if !output.show_document {
            return;
        }
        let Some(uri) = sink.last_written().and_then(|path| Url::from_file_path(path).ok()) else {
            return;
        };
        // The response may arrive after the command returns.
        let client = self.client.clone();
        tokio::spawn(async move {
            let params = ShowDocumentParams {
                uri,
                external: Some(false),
                take_focus: Some(true),
                selection: None,
            };
            match AssertUnwindSafe(client.show_document(params)).catch_unwind().await {
                Ok(Ok(true)) => {},
                Ok(Ok(false)) => debug!("[expand] client declined to show the results file"),
                Ok(Err(err)) => debug!("[expand] showDocument failed: {err}"),
                Err(_) => warn!("[expand] showDocument panicked (client may have disconnected)"),
            }
        });
    }

    /// First workspace root, else the directory of the requesting document.
    async fn results_root(
        &self,
        origin: Option<&Url>,
    ) -> Option<PathBuf> {
        if let Some(root) = self.workspace_roots.read().await.first() {
            return Some(root.clone());
        }
        let path = origin?.to_file_path().ok()?;
        path.parent().map(Path::to_path_buf)
    }

    async fn show_warning(
        &self,
        message: String,
    ) {
        let _ = AssertUnwindSafe(self.client.show_message(MessageType::WARNING, prefixed_client_message(message)))
            .catch_unwind()
            .await;
    }
}

#[cfg(test)]
#[path = "../../tests/src/server/commands_tests.rs"]
mod tests;
