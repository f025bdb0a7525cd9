//! `$/progress` reporting for workspace scans.
//!
//! ```ignore
//! let progress = ProgressToken::begin(&client, "Scanning", None).await;
//! progress.report(Some("12 / 40 files".into()), Some(30)).await;
//! progress.end(Some("96 structs".into())).await;
//! ```

use std::{
    panic::AssertUnwindSafe,
    sync::atomic::{AtomicU64, Ordering},
};

use futures::FutureExt;
use tower_lsp::{Client, lsp_types::*};
use tracing::{debug, warn};

static NEXT_PROGRESS_ID: AtomicU64 = AtomicU64::new(1);
const PROGRESS_TITLE_PREFIX: &str = "destructify:";

/// An active work-done progress session.
///
/// Dropping the token without [`end`](Self::end) still sends an `End`
/// notification so the client never keeps a stuck spinner.
pub struct ProgressToken {
    client: Option<Client>,
    token: Option<NumberOrString>,
}

impl ProgressToken {
    /// Create the token on the client and send `Begin`.
    ///
    /// The create request runs in the background; clients that reject it
    /// still render the begin notification in most cases.
    pub async fn begin(
        client: &Client,
        title: &str,
        message: Option<String>,
    ) -> Self {
        let id = NEXT_PROGRESS_ID.fetch_add(1, Ordering::Relaxed);
        let token = NumberOrString::String(format!("destructify/{}/{id}", title.trim().to_lowercase()));
        let display_title = prefixed_progress_title(title);

        // Keep the response receiver alive in its own task; tower-lsp panics
        // if it is dropped before the client answers.
        let create_client = client.clone();
        let create_token = token.clone();
        tokio::spawn(async move {
            let result = AssertUnwindSafe(create_client.send_request::<request::WorkDoneProgressCreate>(
                WorkDoneProgressCreateParams {
                    token: create_token,
                },
            ))
            .catch_unwind()
            .await;
            match result {
                Ok(Ok(())) => {},
                Ok(Err(error)) => debug!("[progress] workDoneProgress/create rejected: {error}"),
                Err(_) => warn!("[progress] workDoneProgress/create panicked (client gone?)"),
            }
        });

        let sent = AssertUnwindSafe(client.send_notification::<notification::Progress>(ProgressParams {
            token: token.clone(),
            value: ProgressParamsValue::WorkDone(WorkDoneProgress::Begin(WorkDoneProgressBegin {
                title: display_title.clone(),
                cancellable: Some(false),
                message,
                percentage: Some(0),
            })),
        }))
        .catch_unwind()
        .await;

        if sent.is_err() {
            warn!("[progress] begin notification panicked (client gone?)");
            return Self {
                client: None,
                token: None,
            };
        }

        debug!("[progress] begin: {display_title}");
        Self {
            client: Some(client.clone()),
            token: Some(token),
        }
    }

    /// Intermediate update; `percentage` is clamped to `0..=100`.
    pub async fn report(
        &self,
        message: Option<String>,
        percentage: Option<u32>,
    ) {
        let percentage = percentage.map(|p| p.min(100));
        if let (Some(client), Some(token)) = (&self.client, &self.token) {
            let _ = AssertUnwindSafe(client.send_notification::<notification::Progress>(ProgressParams {
                token: token.clone(),
                value: ProgressParamsValue::WorkDone(WorkDoneProgress::Report(WorkDoneProgressReport {
                    cancellable: Some(false),
                    message,
                    percentage,
                })),
            }))
            .catch_unwind()
            .await;
        }
    }

    pub async fn end(
        mut self,
        message: Option<String>,
    ) {
        let (Some(client), Some(token)) = (self.client.take(), self.token.take()) else {
            return;
        };
        debug!("[progress] end: {token:?}");
        let _ = AssertUnwindSafe(client.send_notification::<notification::Progress>(ProgressParams {
            token,
            value: ProgressParamsValue::WorkDone(WorkDoneProgress::End(WorkDoneProgressEnd {
                message,
            })),
        }))
        .catch_unwind()
        .await;
    }
}

impl Drop for ProgressToken {
    fn drop(&mut self) {
        if let (Some(client), Some(token)) = (self.client.take(), self.token.take()) {
            debug!("[progress] dropped before end: {token:?}");
            tokio::spawn(async move {
                let _ = AssertUnwindSafe(client.send_notification::<notification::Progress>(ProgressParams {
                    token,
                    value: ProgressParamsValue::WorkDone(WorkDoneProgress::End(WorkDoneProgressEnd {
                        message: Some("Cancelled".to_string()),
                    })),
                }))
                .catch_unwind()
                .await;
            });
        }
    }
}

/// Share of `done` in `total`, as an LSP percentage.
pub fn percentage(
    done: usize,
    total: usize,
) -> u32 {
    if total == 0 {
        return 100;
    }
    ((done.min(total) * 100) / total) as u32
}

fn prefixed_progress_title(title: &str) -> String {
    let trimmed = title.trim();
    if trimmed.starts_with(PROGRESS_TITLE_PREFIX) {
        return trimmed.to_owned();
    }
    format!("{PROGRESS_TITLE_PREFIX} {trimmed}")
}

#[cfg(test)]
#[path = "../tests/src/progress_tests.rs"]
mod tests;
