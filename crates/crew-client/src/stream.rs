use std::pin::Pin;
use std::task::{Context, Poll};

use futures::{Stream, StreamExt};
use launchpad_core::pipeline::PipelineStatus;
use launchpad_core::upstream::extract_message;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;

use crate::sse::SseDecoder;
use crate::{CrewClientError, Result};

// ─── ProgressStream ───────────────────────────────────────────────────────

/// Live [`PipelineStatus`] snapshots for one analysis.
///
/// A background task owns the HTTP connection, decodes the event stream and
/// forwards each snapshot through an mpsc channel. The stream ends after
/// the first terminal snapshot, after a single transport error, or when the
/// server closes the connection. Malformed events are logged and skipped.
///
/// Dropping `ProgressStream` aborts the task, which closes the connection.
/// The stream is never reopened.
///
/// ```rust,ignore
/// let mut stream = ProgressStream::open(request);
/// while let Some(snapshot) = stream.next().await {
///     render(&snapshot?);
/// }
/// ```
pub struct ProgressStream {
    rx: mpsc::Receiver<Result<PipelineStatus>>,
    task: Option<AbortHandle>,
}

impl ProgressStream {
    /// Send `request` and stream its `text/event-stream` body.
    pub fn open(request: reqwest::RequestBuilder) -> Self {
        let (tx, rx) = mpsc::channel(32);

        let handle = tokio::spawn(async move {
            let resp = match request
                .header(reqwest::header::ACCEPT, "text/event-stream")
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    let _ = tx.send(Err(CrewClientError::Transport(e.to_string()))).await;
                    return;
                }
            };

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                let message = extract_message(&body).unwrap_or_else(|| status.to_string());
                let _ = tx
                    .send(Err(CrewClientError::Upstream {
                        status: status.as_u16(),
                        message,
                    }))
                    .await;
                return;
            }

            let mut body = resp.bytes_stream();
            let mut decoder = SseDecoder::new();
            while let Some(chunk) = body.next().await {
                let chunk = match chunk {
                    Ok(c) => c,
                    Err(e) => {
                        let _ = tx.send(Err(CrewClientError::Transport(e.to_string()))).await;
                        return;
                    }
                };
                for event in decoder.push(&chunk) {
                    let snapshot: PipelineStatus = match serde_json::from_str(&event.data) {
                        Ok(s) => s,
                        Err(e) => {
                            tracing::warn!(error = %e, "dropping malformed progress event");
                            continue;
                        }
                    };
                    for violation in snapshot.check_invariants() {
                        tracing::warn!(
                            analysis_id = %snapshot.analysis_id,
                            %violation,
                            "pipeline snapshot breaks protocol"
                        );
                    }
                    let terminal = snapshot.is_terminal();
                    if tx.send(Ok(snapshot)).await.is_err() {
                        return; // Receiver dropped
                    }
                    if terminal {
                        return;
                    }
                }
            }
            if decoder.has_partial() {
                tracing::debug!("progress stream closed mid-event");
            }
        });

        ProgressStream {
            rx,
            task: Some(handle.abort_handle()),
        }
    }

    /// Test-only constructor: wrap a raw mpsc receiver as a `ProgressStream`.
    #[cfg(test)]
    pub(crate) fn from_channel(rx: mpsc::Receiver<Result<PipelineStatus>>) -> Self {
        Self { rx, task: None }
    }
}

impl Stream for ProgressStream {
    type Item = Result<PipelineStatus>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for ProgressStream {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────
