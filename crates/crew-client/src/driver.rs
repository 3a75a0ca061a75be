use std::sync::atomic::{AtomicBool, Ordering};

use futures::StreamExt;
use launchpad_core::pipeline::PipelineStatus;
use launchpad_core::reconcile::Reconciled;
use launchpad_core::results::CategoryResults;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::watch;

use crate::reconcile::fetch_final;
use crate::stream::ProgressStream;
use crate::submit::{CrewEndpoint, Submitter};
use crate::{CrewClientError, Result};

// ─── Phase / DriverView ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Submitting,
    /// Stream requested, no snapshot received yet.
    Connecting,
    /// At least one snapshot received.
    Streaming,
    Reconciling,
    /// Terminal: reconciled, or submission failed.
    Done,
    /// Terminal: cancelled by the consumer before reconciliation.
    Closed,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Done | Phase::Closed)
    }
}

/// Everything a consuming view renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriverView<R> {
    pub phase: Phase,
    pub analysis_id: Option<String>,
    /// Newest snapshot; each one replaces the last.
    pub snapshot: Option<PipelineStatus>,
    pub reconciled: Option<Reconciled<R>>,
    /// Submission failure shown to the user.
    pub error: Option<String>,
}

impl<R> Default for DriverView<R> {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            analysis_id: None,
            snapshot: None,
            reconciled: None,
            error: None,
        }
    }
}

// ─── PipelineDriver ───────────────────────────────────────────────────────

/// Drives one analysis through submit, stream and reconcile.
///
/// One driver per consuming view. The started flag lives in the driver, so
/// calling [`run`](Self::run) again (a re-render, a double click) never
/// submits a second analysis or opens a second stream.
///
/// ```rust,ignore
/// let driver = PipelineDriver::<RoadmapResults>::new(http, endpoint);
/// let mut view = driver.subscribe();
/// tokio::spawn(async move {
///     while view.changed().await.is_ok() {
///         render(&view.borrow());
///     }
/// });
/// driver.run(&payload).await?;
/// ```
pub struct PipelineDriver<R: CategoryResults> {
    http: reqwest::Client,
    endpoint: CrewEndpoint,
    started: AtomicBool,
    view: watch::Sender<DriverView<R>>,
    closed: watch::Sender<bool>,
}

impl<R: CategoryResults> PipelineDriver<R> {
    pub fn new(http: reqwest::Client, endpoint: CrewEndpoint) -> Self {
        let (view, _) = watch::channel(DriverView::default());
        let (closed, _) = watch::channel(false);
        Self {
            http,
            endpoint,
            started: AtomicBool::new(false),
            view,
            closed,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<DriverView<R>> {
        self.view.subscribe()
    }

    pub fn view(&self) -> DriverView<R> {
        self.view.borrow().clone()
    }

    /// Cancel the run: an open stream is dropped and reconciliation is
    /// skipped. Has no effect once the run reached a terminal phase.
    pub fn close(&self) {
        self.closed.send_replace(true);
    }

    fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    /// Submit `payload`, follow progress, reconcile.
    ///
    /// Returns `Ok(None)` when closed before reconciliation. Fails with
    /// `AlreadyStarted` on every call after the first.
    pub async fn run(&self, payload: &Value) -> Result<Option<Reconciled<R>>> {
        if self
            .started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!("analysis already started; ignoring");
            return Err(CrewClientError::AlreadyStarted);
        }
        if self.is_closed() {
            self.finish_closed();
            return Ok(None);
        }

        self.view.send_modify(|v| v.phase = Phase::Submitting);
        let submitter = Submitter::new(self.http.clone(), self.endpoint.clone());
        let handle = match submitter.submit(payload).await {
            Ok(h) => h,
            Err(e) => {
                let message = e.to_string();
                self.view.send_modify(|v| {
                    v.phase = Phase::Done;
                    v.error = Some(message);
                });
                return Err(e);
            }
        };

        self.view
            .send_modify(|v| v.analysis_id = Some(handle.analysis_id.clone()));
        if self.is_closed() {
            tracing::debug!(analysis_id = %handle.analysis_id, "closed during submit; not streaming");
            self.finish_closed();
            return Ok(None);
        }
        let stream =
            ProgressStream::open(self.endpoint.authorize(self.http.get(&handle.stream_url)));
        self.follow(&handle.analysis_id, stream).await
    }

    /// Stream until terminal snapshot, transport error, server close or
    /// cancellation; then reconcile exactly once unless cancelled.
    async fn follow(
        &self,
        analysis_id: &str,
        mut stream: ProgressStream,
    ) -> Result<Option<Reconciled<R>>> {
        self.view.send_modify(|v| v.phase = Phase::Connecting);
        let mut closed = self.closed.subscribe();
        loop {
            tokio::select! {
                _ = closed.wait_for(|c| *c) => {
                    tracing::debug!(analysis_id, "stream closed by consumer");
                    self.finish_closed();
                    return Ok(None);
                }
                item = stream.next() => match item {
                    Some(Ok(snapshot)) => {
                        let terminal = snapshot.is_terminal();
                        self.view.send_modify(|v| {
                            v.phase = Phase::Streaming;
                            v.snapshot = Some(snapshot);
                        });
                        if terminal {
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        tracing::warn!(analysis_id, error = %e, "progress stream failed; reconciling");
                        break;
                    }
                    None => {
                        tracing::debug!(analysis_id, "progress stream ended");
                        break;
                    }
                }
            }
        }
        drop(stream);

        self.view.send_modify(|v| v.phase = Phase::Reconciling);
        let reconciled = fetch_final::<R>(&self.http, &self.endpoint, analysis_id).await;
        self.view.send_modify(|v| {
            v.phase = Phase::Done;
            if let Some(pipeline) = &reconciled.pipeline {
                v.snapshot = Some(pipeline.clone());
            }
            v.reconciled = Some(reconciled.clone());
        });
        Ok(Some(reconciled))
    }

    fn finish_closed(&self) {
        self.view.send_modify(|v| v.phase = Phase::Closed);
    }
}

impl<R: CategoryResults> Drop for PipelineDriver<R> {
    fn drop(&mut self) {
        self.closed.send_replace(true);
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────
