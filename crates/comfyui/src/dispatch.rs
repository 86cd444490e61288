//! Health-gated job dispatch and deferred scheduling.
//!
//! [`JobDispatcher`] turns a single submission attempt into a
//! [`DispatchResult`]; nothing on this path retries. [`DispatchScheduler`]
//! defers dispatch by a fixed delay after capture so the HTTP response
//! never waits on ComfyUI, and keeps at most one unfired task: scheduling
//! a new capture cancels a predecessor that has not fired yet
//! (last-writer-wins). A task that already started submitting runs to
//! completion.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::api::{ComfyUIApi, ComfyUIApiError, SubmitResponse};
use crate::workflow::Workflow;

/// Transport seam over the ComfyUI endpoints the dispatcher needs.
///
/// [`ComfyUIApi`] is the production implementation; tests substitute
/// stubs to assert call counts and error mapping.
#[async_trait]
pub trait ComputeTransport: Send + Sync {
    async fn health_check(&self) -> Result<(), ComfyUIApiError>;
    async fn submit_workflow(
        &self,
        workflow: &Workflow,
        client_id: &str,
    ) -> Result<SubmitResponse, ComfyUIApiError>;
}

#[async_trait]
impl ComputeTransport for ComfyUIApi {
    async fn health_check(&self) -> Result<(), ComfyUIApiError> {
        ComfyUIApi::health_check(self).await
    }

    async fn submit_workflow(
        &self,
        workflow: &Workflow,
        client_id: &str,
    ) -> Result<SubmitResponse, ComfyUIApiError> {
        ComfyUIApi::submit_workflow(self, workflow, client_id).await
    }
}

/// Classification of a failed dispatch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchErrorKind {
    /// The health probe failed; the job was never submitted.
    ServiceUnavailable,
    /// ComfyUI was reachable but rejected the job with a non-success
    /// status.
    RemoteRejected,
    /// Transport-level failure (timeout, connection refused) during
    /// submission.
    Unreachable,
}

/// Outcome of a single dispatch attempt.
///
/// Produced exactly once per attempt and recorded for operators; the
/// HTTP caller that triggered the capture has long since been answered.
#[derive(Debug, Clone)]
pub struct DispatchResult {
    pub accepted: bool,
    /// Server-assigned job id, on acceptance.
    pub prompt_id: Option<String>,
    /// Position in the execution queue, on acceptance.
    pub queue_position: Option<i32>,
    pub error_kind: Option<DispatchErrorKind>,
    pub detail: Option<String>,
}

impl DispatchResult {
    fn accepted(response: SubmitResponse) -> Self {
        Self {
            accepted: true,
            prompt_id: Some(response.prompt_id),
            queue_position: Some(response.number),
            error_kind: None,
            detail: None,
        }
    }

    fn failed(kind: DispatchErrorKind, detail: String) -> Self {
        Self {
            accepted: false,
            prompt_id: None,
            queue_position: None,
            error_kind: Some(kind),
            detail: Some(detail),
        }
    }
}

/// Single-attempt, health-gated job submission.
pub struct JobDispatcher {
    transport: Arc<dyn ComputeTransport>,
}

impl JobDispatcher {
    pub fn new(transport: Arc<dyn ComputeTransport>) -> Self {
        Self { transport }
    }

    /// Probe ComfyUI, then submit the job once.
    ///
    /// An unhealthy instance short-circuits to `ServiceUnavailable`
    /// without performing the POST. A rejection keeps the raw response
    /// body as `detail`; a transport failure maps to `Unreachable`.
    pub async fn dispatch(&self, workflow: &Workflow, client_id: &str) -> DispatchResult {
        if let Err(e) = self.transport.health_check().await {
            return DispatchResult::failed(DispatchErrorKind::ServiceUnavailable, e.to_string());
        }

        match self.transport.submit_workflow(workflow, client_id).await {
            Ok(response) => DispatchResult::accepted(response),
            Err(ComfyUIApiError::ApiError { status: _, body }) => {
                DispatchResult::failed(DispatchErrorKind::RemoteRejected, body)
            }
            Err(e @ ComfyUIApiError::Request(_)) => {
                DispatchResult::failed(DispatchErrorKind::Unreachable, e.to_string())
            }
        }
    }
}

/// The `client_id` sent with a dispatch, derived from the capture's
/// generation id so queued prompts correlate back to the frame that
/// produced them.
pub fn client_id_for(generation: u64) -> String {
    format!("meshcam-gen-{generation:06}")
}

/// Defers job submission by a fixed delay after capture.
///
/// ComfyUI reads the input file by name when the job executes; the delay
/// is a crude stand-in for a real file-readiness signal. At most one
/// unfired task exists at a time.
pub struct DispatchScheduler {
    dispatcher: Arc<JobDispatcher>,
    delay: Duration,
    pending: Mutex<Option<PendingDispatch>>,
    /// Master token, cancelled on shutdown.
    shutdown: CancellationToken,
}

struct PendingDispatch {
    generation: u64,
    cancel: CancellationToken,
}

impl DispatchScheduler {
    pub fn new(dispatcher: Arc<JobDispatcher>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            dispatcher,
            delay,
            pending: Mutex::new(None),
            shutdown: CancellationToken::new(),
        })
    }

    /// Register a one-shot deferred dispatch for `generation`.
    ///
    /// Returns immediately. Any not-yet-fired predecessor is cancelled
    /// and replaced. Submission failures are logged, never retried, and
    /// never surfaced to the capture caller.
    pub fn schedule(self: &Arc<Self>, job: Workflow, generation: u64) {
        let cancel = self.shutdown.child_token();

        {
            let mut pending = self.pending.lock().expect("pending dispatch lock poisoned");
            if let Some(previous) = pending.take() {
                previous.cancel.cancel();
                tracing::debug!(
                    replaced = previous.generation,
                    by = generation,
                    "Replaced pending dispatch"
                );
            }
            *pending = Some(PendingDispatch {
                generation,
                cancel: cancel.clone(),
            });
        }

        let scheduler = Arc::clone(self);
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {
                    scheduler.clear_pending(generation);
                    tracing::debug!(generation, "Pending dispatch cancelled before firing");
                    return;
                }
                _ = tokio::time::sleep(scheduler.delay) => {}
            }

            // Fired: the slot is free for the next capture while we submit.
            scheduler.clear_pending(generation);

            let client_id = client_id_for(generation);
            let result = scheduler.dispatcher.dispatch(&job, &client_id).await;

            match result.error_kind {
                None => tracing::info!(
                    generation,
                    client_id = %client_id,
                    prompt_id = result.prompt_id.as_deref().unwrap_or(""),
                    queue_position = ?result.queue_position,
                    "ComfyUI accepted job"
                ),
                Some(kind) => tracing::warn!(
                    generation,
                    client_id = %client_id,
                    kind = ?kind,
                    detail = result.detail.as_deref().unwrap_or(""),
                    "Job dispatch failed"
                ),
            }
        });
    }

    /// True while a scheduled dispatch has not fired yet.
    pub fn has_pending(&self) -> bool {
        self.pending
            .lock()
            .expect("pending dispatch lock poisoned")
            .is_some()
    }

    /// Cancel any unfired dispatch; used during graceful shutdown.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Release the pending slot if it still belongs to `generation`.
    fn clear_pending(&self, generation: u64) {
        let mut pending = self.pending.lock().expect("pending dispatch lock poisoned");
        if pending.as_ref().is_some_and(|p| p.generation == generation) {
            *pending = None;
        }
    }
}
