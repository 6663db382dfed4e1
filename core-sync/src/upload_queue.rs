//! # Upload Queue
//!
//! Process-wide, single-flight queue of remote mutations (creates and
//! updates).
//!
//! ## Overview
//!
//! - Pending tasks run strictly in order; only `pause` (to the tail) and
//!   `resume` (to the head) reorder them.
//! - At most one task is active. A single drain task is started when work is
//!   enqueued and exits as soon as the pending list is empty, so there is never
//!   a second drain loop.
//! - Every task settles exactly once, through the [`UploadHandle`] returned by
//!   `enqueue` and through one terminal [`UploadEvent`].
//! - A quota failure latches the queue: nothing else starts until
//!   [`UploadQueue::clear_quota_latch`] is called. Pending tasks stay queued.
//!   Callers waiting on a pending task can watch [`UploadQueue::latched`],
//!   since a latched queue will not settle that task on its own.
//!
//! ## Task states
//!
//! `Pending -> Active -> {Completed | Failed | QuotaExceeded}`, or
//! `Pending -> Cancelled`. Terminal states are final.

use crate::error::{Result, SyncError};
use async_trait::async_trait;
use core_runtime::events::{CoreEvent, EventBus, UploadEvent};
use futures::FutureExt;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::{oneshot, watch};
use tracing::{debug, info, instrument, warn};

/// One queued remote mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadTask {
    pub video_id: i64,
    pub upload_thumbnail: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Pending,
    Active,
    Completed,
    Failed,
    QuotaExceeded,
    Cancelled,
}

/// How a task settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum UploadOutcome {
    /// `remote_id` is the id created, or the one that was updated.
    Completed { remote_id: String },
    Failed { message: String },
    QuotaExceeded { message: String },
    Cancelled,
}

impl UploadOutcome {
    pub fn state(&self) -> TaskState {
        match self {
            UploadOutcome::Completed { .. } => TaskState::Completed,
            UploadOutcome::Failed { .. } => TaskState::Failed,
            UploadOutcome::QuotaExceeded { .. } => TaskState::QuotaExceeded,
            UploadOutcome::Cancelled => TaskState::Cancelled,
        }
    }
}

/// Performs the remote side of a task.
///
/// Returns the remote id of the video on success. A
/// [`SyncError::QuotaExceeded`] latches the queue.
#[async_trait]
pub trait UploadExecutor: Send + Sync {
    async fn execute(&self, task: &UploadTask) -> Result<String>;
}

/// Resolves once the task settles.
#[derive(Debug)]
pub struct UploadHandle {
    video_id: i64,
    receiver: oneshot::Receiver<UploadOutcome>,
}

impl UploadHandle {
    pub fn video_id(&self) -> i64 {
        self.video_id
    }

    /// Waits for the task to settle. A queue dropped with the task still
    /// pending reads as `Cancelled`.
    pub async fn outcome(self) -> UploadOutcome {
        self.receiver.await.unwrap_or(UploadOutcome::Cancelled)
    }
}

/// Point-in-time view of the queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSnapshot {
    pub active: Option<i64>,
    pub pending: Vec<i64>,
    pub quota_latched: bool,
}

struct PendingTask {
    task: UploadTask,
    responder: oneshot::Sender<UploadOutcome>,
}

#[derive(Default)]
struct QueueState {
    pending: VecDeque<PendingTask>,
    active: Option<i64>,
    quota_latched: bool,
    draining: bool,
}

impl QueueState {
    fn position(&self, video_id: i64) -> Option<usize> {
        self.pending
            .iter()
            .position(|entry| entry.task.video_id == video_id)
    }

    /// Marks the drain loop as running; `false` if it already is or cannot run.
    fn claim_drain(&mut self) -> bool {
        if self.draining || self.quota_latched || self.pending.is_empty() {
            return false;
        }
        self.draining = true;
        true
    }
}

struct QueueInner {
    state: Mutex<QueueState>,
    /// Mirrors `QueueState::quota_latched`; written under the state lock.
    latch: watch::Sender<bool>,
    executor: Arc<dyn UploadExecutor>,
    event_bus: EventBus,
}

/// The single upload queue. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct UploadQueue {
    inner: Arc<QueueInner>,
}

impl UploadQueue {
    pub fn new(executor: Arc<dyn UploadExecutor>, event_bus: EventBus) -> Self {
        Self {
            inner: Arc::new(QueueInner {
                state: Mutex::new(QueueState::default()),
                latch: watch::channel(false).0,
                executor,
                event_bus,
            }),
        }
    }

    /// Appends a task to the tail and starts draining if idle.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// `AlreadyQueued` if the video is pending or active.
    pub fn enqueue(&self, video_id: i64, upload_thumbnail: bool) -> Result<UploadHandle> {
        let (responder, receiver) = oneshot::channel();

        let start = {
            let mut state = self.inner.state.lock();
            if state.active == Some(video_id) || state.position(video_id).is_some() {
                return Err(SyncError::AlreadyQueued { video_id });
            }
            state.pending.push_back(PendingTask {
                task: UploadTask {
                    video_id,
                    upload_thumbnail,
                },
                responder,
            });
            state.claim_drain()
        };

        debug!(video_id, "Enqueued upload");
        if start {
            self.spawn_drain();
        }

        Ok(UploadHandle { video_id, receiver })
    }

    /// Moves a pending task to the tail. The active task is unaffected.
    pub fn pause(&self, video_id: i64) -> bool {
        let mut state = self.inner.state.lock();
        match state.position(video_id) {
            Some(index) => {
                if let Some(entry) = state.pending.remove(index) {
                    state.pending.push_back(entry);
                }
                true
            }
            None => false,
        }
    }

    /// Moves a pending task to the head.
    pub fn resume(&self, video_id: i64) -> bool {
        let mut state = self.inner.state.lock();
        match state.position(video_id) {
            Some(index) => {
                if let Some(entry) = state.pending.remove(index) {
                    state.pending.push_front(entry);
                }
                true
            }
            None => false,
        }
    }

    /// Removes a pending task and settles it as cancelled. An active task is
    /// not interrupted; `false` is returned for it.
    pub fn cancel(&self, video_id: i64) -> bool {
        let removed = {
            let mut state = self.inner.state.lock();
            state
                .position(video_id)
                .and_then(|index| state.pending.remove(index))
        };

        match removed {
            Some(entry) => {
                info!(video_id, "Cancelled pending upload");
                self.inner
                    .event_bus
                    .emit(CoreEvent::Upload(UploadEvent::Cancelled { video_id }))
                    .ok();
                entry.responder.send(UploadOutcome::Cancelled).ok();
                true
            }
            None => false,
        }
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        let state = self.inner.state.lock();
        QueueSnapshot {
            active: state.active,
            pending: state.pending.iter().map(|e| e.task.video_id).collect(),
            quota_latched: state.quota_latched,
        }
    }

    pub fn is_quota_latched(&self) -> bool {
        self.inner.state.lock().quota_latched
    }

    pub fn is_pending(&self, video_id: i64) -> bool {
        self.inner.state.lock().position(video_id).is_some()
    }

    /// Resolves once the quota latch is set; immediately if it already is.
    pub async fn latched(&self) {
        let mut receiver = self.inner.latch.subscribe();
        receiver.wait_for(|latched| *latched).await.ok();
    }

    /// Clears the quota latch and resumes draining any pending tasks.
    pub fn clear_quota_latch(&self) {
        let start = {
            let mut state = self.inner.state.lock();
            state.quota_latched = false;
            self.inner.latch.send_replace(false);
            state.claim_drain()
        };

        info!("Quota latch cleared");
        if start {
            self.spawn_drain();
        }
    }

    fn spawn_drain(&self) {
        let inner = self.inner.clone();
        tokio::spawn(async move { inner.drain().await });
    }
}

impl QueueInner {
    #[instrument(skip(self))]
    async fn drain(&self) {
        loop {
            let next = {
                let mut state = self.state.lock();
                if state.quota_latched {
                    state.draining = false;
                    return;
                }
                match state.pending.pop_front() {
                    Some(entry) => {
                        state.active = Some(entry.task.video_id);
                        entry
                    }
                    None => {
                        state.draining = false;
                        return;
                    }
                }
            };

            let video_id = next.task.video_id;
            debug!(video_id, "Upload started");

            let result = AssertUnwindSafe(self.executor.execute(&next.task))
                .catch_unwind()
                .await
                .unwrap_or_else(|_| {
                    Err(SyncError::RemoteApi {
                        message: "upload task panicked".to_string(),
                    })
                });

            let outcome = match result {
                Ok(remote_id) => UploadOutcome::Completed { remote_id },
                Err(e) if e.is_quota_exceeded() => UploadOutcome::QuotaExceeded {
                    message: e.to_string(),
                },
                Err(e) => UploadOutcome::Failed {
                    message: e.to_string(),
                },
            };

            {
                let mut state = self.state.lock();
                state.active = None;
                if matches!(outcome, UploadOutcome::QuotaExceeded { .. }) {
                    state.quota_latched = true;
                    self.latch.send_replace(true);
                }
            }

            let event = match &outcome {
                UploadOutcome::Completed { remote_id } => {
                    info!(video_id, remote_id = %remote_id, "Upload completed");
                    UploadEvent::Completed {
                        video_id,
                        remote_id: remote_id.clone(),
                    }
                }
                UploadOutcome::QuotaExceeded { message } => {
                    warn!(video_id, error = %message, "Quota exceeded; queue latched");
                    UploadEvent::QuotaExceeded { video_id }
                }
                UploadOutcome::Failed { message } => {
                    warn!(video_id, error = %message, "Upload failed");
                    UploadEvent::Failed {
                        video_id,
                        message: message.clone(),
                    }
                }
                UploadOutcome::Cancelled => UploadEvent::Cancelled { video_id },
            };

            self.event_bus.emit(CoreEvent::Upload(event)).ok();
            next.responder.send(outcome).ok();
        }
    }
}
