//! # Bulk Sync Orchestrator
//!
//! Runs a batch of videos through the upload queue one at a time, in input
//! order, and aggregates the outcomes into a [`BatchSummary`].
//!
//! ## Workflow
//!
//! For each video id:
//! 1. Stop if the batch was cancelled or the quota latch is set
//! 2. Load the video and classify it as create (no remote id) or update
//! 3. Emit `0 "Starting..."` (and `50 "Updating..."` for updates)
//! 4. Enqueue it and wait for the task to settle
//! 5. Emit `100 "Success"` or `100 "Error: <message>"`
//!
//! A quota failure halts the rest of the batch. Remaining ids are neither
//! dispatched nor counted. Batches may run concurrently over the shared
//! queue; when another batch's item latches the quota while ours is still
//! pending, the batch stops waiting and the item stays queued until the latch
//! is cleared.

use crate::error::SyncError;
use crate::upload_queue::{UploadHandle, UploadOutcome, UploadQueue};
use core_library::VideoRepository;
use core_runtime::events::{CoreEvent, EventBus, SyncEvent, UploadEvent};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// One failed item of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchError {
    pub video_id: i64,
    pub title: String,
    pub message: String,
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error with video {}: {}", self.title, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub batch_id: String,
    pub success_count: u32,
    pub failed_count: u32,
    pub errors: Vec<BatchError>,
    /// A quota failure stopped the batch, or the latch was already set.
    pub halted_by_quota: bool,
    pub cancelled: bool,
}

impl BatchSummary {
    fn new() -> Self {
        Self {
            batch_id: Uuid::new_v4().to_string(),
            success_count: 0,
            failed_count: 0,
            errors: Vec::new(),
            halted_by_quota: false,
            cancelled: false,
        }
    }

    fn record_failure(&mut self, video_id: i64, title: String, message: String) {
        self.failed_count += 1;
        self.errors.push(BatchError {
            video_id,
            title,
            message,
        });
    }

    /// End-of-batch alert text.
    pub fn message(&self) -> String {
        let mut text = format!(
            "Process completed:\n{} successful\n{} failed",
            self.success_count, self.failed_count
        );
        if !self.errors.is_empty() {
            text.push_str("\n\nErrors:\n");
            let lines: Vec<String> = self.errors.iter().map(ToString::to_string).collect();
            text.push_str(&lines.join("\n"));
        }
        text
    }
}

pub struct BulkSyncOrchestrator {
    queue: UploadQueue,
    videos: VideoRepository,
    event_bus: EventBus,
}

impl BulkSyncOrchestrator {
    pub fn new(queue: UploadQueue, videos: VideoRepository, event_bus: EventBus) -> Self {
        Self {
            queue,
            videos,
            event_bus,
        }
    }

    pub async fn run(&self, video_ids: &[i64], upload_thumbnail: bool) -> BatchSummary {
        self.run_with_cancellation(video_ids, upload_thumbnail, &CancellationToken::new())
            .await
    }

    /// Like [`run`](Self::run); `cancel` is checked before each item and never
    /// interrupts the one in flight.
    #[instrument(skip(self, video_ids, cancel), fields(total = video_ids.len()))]
    pub async fn run_with_cancellation(
        &self,
        video_ids: &[i64],
        upload_thumbnail: bool,
        cancel: &CancellationToken,
    ) -> BatchSummary {
        let mut summary = BatchSummary::new();
        info!(batch_id = %summary.batch_id, "Starting batch");
        self.emit(CoreEvent::Sync(SyncEvent::BatchStarted {
            batch_id: summary.batch_id.clone(),
            total: video_ids.len() as u32,
        }));

        for &video_id in video_ids {
            if cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }
            if self.queue.is_quota_latched() {
                warn!(video_id, "Quota latch is set; not dispatching");
                summary.halted_by_quota = true;
                break;
            }

            let video = match self.videos.get(video_id).await {
                Ok(video) => video,
                Err(e) => {
                    let message = SyncError::from(e).to_string();
                    self.progress(video_id, 100, format!("Error: {}", message));
                    summary.record_failure(video_id, video_id.to_string(), message);
                    continue;
                }
            };
            let title = video.display_title().to_string();

            self.progress(video_id, 0, "Starting...");
            if !video.is_upload_candidate() {
                self.progress(video_id, 50, "Updating...");
            }

            let outcome = match self.queue.enqueue(video_id, upload_thumbnail) {
                Ok(handle) => match self.settle(handle).await {
                    Some(outcome) => outcome,
                    None => {
                        warn!(video_id, "Quota latched by another task; leaving item queued");
                        summary.halted_by_quota = true;
                        break;
                    }
                },
                Err(e) => UploadOutcome::Failed {
                    message: e.to_string(),
                },
            };

            match outcome {
                UploadOutcome::Completed { .. } => {
                    summary.success_count += 1;
                    self.progress(video_id, 100, "Success");
                }
                UploadOutcome::Failed { message } => {
                    self.progress(video_id, 100, format!("Error: {}", message));
                    summary.record_failure(video_id, title, message);
                }
                UploadOutcome::QuotaExceeded { .. } => {
                    warn!(video_id, "Quota exceeded; halting batch");
                    summary.halted_by_quota = true;
                    break;
                }
                UploadOutcome::Cancelled => {
                    info!(video_id, "Item cancelled while queued");
                }
            }
        }

        info!(
            batch_id = %summary.batch_id,
            success = summary.success_count,
            failed = summary.failed_count,
            halted_by_quota = summary.halted_by_quota,
            cancelled = summary.cancelled,
            "Batch finished"
        );
        self.emit(CoreEvent::Sync(SyncEvent::BatchCompleted {
            batch_id: summary.batch_id.clone(),
            success_count: summary.success_count,
            failed_count: summary.failed_count,
            halted_by_quota: summary.halted_by_quota,
            cancelled: summary.cancelled,
        }));

        summary
    }

    /// Waits for the task, or returns `None` if the queue latches while it
    /// is still pending.
    async fn settle(&self, handle: UploadHandle) -> Option<UploadOutcome> {
        let video_id = handle.video_id();
        let outcome = handle.outcome();
        tokio::pin!(outcome);

        tokio::select! {
            biased;
            settled = &mut outcome => Some(settled),
            _ = self.queue.latched() => {
                if self.queue.is_pending(video_id) {
                    None
                } else {
                    // Ours was the task that latched; its outcome follows.
                    Some(outcome.await)
                }
            }
        }
    }

    fn progress(&self, video_id: i64, percent: u8, status: impl Into<String>) {
        self.emit(CoreEvent::Upload(UploadEvent::Progress {
            video_id,
            percent,
            status: status.into(),
        }));
    }

    fn emit(&self, event: CoreEvent) {
        self.event_bus.emit(event).ok();
    }
}
