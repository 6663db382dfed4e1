//! # Sync Module
//!
//! Push and pull synchronization between the local studio database and the
//! remote video host.
//!
//! ## Overview
//!
//! This module manages:
//! - Mapping local videos to provider metadata and calling the provider
//! - A single-flight upload queue with a process-wide quota latch
//! - Sequential bulk create/update batches with an end-of-batch summary
//! - Reconciliation of remote channel and video listings onto local rows
//! - Copying a video onto its sibling channels (apply-to-all)
//! - Assigning media files from the media folder to videos
//!
//! ## Components
//!
//! - **Remote Video Gateway** (`gateway`): create, update and thumbnail calls
//! - **Upload Queue** (`upload_queue`): FIFO with pause/resume/cancel and the quota latch
//! - **Upload Executor** (`executor`): credential check, then create or update for one task
//! - **Bulk Sync Orchestrator** (`orchestrator`): runs a batch through the queue
//! - **Reconciliation Matcher** (`reconciliation`): pull-direction account sync
//! - **Apply To All** (`propagation`): cross-channel duplication of shared fields
//! - **Media Assigner** (`media`): `<localId>-<channel>.mp4` auto-assignment

pub mod error;
pub mod executor;
pub mod gateway;
pub mod media;
pub mod orchestrator;
pub mod propagation;
pub mod reconciliation;
pub mod upload_queue;

#[cfg(test)]
mod test_support;

pub use error::{Result, SyncError};
pub use executor::VideoUploadExecutor;
pub use gateway::RemoteVideoGateway;
pub use media::{AssignmentReport, MediaAssigner};
pub use orchestrator::{BatchError, BatchSummary, BulkSyncOrchestrator};
pub use propagation::{ApplyToAll, PropagationReport, TranslatableText, VideoTranslator};
pub use reconciliation::{AccountReconciliation, ReconciliationMatcher, ReconciliationReport};
pub use upload_queue::{
    QueueSnapshot, TaskState, UploadExecutor, UploadHandle, UploadOutcome, UploadQueue, UploadTask,
};
