//! # Event Bus System
//!
//! Typed broadcast events for the channel studio core, built on
//! `tokio::sync::broadcast`. The host UI subscribes once and updates video rows,
//! alerts and account badges from the stream; the core never assumes how events
//! are rendered.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     emit      ┌───────────┐
//! │ TokenGuard   ├──────────────>│           │
//! └──────────────┘               │           │
//!                                │ EventBus  │
//! ┌──────────────┐     emit      │ (broadcast│     subscribe    ┌────────────┐
//! │ UploadQueue  ├──────────────>│  channel) ├─────────────────>│  Host UI   │
//! └──────────────┘               │           │                  └────────────┘
//!                                │           │
//! ┌──────────────┐     emit      │           │
//! │ Orchestrator ├──────────────>│           │
//! └──────────────┘               └───────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, UploadEvent};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let event_bus = EventBus::new(100);
//! let mut rx = event_bus.subscribe();
//!
//! event_bus
//!     .emit(CoreEvent::Upload(UploadEvent::Completed {
//!         video_id: 10,
//!         remote_id: "abc".to_string(),
//!     }))
//!     .ok();
//!
//! let event = rx.recv().await.unwrap();
//! assert!(matches!(event, CoreEvent::Upload(UploadEvent::Completed { .. })));
//! # }
//! ```
//!
//! ## Event Types
//!
//! ### Upload Events (one row of the host table each)
//! - `Progress`: percent and status text for a video
//! - `Completed`: remote create/update settled successfully
//! - `Failed`: remote create/update settled with an error message
//! - `QuotaExceeded`: provider quota exhausted; the queue latch is now set
//! - `Cancelled`: a pending upload was removed before it ran
//!
//! ### Auth Events
//! - `TokenRefreshing`, `TokenRefreshed`, `AuthError`
//!
//! ### Sync Events
//! - `BatchStarted`, `BatchCompleted` for bulk upload/update batches
//! - `ReconciliationStarted`, `ReconciliationCompleted`, `ReconciliationFailed`
//!   for the pull-direction account sync
//!
//! ## Error Handling
//!
//! `RecvError::Lagged(n)` means a subscriber fell behind and missed `n` events;
//! it can keep receiving. `RecvError::Closed` means every sender is gone.
//! Emitters treat "no subscribers" as success (`emit(..).ok()`).

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum published on the bus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    Upload(UploadEvent),
    Auth(AuthEvent),
    Sync(SyncEvent),
}

impl CoreEvent {
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Upload(e) => e.description(),
            CoreEvent::Auth(e) => e.description(),
            CoreEvent::Sync(e) => e.description(),
        }
    }

    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Upload(UploadEvent::Failed { .. }) => EventSeverity::Error,
            CoreEvent::Upload(UploadEvent::QuotaExceeded { .. }) => EventSeverity::Warning,
            CoreEvent::Auth(AuthEvent::AuthError { .. }) => EventSeverity::Error,
            CoreEvent::Sync(SyncEvent::ReconciliationFailed { .. }) => EventSeverity::Error,
            CoreEvent::Upload(UploadEvent::Completed { .. }) => EventSeverity::Info,
            CoreEvent::Sync(SyncEvent::BatchCompleted { .. }) => EventSeverity::Info,
            CoreEvent::Sync(SyncEvent::ReconciliationCompleted { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }

    /// The local video row this event concerns, if any.
    pub fn video_id(&self) -> Option<i64> {
        match self {
            CoreEvent::Upload(e) => Some(e.video_id()),
            _ => None,
        }
    }
}

/// Event severity, used by hosts to pick a presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Upload Events
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum UploadEvent {
    Progress {
        video_id: i64,
        percent: u8,
        status: String,
    },
    Completed {
        video_id: i64,
        remote_id: String,
    },
    Failed {
        video_id: i64,
        message: String,
    },
    QuotaExceeded {
        video_id: i64,
    },
    Cancelled {
        video_id: i64,
    },
}

impl UploadEvent {
    fn description(&self) -> &str {
        match self {
            UploadEvent::Progress { .. } => "Upload in progress",
            UploadEvent::Completed { .. } => "Upload completed",
            UploadEvent::Failed { .. } => "Upload failed",
            UploadEvent::QuotaExceeded { .. } => "Remote API quota exceeded",
            UploadEvent::Cancelled { .. } => "Upload cancelled",
        }
    }

    pub fn video_id(&self) -> i64 {
        match self {
            UploadEvent::Progress { video_id, .. }
            | UploadEvent::Completed { video_id, .. }
            | UploadEvent::Failed { video_id, .. }
            | UploadEvent::QuotaExceeded { video_id }
            | UploadEvent::Cancelled { video_id } => *video_id,
        }
    }

    /// Whether this event ends the lifecycle of an upload task.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, UploadEvent::Progress { .. })
    }
}

// ============================================================================
// Authentication Events
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum AuthEvent {
    TokenRefreshing {
        account_id: i64,
    },
    TokenRefreshed {
        account_id: i64,
        /// Unix timestamp (seconds)
        expires_at: i64,
    },
    AuthError {
        account_id: Option<i64>,
        message: String,
        recoverable: bool,
    },
}

impl AuthEvent {
    fn description(&self) -> &str {
        match self {
            AuthEvent::TokenRefreshing { .. } => "Refreshing access token",
            AuthEvent::TokenRefreshed { .. } => "Token refreshed successfully",
            AuthEvent::AuthError { .. } => "Authentication error",
        }
    }
}

// ============================================================================
// Sync Events
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum SyncEvent {
    BatchStarted {
        batch_id: String,
        total: u32,
    },
    BatchCompleted {
        batch_id: String,
        success_count: u32,
        failed_count: u32,
        halted_by_quota: bool,
        cancelled: bool,
    },
    ReconciliationStarted {
        account_id: i64,
    },
    ReconciliationCompleted {
        account_id: i64,
        channels_inserted: u32,
        channels_updated: u32,
        videos_inserted: u32,
        videos_updated: u32,
    },
    ReconciliationFailed {
        account_id: i64,
        message: String,
    },
}

impl SyncEvent {
    fn description(&self) -> &str {
        match self {
            SyncEvent::BatchStarted { .. } => "Batch started",
            SyncEvent::BatchCompleted { .. } => "Batch completed",
            SyncEvent::ReconciliationStarted { .. } => "Account sync started",
            SyncEvent::ReconciliationCompleted { .. } => "Account sync completed",
            SyncEvent::ReconciliationFailed { .. } => "Account sync failed",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central broadcast channel. Cloning shares the same channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event; fails only when nobody is subscribed.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// Receiver wrapper with an optional predicate.
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}
