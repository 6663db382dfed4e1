//! Integration tests for logging initialization and event delivery

use bridge_traits::time::LogLevel;
use core_runtime::events::{
    AuthEvent, CoreEvent, EventBus, EventSeverity, EventStream, SyncEvent, UploadEvent,
};
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};

#[test]
fn test_logging_initializes_once() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Warn);

    // A second subscriber in the same process is rejected rather than replacing the first.
    let first = init_logging(config.clone());
    let second = init_logging(config);

    assert!(first.is_ok());
    assert!(second.is_err());
}

#[tokio::test]
async fn test_upload_lifecycle_reaches_ui_subscriber() {
    let bus = EventBus::default();
    let mut row_updates =
        EventStream::new(bus.subscribe()).filter(|event| matches!(event, CoreEvent::Upload(_)));

    let emitter = bus.clone();
    let producer = tokio::spawn(async move {
        emitter
            .emit(CoreEvent::Auth(AuthEvent::TokenRefreshing { account_id: 1 }))
            .ok();
        emitter
            .emit(CoreEvent::Upload(UploadEvent::Progress {
                video_id: 7,
                percent: 0,
                status: "Starting...".to_string(),
            }))
            .ok();
        emitter
            .emit(CoreEvent::Upload(UploadEvent::Completed {
                video_id: 7,
                remote_id: "dQw4w9WgXcQ".to_string(),
            }))
            .ok();
        emitter
            .emit(CoreEvent::Sync(SyncEvent::BatchCompleted {
                batch_id: "b-1".to_string(),
                success_count: 1,
                failed_count: 0,
                halted_by_quota: false,
                cancelled: false,
            }))
            .ok();
    });
    producer.await.unwrap();

    let first = row_updates.recv().await.unwrap();
    let second = row_updates.recv().await.unwrap();

    assert!(matches!(
        first,
        CoreEvent::Upload(UploadEvent::Progress { percent: 0, .. })
    ));
    assert_eq!(second.severity(), EventSeverity::Info);
    assert_eq!(second.video_id(), Some(7));
    assert!(row_updates.try_recv().is_none());
}
