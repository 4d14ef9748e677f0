//! Park beacon reaction tests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use droid_link::protocol::{encode_location_beacon, LocationBeacon};
use droid_link::{
    LinkConfig, LinkError, ReactionDebouncer, ReactionHandler, ReactionOutcome, ReactionScanner,
};
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};

// ============================================================================
// Test Helpers
// ============================================================================

/// Records every script it is asked to run. Scripts in `failing` error out.
#[derive(Default)]
struct RecordingHandler {
    calls: Mutex<Vec<u8>>,
    failing: Vec<u8>,
}

impl RecordingHandler {
    fn failing(scripts: &[u8]) -> Self {
        RecordingHandler {
            calls: Mutex::new(Vec::new()),
            failing: scripts.to_vec(),
        }
    }

    fn calls(&self) -> Vec<u8> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl ReactionHandler for RecordingHandler {
    async fn react(&self, script_id: u8) -> droid_link::Result<()> {
        self.calls.lock().push(script_id);
        if self.failing.contains(&script_id) {
            return Err(LinkError::transport("write failed"));
        }
        Ok(())
    }
}

fn beacon(script_id: u8, reaction_interval: u8) -> LocationBeacon {
    LocationBeacon {
        script_id,
        reaction_interval,
        signal_strength_dbm: -60,
        droid_paired: true,
    }
}

fn debouncer(handler: Arc<RecordingHandler>) -> ReactionDebouncer {
    ReactionDebouncer::new(handler, LinkConfig::default())
}

// ============================================================================
// Debouncer
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_empty_batch_is_idle() {
    let handler = Arc::new(RecordingHandler::default());
    let debouncer = debouncer(handler.clone());

    assert_eq!(debouncer.on_scan_result(&[]).await, ReactionOutcome::Idle);
    assert!(handler.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_reaction_window() {
    let handler = Arc::new(RecordingHandler::default());
    let debouncer = debouncer(handler.clone());
    let batch = vec![("AA:BB".to_string(), beacon(3, 1))];

    let start = tokio::time::Instant::now();
    assert_eq!(
        debouncer.on_scan_result(&batch).await,
        ReactionOutcome::Reacted {
            address: "AA:BB".to_string(),
            script_id: 3
        }
    );
    // Cool-down elapsed before returning.
    assert_eq!(start.elapsed(), Duration::from_secs(5));
    assert_eq!(debouncer.last_reaction("AA:BB"), Some(start));

    // 10 s after the reaction: still inside the 60 s window.
    tokio::time::advance(Duration::from_secs(5)).await;
    assert_eq!(debouncer.on_scan_result(&batch).await, ReactionOutcome::Idle);

    // 70 s after the reaction.
    tokio::time::advance(Duration::from_secs(60)).await;
    assert!(matches!(
        debouncer.on_scan_result(&batch).await,
        ReactionOutcome::Reacted { script_id: 3, .. }
    ));
    assert_eq!(handler.calls(), vec![3, 3]);
}

#[tokio::test(start_paused = true)]
async fn test_long_interval_extends_window() {
    let handler = Arc::new(RecordingHandler::default());
    let debouncer = debouncer(handler.clone());
    // 20 * 5 s = 100 s window.
    let batch = vec![("AA:BB".to_string(), beacon(2, 20))];

    debouncer.on_scan_result(&batch).await;
    tokio::time::advance(Duration::from_secs(75)).await;
    assert_eq!(debouncer.on_scan_result(&batch).await, ReactionOutcome::Idle);
    tokio::time::advance(Duration::from_secs(20)).await;
    assert!(matches!(
        debouncer.on_scan_result(&batch).await,
        ReactionOutcome::Reacted { .. }
    ));
}

#[tokio::test(start_paused = true)]
async fn test_one_reaction_per_batch() {
    let handler = Arc::new(RecordingHandler::default());
    let debouncer = debouncer(handler.clone());
    let batch = vec![
        ("first".to_string(), beacon(1, 1)),
        ("second".to_string(), beacon(2, 1)),
    ];

    assert_eq!(
        debouncer.on_scan_result(&batch).await,
        ReactionOutcome::Reacted {
            address: "first".to_string(),
            script_id: 1
        }
    );
    assert_eq!(handler.calls(), vec![1]);
    assert!(debouncer.last_reaction("second").is_none());

    // The second beacon was never reacted to, so it is eligible next time.
    assert_eq!(
        debouncer.on_scan_result(&batch).await,
        ReactionOutcome::Reacted {
            address: "second".to_string(),
            script_id: 2
        }
    );
}

#[tokio::test(start_paused = true)]
async fn test_handler_error_falls_through() {
    let handler = Arc::new(RecordingHandler::failing(&[1]));
    let debouncer = debouncer(handler.clone());
    let batch = vec![
        ("broken".to_string(), beacon(1, 1)),
        ("working".to_string(), beacon(2, 1)),
    ];

    assert_eq!(
        debouncer.on_scan_result(&batch).await,
        ReactionOutcome::Reacted {
            address: "working".to_string(),
            script_id: 2
        }
    );
    assert_eq!(handler.calls(), vec![1, 2]);
    assert!(debouncer.last_reaction("broken").is_none());
}

#[tokio::test(start_paused = true)]
async fn test_all_handlers_fail() {
    let handler = Arc::new(RecordingHandler::failing(&[1]));
    let debouncer = debouncer(handler.clone());
    let batch = vec![("broken".to_string(), beacon(1, 1))];

    let start = tokio::time::Instant::now();
    assert_eq!(debouncer.on_scan_result(&batch).await, ReactionOutcome::Idle);
    // No cool-down without a reaction.
    assert_eq!(start.elapsed(), Duration::ZERO);
    assert!(debouncer.last_reaction("broken").is_none());
}

// ============================================================================
// Scanner
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_scanner_filters_and_stops_on_close() {
    let handler = Arc::new(RecordingHandler::default());
    let debouncer = Arc::new(debouncer(handler.clone()));
    let scanner = ReactionScanner::new(debouncer.clone());

    let (tx, rx) = mpsc::channel(4);
    let (_stop_tx, stop_rx) = watch::channel(false);

    tx.send(vec![
        ("droid".to_string(), vec![0x03, 0x04, 0x44, 0x81, 0x82, 0x01]),
        ("garbage".to_string(), vec![0xFF]),
        ("park".to_string(), encode_location_beacon(5, 2, -70, true).unwrap()),
    ])
    .await
    .unwrap();
    drop(tx);

    scanner.run(rx, stop_rx).await;
    assert_eq!(handler.calls(), vec![5]);
    assert!(debouncer.last_reaction("park").is_some());
}

#[tokio::test(start_paused = true)]
async fn test_scanner_stop_signal() {
    let handler = Arc::new(RecordingHandler::default());
    let scanner = ReactionScanner::new(Arc::new(debouncer(handler.clone())));

    let (_tx, rx) = mpsc::channel(4);
    let (stop_tx, stop_rx) = watch::channel(false);

    let task = tokio::spawn(async move { scanner.run(rx, stop_rx).await });
    stop_tx.send(true).unwrap();
    task.await.unwrap();
    assert!(handler.calls().is_empty());
}
