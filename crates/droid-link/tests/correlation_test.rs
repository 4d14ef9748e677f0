//! Request/response correlation tests.
//!
//! Time is paused so timeouts resolve deterministically.

use std::sync::Arc;
use std::time::Duration;

use droid_link::protocol::{decode_notification, encode_notification, NotifyMessage};
use droid_link::{LinkError, ResponseRouter};

const FIRMWARE_RESPONSE: u8 = 0x81;

fn notify(command_id: u8, payload: &[u8]) -> NotifyMessage {
    decode_notification(&encode_notification(command_id, 0, 0, payload)).unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_fifo_resolution() {
    let router = ResponseRouter::new();
    let first = router.register_wait(FIRMWARE_RESPONSE);
    let second = router.register_wait(FIRMWARE_RESPONSE);

    assert!(router.on_notification(&notify(FIRMWARE_RESPONSE, b"A")));
    assert!(router.on_notification(&notify(FIRMWARE_RESPONSE, b"B")));

    let timeout = Duration::from_secs(1);
    assert_eq!(router.await_response(first, timeout).await.unwrap(), b"A");
    assert_eq!(router.await_response(second, timeout).await.unwrap(), b"B");
    assert_eq!(router.pending(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_waiter_resolved_while_waiting() {
    let router = Arc::new(ResponseRouter::new());
    let handle = router.register_wait(FIRMWARE_RESPONSE);

    let responder = {
        let router = router.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            router.on_notification(&notify(FIRMWARE_RESPONSE, &[1, 2, 3]))
        })
    };

    let payload = router
        .await_response(handle, Duration::from_secs(1))
        .await
        .unwrap();
    assert_eq!(payload, vec![1, 2, 3]);
    assert!(responder.await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_timed_out_waiter_not_resolved_later() {
    let router = ResponseRouter::new();
    let stale = router.register_wait(FIRMWARE_RESPONSE);

    let err = router
        .await_response(stale, Duration::from_secs(1))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LinkError::TimedOut {
            command_id: FIRMWARE_RESPONSE,
            timeout_ms: 1000
        }
    ));
    assert_eq!(router.pending(), 0);

    // Late response with nobody waiting is dropped.
    assert!(!router.on_notification(&notify(FIRMWARE_RESPONSE, b"late")));

    // A fresh waiter gets the next response, not a stale one.
    let fresh = router.register_wait(FIRMWARE_RESPONSE);
    assert!(router.on_notification(&notify(FIRMWARE_RESPONSE, b"fresh")));
    assert_eq!(
        router.await_response(fresh, Duration::from_secs(1)).await.unwrap(),
        b"fresh"
    );
}

#[tokio::test(start_paused = true)]
async fn test_timeout_skips_to_next_waiter() {
    let router = Arc::new(ResponseRouter::new());
    let slow = router.register_wait(FIRMWARE_RESPONSE);
    let patient = router.register_wait(FIRMWARE_RESPONSE);

    let err = router
        .await_response(slow, Duration::from_millis(100))
        .await
        .unwrap_err();
    assert!(err.is_timeout());

    assert!(router.on_notification(&notify(FIRMWARE_RESPONSE, b"ok")));
    assert_eq!(
        router.await_response(patient, Duration::from_secs(1)).await.unwrap(),
        b"ok"
    );
}

#[tokio::test(start_paused = true)]
async fn test_cancel_removes_waiter() {
    let router = ResponseRouter::new();
    let handle = router.register_wait(FIRMWARE_RESPONSE);
    assert_eq!(router.pending_for(FIRMWARE_RESPONSE), 1);

    router.cancel(handle);
    assert_eq!(router.pending(), 0);
    assert!(!router.on_notification(&notify(FIRMWARE_RESPONSE, b"x")));
}
