//! Unit tests for ChangeFanout
//!
//! Covers registration bookkeeping, delivery to every subscriber of an id,
//! id isolation, cleanup on drop and the drop-newest overflow policy.

use std::collections::BTreeSet;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;

use tokio::time::timeout;
use tokio::time::Duration;
use tracing_test::traced_test;

use super::*;
use crate::FanoutConfig;

fn fanout(buffer_size: usize) -> ChangeFanout<String, String> {
    ChangeFanout::new(FanoutConfig {
        subscriber_buffer_size: buffer_size,
        enable_metrics: true,
    })
}

fn keys(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_subscribe_single() {
    let fanout = fanout(8);
    let _sub = fanout.subscribe("t1".to_string());

    assert_eq!(fanout.subscriber_count(&"t1".to_string()), 1);
    assert_eq!(fanout.watched_id_count(), 1);
}

#[tokio::test]
async fn test_subscribe_multiple_same_id() {
    let fanout = fanout(8);
    let a = fanout.subscribe("t1".to_string());
    let b = fanout.subscribe("t1".to_string());
    let _c = fanout.subscribe("t1".to_string());

    assert_ne!(a.id(), b.id());
    assert_eq!(fanout.subscriber_count(&"t1".to_string()), 3);
    assert_eq!(fanout.watched_id_count(), 1);
}

#[tokio::test]
async fn test_emit_reaches_every_subscriber() {
    let fanout = fanout(8);
    let mut a = fanout.subscribe("t1".to_string());
    let mut b = fanout.subscribe("t1".to_string());

    let report = fanout.emit(&"t1".to_string(), keys(&["x", "root"]));
    assert_eq!(report.delivered, 2);

    for sub in [&mut a, &mut b] {
        let event = timeout(Duration::from_millis(100), sub.recv())
            .await
            .expect("timeout waiting for event")
            .expect("channel closed");
        assert_eq!(event.id, "t1");
        assert_eq!(event.modified, keys(&["root", "x"]));
        assert!(sub.try_recv().is_none(), "exactly one event expected");
    }
}

#[tokio::test]
async fn test_emit_is_isolated_per_id() {
    let fanout = fanout(8);
    let mut t1 = fanout.subscribe("t1".to_string());
    let mut t2 = fanout.subscribe("t2".to_string());

    fanout.emit(&"t2".to_string(), keys(&["y"]));

    assert!(t1.try_recv().is_none());
    assert_eq!(t2.try_recv().map(|e| e.modified), Some(keys(&["y"])));
}

#[tokio::test]
async fn test_emit_without_subscribers() {
    let fanout = fanout(8);
    let report = fanout.emit(&"nobody".to_string(), keys(&["x"]));

    assert_eq!(report, EmitReport::default());
    assert_eq!(fanout.watched_id_count(), 0);
}

#[tokio::test]
async fn test_drop_unsubscribes() {
    let fanout = fanout(8);
    {
        let _sub = fanout.subscribe("t1".to_string());
        assert_eq!(fanout.subscriber_count(&"t1".to_string()), 1);
    }

    assert_eq!(fanout.subscriber_count(&"t1".to_string()), 0);
    assert_eq!(fanout.watched_id_count(), 0);
}

/// # Case: explicit unsubscribe closes the stream
///
/// ## Setup
/// - one queued event, then `unsubscribe`
///
/// ## Validation criteria
/// - the queued event is still drained
/// - the stream then ends and later emits reach nobody
/// - a second unsubscribe reports false
#[tokio::test]
async fn test_unsubscribe_closes_stream() {
    let fanout = fanout(8);
    let id = "t1".to_string();
    let mut sub = fanout.subscribe(id.clone());

    fanout.emit(&id, keys(&["a"]));
    assert!(fanout.unsubscribe(&id, sub.id()));

    assert_eq!(sub.recv().await.map(|e| e.modified), Some(keys(&["a"])));
    assert!(sub.recv().await.is_none());

    assert_eq!(fanout.emit(&id, keys(&["b"])).delivered, 0);
    assert!(!fanout.unsubscribe(&id, sub.id()));
}

#[tokio::test]
async fn test_unsubscribe_keeps_other_subscribers() {
    let fanout = fanout(8);
    let id = "t1".to_string();
    let gone = fanout.subscribe(id.clone());
    let mut kept = fanout.subscribe(id.clone());

    fanout.unsubscribe(&id, gone.id());

    assert_eq!(fanout.subscriber_count(&id), 1);
    assert_eq!(fanout.emit(&id, keys(&["a"])).delivered, 1);
    assert!(kept.try_recv().is_some());
}

/// # Case: a full buffer drops the newest event for that subscriber only
///
/// ## Setup
/// - buffer of 2, one idle subscriber and one draining subscriber
/// - emit 3 events
///
/// ## Validation criteria
/// - idle subscriber keeps the first 2 events, misses the 3rd
/// - draining subscriber sees all 3
/// - the drop is counted and logged
#[tokio::test]
#[traced_test]
async fn test_overflow_drops_newest() {
    let fanout = fanout(2);
    let id = "t1".to_string();
    let mut idle = fanout.subscribe(id.clone());
    let mut busy = fanout.subscribe(id.clone());

    let mut seen = Vec::new();
    for key in ["1", "2", "3"] {
        fanout.emit(&id, keys(&[key]));
        seen.push(busy.try_recv().map(|e| e.modified));
    }

    assert_eq!(seen, vec![Some(keys(&["1"])), Some(keys(&["2"])), Some(keys(&["3"]))]);
    assert_eq!(idle.dropped_events(), 1);
    assert_eq!(busy.dropped_events(), 0);
    assert_eq!(idle.try_recv().map(|e| e.modified), Some(keys(&["1"])));
    assert_eq!(idle.try_recv().map(|e| e.modified), Some(keys(&["2"])));
    assert!(idle.try_recv().is_none());
    assert!(logs_contain("Subscriber buffer full, event dropped"));
}

#[tokio::test]
async fn test_closed_receiver_is_pruned() {
    let fanout = fanout(8);
    let id = "t1".to_string();
    let sub = fanout.subscribe(id.clone());
    let (receiver, guard) = sub.into_receiver();
    drop(receiver);

    let report = fanout.emit(&id, keys(&["a"]));
    assert_eq!(report.closed, 1);
    assert_eq!(fanout.subscriber_count(&id), 0);
    assert_eq!(fanout.watched_id_count(), 0);

    // Already pruned, so the guard's drop finds nothing
    drop(guard);
    assert_eq!(fanout.watched_id_count(), 0);
}

#[tokio::test]
async fn test_clones_share_subscribers() {
    let fanout = fanout(8);
    let other = fanout.clone();
    let mut sub = fanout.subscribe("t1".to_string());

    assert_eq!(other.emit(&"t1".to_string(), keys(&["a"])).delivered, 1);
    assert!(sub.try_recv().is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_emitters_deliver_all_events() {
    let fanout = fanout(1024);
    let id = "t1".to_string();
    let mut sub = fanout.subscribe(id.clone());

    let mut handles = Vec::new();
    for task in 0..4 {
        let fanout = fanout.clone();
        let id = id.clone();
        handles.push(tokio::spawn(async move {
            for i in 0..100 {
                fanout.emit(&id, keys(&[format!("{task}-{i}").as_str()]));
            }
        }));
    }
    for handle in handles {
        handle.await.expect("emitter task panicked");
    }

    let mut received = 0;
    while sub.try_recv().is_some() {
        received += 1;
    }
    assert_eq!(received, 400);
}

/// Emits from `threads` OS threads until `stop` is set
fn spawn_emitters(
    fanout: &ChangeFanout<String, String>,
    id: &str,
    threads: usize,
    stop: &Arc<AtomicBool>,
) -> Vec<thread::JoinHandle<u64>> {
    (0..threads)
        .map(|t| {
            let fanout = fanout.clone();
            let id = id.to_string();
            let stop = Arc::clone(stop);
            thread::spawn(move || {
                let mut sent = 0;
                while !stop.load(Ordering::Relaxed) {
                    fanout.emit(&id, keys(&[format!("{t}-{sent}").as_str()]));
                    sent += 1;
                }
                sent
            })
        })
        .collect()
}

/// # Case: unsubscribe while emits are in flight
///
/// ## Setup
/// - 4 threads emitting on the same id in a tight loop
/// - unsubscribe once events are flowing
///
/// ## Validation criteria
/// - the stream ends (`recv` yields `None`) while emitters keep running
/// - at most one buffer's worth of queued events is drained after that
/// - emitters are unaffected and the id has no subscribers left
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_unsubscribe_during_concurrent_emits() {
    let fanout = fanout(64);
    let id = "t1".to_string();
    let mut sub = fanout.subscribe(id.clone());
    let stop = Arc::new(AtomicBool::new(false));
    let emitters = spawn_emitters(&fanout, &id, 4, &stop);

    timeout(Duration::from_secs(1), sub.recv())
        .await
        .expect("timeout waiting for first event")
        .expect("channel closed too early");
    assert!(fanout.unsubscribe(&id, sub.id()));

    let mut drained = 0;
    let ended = timeout(Duration::from_secs(1), async {
        while sub.recv().await.is_some() {
            drained += 1;
        }
    })
    .await;

    assert!(ended.is_ok(), "stream kept delivering after unsubscribe");
    assert!(drained <= 64);
    assert_eq!(fanout.subscriber_count(&id), 0);

    stop.store(true, Ordering::Relaxed);
    for emitter in emitters {
        assert!(emitter.join().expect("emitter panicked") > 0);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_guard_drop_during_concurrent_emits() {
    let fanout = fanout(64);
    let id = "t1".to_string();
    let mut other = fanout.subscribe(id.clone());
    let (mut receiver, guard) = fanout.subscribe(id.clone()).into_receiver();
    let stop = Arc::new(AtomicBool::new(false));
    let emitters = spawn_emitters(&fanout, &id, 4, &stop);

    timeout(Duration::from_secs(1), receiver.recv())
        .await
        .expect("timeout waiting for first event")
        .expect("channel closed too early");
    drop(guard);

    let ended = timeout(Duration::from_secs(1), async { while receiver.recv().await.is_some() {} }).await;
    assert!(ended.is_ok(), "stream kept delivering after guard drop");
    assert_eq!(fanout.subscriber_count(&id), 1);

    // The remaining subscriber still receives
    while other.try_recv().is_some() {}
    let fresh = timeout(Duration::from_secs(1), other.recv())
        .await
        .expect("timeout waiting for remaining subscriber");
    assert!(fresh.is_some());

    stop.store(true, Ordering::Relaxed);
    for emitter in emitters {
        emitter.join().expect("emitter panicked");
    }
}
