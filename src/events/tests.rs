use super::*;
use crate::engine::{EventKind, ScriptedEngine};
use std::sync::atomic::{AtomicUsize, Ordering};

fn multicast(engine: &ScriptedEngine) -> (EventMulticast<ScriptedEngine>, Arc<AtomicUsize>) {
    let forwarded = Arc::new(AtomicUsize::new(0));
    let counter = forwarded.clone();
    let forward: Forward = Arc::new(move |_: &PlaybackEvent| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    let hub = EventMulticast::new(Arc::new(Mutex::new(engine.clone())), forward);
    (hub, forwarded)
}

#[test]
fn listener_is_attached_lazily() {
    let engine = ScriptedEngine::new();
    let (hub, _) = multicast(&engine);
    assert_eq!(engine.listener_count(), 0);
    assert!(!hub.is_attached());

    let _sub = hub.subscribe();
    assert_eq!(engine.listener_count(), 1);
    assert!(hub.is_attached());
}

#[test]
fn two_subscribers_share_one_native_listener() {
    let engine = ScriptedEngine::new();
    let (hub, forwarded) = multicast(&engine);
    let a = hub.subscribe();
    let b = hub.subscribe();
    assert_eq!(engine.listener_count(), 1);

    engine.emit(EventKind::Play);

    assert_eq!(a.try_recv().unwrap().kind, EventKind::Play);
    assert_eq!(b.try_recv().unwrap().kind, EventKind::Play);
    assert!(a.try_recv().is_err());
    assert!(b.try_recv().is_err());
    // Forwarded once, not once per subscriber.
    assert_eq!(forwarded.load(Ordering::SeqCst), 1);
}

#[test]
fn last_unsubscribe_detaches_and_resubscribe_reattaches() {
    let engine = ScriptedEngine::new();
    let (hub, _) = multicast(&engine);
    let a = hub.subscribe();
    let b = hub.subscribe();

    a.unsubscribe();
    assert_eq!(engine.listener_count(), 1);
    drop(b);
    assert_eq!(engine.listener_count(), 0);
    assert!(!hub.is_attached());

    let fresh = hub.subscribe();
    assert_eq!(engine.listener_count(), 1);
    engine.emit(EventKind::TimeUpdate);
    assert_eq!(fresh.try_recv().unwrap().kind, EventKind::TimeUpdate);
}

#[test]
fn events_keep_engine_order() {
    let engine = ScriptedEngine::new();
    let (hub, _) = multicast(&engine);
    let sub = hub.subscribe();

    for kind in EventKind::ALL {
        engine.emit(kind);
    }

    let seen: Vec<EventKind> = sub.try_iter().map(|e| e.kind).collect();
    assert_eq!(seen, EventKind::ALL.to_vec());
}

#[test]
fn nothing_is_forwarded_while_detached() {
    let engine = ScriptedEngine::new();
    let (_hub, forwarded) = multicast(&engine);
    engine.emit(EventKind::Playing);
    assert_eq!(forwarded.load(Ordering::SeqCst), 0);
}

#[test]
fn lease_keeps_listener_without_subscribers() {
    let engine = ScriptedEngine::new();
    let (hub, forwarded) = multicast(&engine);
    let lease = hub.lease();
    assert_eq!(hub.subscriber_count(), 0);
    assert_eq!(engine.listener_count(), 1);

    engine.emit(EventKind::Pause);
    assert_eq!(forwarded.load(Ordering::SeqCst), 1);

    drop(lease);
    assert_eq!(engine.listener_count(), 0);
}

#[test]
fn detach_all_disconnects_and_later_drops_are_harmless() {
    let engine = ScriptedEngine::new();
    let (hub, _) = multicast(&engine);
    let sub = hub.subscribe();

    hub.detach_all();
    assert_eq!(engine.listener_count(), 0);
    assert!(matches!(sub.try_recv(), Err(TryRecvError::Disconnected)));

    drop(sub);
    assert_eq!(engine.listener_count(), 0);

    // Still restartable afterwards.
    let again = hub.subscribe();
    engine.emit(EventKind::Ended);
    assert_eq!(again.try_recv().unwrap().kind, EventKind::Ended);
}
