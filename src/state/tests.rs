use super::*;
use crate::engine::{EventKind, PlaybackEvent};

fn ev(kind: EventKind, current_time: f64, duration: f64) -> PlaybackEvent {
    PlaybackEvent::new(kind, current_time, duration)
}

#[test]
fn canplay_sets_duration_and_clears_playing() {
    let mut p: StateProjector<StreamState> = StateProjector::new();
    p.apply(&ev(EventKind::Playing, 0.0, 0.0));
    assert!(p.state().playing);

    p.apply(&ev(EventKind::CanPlay, 0.0, 215.5));
    assert!(!p.state().playing);
    assert_eq!(p.state().track_info.duration, Some(215.5));
}

#[test]
fn playing_and_pause_toggle_playing() {
    let mut p: StateProjector<StreamState> = StateProjector::new();
    p.apply(&ev(EventKind::Playing, 0.0, 10.0));
    assert!(p.state().playing);
    p.apply(&ev(EventKind::Pause, 3.0, 10.0));
    assert!(!p.state().playing);
}

#[test]
fn timeupdate_tracks_current_time_only() {
    let mut p: StateProjector<StreamState> = StateProjector::new();
    p.apply(&ev(EventKind::CanPlay, 0.0, 60.0));
    p.apply(&ev(EventKind::TimeUpdate, 12.25, 999.0));
    assert_eq!(p.state().track_info.current_time, Some(12.25));
    // Duration only comes from canplay.
    assert_eq!(p.state().track_info.duration, Some(60.0));
}

#[test]
fn error_zeroes_times_and_stops() {
    let mut p: StateProjector<StreamState> = StateProjector::new();
    p.apply(&ev(EventKind::CanPlay, 0.0, 60.0));
    p.apply(&ev(EventKind::Playing, 0.0, 60.0));
    p.apply(&ev(EventKind::TimeUpdate, 30.0, 60.0));
    p.apply(&PlaybackEvent::failure("decode failed"));

    let s = p.state();
    assert!(!s.playing);
    assert_eq!(s.track_info.current_time, Some(0.0));
    assert_eq!(s.track_info.duration, Some(0.0));
}

#[test]
fn unlisted_kinds_leave_state_untouched() {
    let mut p: StateProjector<StreamState> = StateProjector::new();
    p.apply(&ev(EventKind::Playing, 1.0, 60.0));
    let before = p.state().clone();
    for kind in [
        EventKind::Ended,
        EventKind::Play,
        EventKind::LoadedMetadata,
        EventKind::LoadStart,
    ] {
        p.apply(&ev(kind, 42.0, 42.0));
    }
    assert_eq!(p.state(), &before);
}

#[test]
fn latest_canplay_and_timeupdate_win() {
    let mut p: StateProjector<PlaylistState> = StateProjector::new();
    let script = [
        ev(EventKind::CanPlay, 0.0, 100.0),
        ev(EventKind::TimeUpdate, 1.0, 100.0),
        ev(EventKind::Playing, 1.0, 100.0),
        ev(EventKind::TimeUpdate, 2.0, 100.0),
        ev(EventKind::CanPlay, 0.0, 180.0),
        ev(EventKind::LoadStart, 0.0, 180.0),
        ev(EventKind::TimeUpdate, 0.5, 180.0),
    ];
    for e in &script {
        p.apply(e);
    }
    let info = &p.state().stream.track_info;
    assert_eq!(info.duration, Some(180.0));
    assert_eq!(info.current_time, Some(0.5));
}

#[test]
fn channel_publishes_whole_snapshots_in_order() {
    let channel: StateChannel<StreamState> = StateChannel::new();
    let sub = channel.subscribe();

    channel.apply(&ev(EventKind::CanPlay, 0.0, 50.0));
    channel.update(|s| s.track_info.current_track = Some(3));
    channel.apply(&ev(EventKind::Playing, 0.0, 50.0));

    let updates: Vec<_> = sub.try_iter().collect();
    assert_eq!(updates.len(), 3);
    assert_eq!(updates[0].kind(), Some(EventKind::CanPlay));
    assert_eq!(updates[0].state().track_info.duration, Some(50.0));
    assert_eq!(updates[1].kind(), None);
    assert_eq!(updates[1].state().track_info.current_track, Some(3));
    assert_eq!(updates[1].state().track_info.duration, Some(50.0));
    assert!(updates[2].state().playing);
    assert_eq!(updates[2].state().track_info.current_track, Some(3));
}

#[test]
fn every_subscriber_sees_every_update() {
    let channel: StateChannel<StreamState> = StateChannel::new();
    let a = channel.subscribe();
    let b = channel.subscribe();
    channel.apply(&ev(EventKind::Play, 0.0, 0.0));
    channel.update(|s| s.playing = true);
    assert_eq!(a.try_iter().count(), 2);
    assert_eq!(b.try_iter().count(), 2);
}

#[test]
fn dropping_a_subscription_unsubscribes() {
    let channel: StateChannel<StreamState> = StateChannel::new();
    let a = channel.subscribe();
    let _b = channel.subscribe();
    assert_eq!(channel.subscriber_count(), 2);
    a.unsubscribe();
    assert_eq!(channel.subscriber_count(), 1);
}

#[test]
fn received_snapshots_are_detached_copies() {
    let channel: StateChannel<StreamState> = StateChannel::new();
    let sub = channel.subscribe();
    channel.apply(&ev(EventKind::Playing, 0.0, 0.0));

    let mut got = sub.try_recv().unwrap().into_state();
    got.playing = false;
    got.track_info.current_track = Some(99);

    let current = channel.snapshot();
    assert!(current.playing);
    assert_eq!(current.track_info.current_track, None);
}
