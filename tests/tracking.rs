mod support;

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use fieldtrack::{
    alerts::{AlertDispatcher, DispatchOutcome},
    db::{RecordStore, WorkAssignment},
    geofence::{GeofenceEvaluator, GeofenceOutcome},
    geometry::Coordinate,
    sensing::{
        AreaNamer, LocationError, LocationSampler, PermissionState, StartOutcome,
        TrackingController, TrackingDeps, TrackingEvent, TrackingTarget, UNKNOWN_LOCATION,
    },
};
use tokio::sync::broadcast;

use support::{
    memory_store::MemoryStore,
    mock_location::MockLocation,
    recording::{RecordingChannel, RecordingPresentation},
    ASSIGNED, NORTH_OF_ASSIGNED,
};

const INTERVAL: Duration = Duration::from_secs(30 * 60);

struct Harness {
    controller: TrackingController,
    store: Arc<MemoryStore>,
    channel: Arc<RecordingChannel>,
    presentation: Arc<RecordingPresentation>,
    location: Arc<MockLocation>,
}

fn harness_with(location: Arc<MockLocation>, channel: RecordingChannel) -> Harness {
    let store = Arc::new(MemoryStore::with_assignment(WorkAssignment {
        worker_id: "w1".into(),
        date: Utc::now().date_naive(),
        location_label: "Parrys Corner".into(),
        coordinate: Some(ASSIGNED),
    }));
    store.add_profile("w1", "Priya");

    let channel = Arc::new(channel);
    let presentation = Arc::new(RecordingPresentation::default());
    let record_store: Arc<dyn RecordStore> = store.clone();

    let dispatcher = Arc::new(AlertDispatcher::new(
        record_store.clone(),
        channel.clone(),
        "#test-alerts",
        presentation.clone(),
    ));
    let deps = TrackingDeps::new(
        LocationSampler::new(location.clone()),
        Arc::new(AreaNamer::disabled()),
        record_store.clone(),
        Arc::new(GeofenceEvaluator::new(record_store)),
        dispatcher,
    );

    Harness {
        controller: TrackingController::new(deps, INTERVAL),
        store,
        channel,
        presentation,
        location,
    }
}

fn harness(location: Arc<MockLocation>) -> Harness {
    harness_with(location, RecordingChannel::default())
}

fn target() -> TrackingTarget {
    TrackingTarget::new("w1", "s1")
}

async fn wait_for<F>(rx: &mut broadcast::Receiver<TrackingEvent>, mut wanted: F) -> TrackingEvent
where
    F: FnMut(&TrackingEvent) -> bool,
{
    loop {
        let event = tokio::time::timeout(INTERVAL * 2, rx.recv())
            .await
            .expect("timed out waiting for tracking event")
            .expect("event channel closed");
        if wanted(&event) {
            return event;
        }
    }
}

fn drain(rx: &mut broadcast::Receiver<TrackingEvent>) -> Vec<TrackingEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test(start_paused = true)]
async fn fallback_fix_still_persists_a_sample() {
    let location = MockLocation::scripted(
        vec![Err(LocationError::Timeout(Duration::from_secs(15)))],
        ASSIGNED,
    );
    let h = harness(location);
    let mut rx = h.controller.subscribe();

    assert_eq!(h.controller.start(target()).await.unwrap(), StartOutcome::Started);
    wait_for(&mut rx, |e| matches!(e, TrackingEvent::SampleRecorded { .. })).await;

    let samples = h.store.samples();
    assert_eq!(samples.len(), 1);
    assert_eq!(samples[0].session_id.as_deref(), Some("s1"));
    assert_eq!(samples[0].area_label, UNKNOWN_LOCATION);
    assert_eq!(samples[0].coordinate, ASSIGNED);

    let calls = h.location.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[0].high_accuracy);
    assert!(!calls[1].high_accuracy);

    h.controller.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn starting_twice_keeps_a_single_timer() {
    let h = harness(MockLocation::steady(ASSIGNED));

    assert_eq!(h.controller.start(target()).await.unwrap(), StartOutcome::Started);
    assert_eq!(
        h.controller.start(target()).await.unwrap(),
        StartOutcome::AlreadyRunning
    );

    // Ticks at 0, 30 and 60 minutes.
    tokio::time::sleep(INTERVAL * 2 + Duration::from_secs(1)).await;
    assert_eq!(h.store.samples().len(), 3);

    h.controller.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn stop_cancels_further_cycles() {
    let h = harness(MockLocation::steady(ASSIGNED));
    let mut rx = h.controller.subscribe();

    h.controller.start(target()).await.unwrap();
    wait_for(&mut rx, |e| matches!(e, TrackingEvent::SampleRecorded { .. })).await;

    h.controller.stop().await.unwrap();
    assert!(!h.controller.is_running().await);
    wait_for(&mut rx, |e| matches!(e, TrackingEvent::Stopped { .. })).await;

    tokio::time::sleep(INTERVAL * 4).await;
    assert_eq!(h.store.samples().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn stop_lets_a_pending_write_land_first() {
    let h = harness(MockLocation::steady(ASSIGNED));
    h.store.set_write_delay(Duration::from_secs(5));

    h.controller.start(target()).await.unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(h.store.samples().is_empty());

    h.controller.stop().await.unwrap();
    assert_eq!(h.store.samples().len(), 1);

    tokio::time::sleep(INTERVAL * 2).await;
    assert_eq!(h.store.samples().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn dropping_the_controller_stops_tracking() {
    let h = harness(MockLocation::steady(ASSIGNED));
    let mut rx = h.controller.subscribe();

    h.controller.start(target()).await.unwrap();
    wait_for(&mut rx, |e| matches!(e, TrackingEvent::SampleRecorded { .. })).await;

    let store = h.store.clone();
    drop(h);

    tokio::time::sleep(INTERVAL * 3).await;
    assert_eq!(store.samples().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn sync_follows_sign_in_state() {
    let h = harness(MockLocation::steady(ASSIGNED));

    assert_eq!(
        h.controller.sync(Some("w1"), true, Some("s1")).await.unwrap(),
        Some(StartOutcome::Started)
    );
    assert_eq!(
        h.controller.sync(Some("w1"), true, Some("s1")).await.unwrap(),
        Some(StartOutcome::AlreadyRunning)
    );
    assert_eq!(
        h.controller.sync(Some("w1"), true, Some("s2")).await.unwrap(),
        Some(StartOutcome::Restarted)
    );
    assert_eq!(
        h.controller.current_target().await,
        Some(TrackingTarget::new("w1", "s2"))
    );

    assert_eq!(h.controller.sync(Some("w1"), false, Some("s2")).await.unwrap(), None);
    assert!(!h.controller.is_running().await);

    assert_eq!(h.controller.sync(None, true, Some("s3")).await.unwrap(), None);
    assert_eq!(h.controller.sync(Some("w1"), true, None).await.unwrap(), None);
    assert!(!h.controller.is_running().await);
}

#[tokio::test(start_paused = true)]
async fn denied_permission_skips_cycles_without_stopping() {
    let location = MockLocation::steady(ASSIGNED);
    location.set_permission(PermissionState::Denied);
    let h = harness(location);
    let mut rx = h.controller.subscribe();

    h.controller.start(target()).await.unwrap();
    tokio::time::sleep(INTERVAL + Duration::from_secs(1)).await;

    let skipped = drain(&mut rx)
        .into_iter()
        .filter(|e| matches!(e, TrackingEvent::CycleSkipped { .. }))
        .count();
    assert_eq!(skipped, 2);
    assert!(h.store.samples().is_empty());
    assert!(h.location.calls().is_empty());
    assert!(h.controller.is_running().await);

    h.location.set_permission(PermissionState::Granted);
    tokio::time::sleep(INTERVAL).await;
    assert_eq!(h.store.samples().len(), 1);

    h.controller.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn continuous_breach_alerts_once() {
    let h = harness(MockLocation::steady(NORTH_OF_ASSIGNED));
    let mut rx = h.controller.subscribe();

    h.controller.start(target()).await.unwrap();
    let first = wait_for(&mut rx, |e| matches!(e, TrackingEvent::GeofenceChecked { .. })).await;

    let TrackingEvent::GeofenceChecked { outcome, dispatch, .. } = first else {
        unreachable!();
    };
    let GeofenceOutcome::Evaluated(reading) = outcome else {
        panic!("expected an evaluation");
    };
    assert!(!reading.within_fence);
    assert!((reading.distance_km - 1.11).abs() < 0.01);
    assert!(matches!(dispatch, DispatchOutcome::Alerted { delivered: true, .. }));

    let second = wait_for(&mut rx, |e| matches!(e, TrackingEvent::GeofenceChecked { .. })).await;
    let TrackingEvent::GeofenceChecked { dispatch, .. } = second else {
        unreachable!();
    };
    assert_eq!(dispatch, DispatchOutcome::Suppressed);

    let sent = h.channel.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "#test-alerts");
    assert!(sent[0].1.contains("*Field Recruiter:* Priya"));
    assert!(sent[0].1.contains("*Assigned Location:* Parrys Corner"));
    assert!(sent[0].1.contains("*Distance from assigned area:* 1.11 km"));
    assert_eq!(h.presentation.shown().len(), 1);
    assert_eq!(h.store.notifications().len(), 1);

    h.controller.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn sample_at_assignment_raises_nothing() {
    let h = harness(MockLocation::steady(ASSIGNED));
    let mut rx = h.controller.subscribe();

    h.controller.start(target()).await.unwrap();
    let event = wait_for(&mut rx, |e| matches!(e, TrackingEvent::GeofenceChecked { .. })).await;

    let TrackingEvent::GeofenceChecked { outcome, dispatch, .. } = event else {
        unreachable!();
    };
    let GeofenceOutcome::Evaluated(reading) = outcome else {
        panic!("expected an evaluation");
    };
    assert!(reading.within_fence);
    assert_eq!(reading.distance_km, 0.0);
    assert_eq!(dispatch, DispatchOutcome::NothingToDo);
    assert!(h.channel.sent().is_empty());
    assert!(h.presentation.shown().is_empty());

    h.controller.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn failed_delivery_still_alerts_in_app() {
    let h = harness_with(
        MockLocation::steady(NORTH_OF_ASSIGNED),
        RecordingChannel::failing(),
    );
    let mut rx = h.controller.subscribe();

    h.controller.start(target()).await.unwrap();
    let event = wait_for(&mut rx, |e| matches!(e, TrackingEvent::GeofenceChecked { .. })).await;

    let TrackingEvent::GeofenceChecked { dispatch, .. } = event else {
        unreachable!();
    };
    assert!(matches!(dispatch, DispatchOutcome::Alerted { delivered: false, .. }));
    assert_eq!(h.channel.sent().len(), 1);
    assert_eq!(h.presentation.shown().len(), 1);

    h.controller.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn track_now_needs_an_active_session() {
    let h = harness(MockLocation::steady(Coordinate::new(13.05, 80.25)));
    assert!(h.controller.track_now().await.is_none());

    let mut rx = h.controller.subscribe();
    h.controller.start(target()).await.unwrap();
    wait_for(&mut rx, |e| matches!(e, TrackingEvent::SampleRecorded { .. })).await;

    let manual = h.controller.track_now().await.expect("manual sample");
    assert_eq!(manual.session_id.as_deref(), Some("s1"));
    assert_eq!(h.store.samples().len(), 2);

    h.controller.stop().await.unwrap();
}
