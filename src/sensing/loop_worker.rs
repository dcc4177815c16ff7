use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::{
    sync::broadcast,
    time::{Duration, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::{
    alerts::{AlertDispatcher, DispatchOutcome},
    db::{LocationSample, RecordStore},
    geofence::{GeofenceEvaluator, GeofenceOutcome},
};

use super::{area_namer::AreaNamer, sampler::LocationSampler};

// Set to false to silence this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info, log_warn};

const EVENT_CAPACITY: usize = 64;

/// The worker and session a tracking loop records for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingTarget {
    pub worker_id: String,
    pub session_id: String,
}

impl TrackingTarget {
    pub fn new(worker_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            worker_id: worker_id.into(),
            session_id: session_id.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TrackingEvent {
    SampleRecorded {
        sample: LocationSample,
    },
    #[serde(rename_all = "camelCase")]
    CycleSkipped {
        session_id: String,
        reason: String,
    },
    #[serde(rename_all = "camelCase")]
    GeofenceChecked {
        sample_id: String,
        outcome: GeofenceOutcome,
        dispatch: DispatchOutcome,
    },
    #[serde(rename_all = "camelCase")]
    Stopped {
        session_id: String,
    },
}

/// Everything one sampling cycle talks to.
#[derive(Clone)]
pub struct TrackingDeps {
    pub sampler: LocationSampler,
    pub namer: Arc<AreaNamer>,
    pub store: Arc<dyn RecordStore>,
    pub evaluator: Arc<GeofenceEvaluator>,
    pub dispatcher: Arc<AlertDispatcher>,
    pub events: broadcast::Sender<TrackingEvent>,
}

impl TrackingDeps {
    pub fn new(
        sampler: LocationSampler,
        namer: Arc<AreaNamer>,
        store: Arc<dyn RecordStore>,
        evaluator: Arc<GeofenceEvaluator>,
        dispatcher: Arc<AlertDispatcher>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            sampler,
            namer,
            store,
            evaluator,
            dispatcher,
            events,
        }
    }

    fn emit(&self, event: TrackingEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

/// Samples immediately, then once per `period`, until cancelled.
///
/// Cancellation abandons a cycle that is still waiting on the fix or the
/// area label. A sample that has reached the store is written out before the
/// loop exits, so nothing lands after the controller reports it stopped.
pub async fn tracking_loop(
    target: TrackingTarget,
    deps: TrackingDeps,
    period: Duration,
    cancel_token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    log_info!(
        "tracking started for worker {} session {} every {:?}",
        target.worker_id,
        target.session_id,
        period
    );

    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => break,
            _ = ticker.tick() => {
                let sample = tokio::select! {
                    biased;
                    _ = cancel_token.cancelled() => break,
                    sample = prepare_sample(&target, &deps) => sample,
                };
                if let Some(sample) = sample {
                    record_sample(&target, &deps, sample).await;
                }
            }
        }
    }

    log_info!("tracking loop for session {} shutting down", target.session_id);
    deps.emit(TrackingEvent::Stopped {
        session_id: target.session_id.clone(),
    });
}

/// One cycle: fix, area label, persist, then a geofence check that runs on
/// its own task. Returns the stored sample, or `None` if the cycle was
/// skipped.
pub async fn run_cycle(target: &TrackingTarget, deps: &TrackingDeps) -> Option<LocationSample> {
    let sample = prepare_sample(target, deps).await?;
    record_sample(target, deps, sample).await
}

async fn prepare_sample(target: &TrackingTarget, deps: &TrackingDeps) -> Option<LocationSample> {
    let fix = match deps.sampler.sample().await {
        Ok(fix) => fix,
        Err(err) => {
            log_warn!(
                "skipping tracking cycle for session {}: {err}",
                target.session_id
            );
            deps.emit(TrackingEvent::CycleSkipped {
                session_id: target.session_id.clone(),
                reason: err.to_string(),
            });
            return None;
        }
    };

    let area_label = deps.namer.resolve_area_label(fix.coordinate).await;
    let sample = LocationSample::new(
        &target.worker_id,
        Some(target.session_id.clone()),
        fix.coordinate,
        area_label,
        Utc::now(),
    );
    log_debug!("fix for session {} has {:?} accuracy", target.session_id, fix.quality);
    Some(sample)
}

async fn record_sample(
    target: &TrackingTarget,
    deps: &TrackingDeps,
    sample: LocationSample,
) -> Option<LocationSample> {
    if let Err(err) = deps.store.insert_location_sample(&sample).await {
        log_error!(
            "failed to persist sample for session {}: {err:#}",
            target.session_id
        );
        deps.emit(TrackingEvent::CycleSkipped {
            session_id: target.session_id.clone(),
            reason: format!("persist failed: {err}"),
        });
        return None;
    }

    log_info!(
        "sample {} recorded for session {} at {}",
        sample.id,
        target.session_id,
        sample.area_label
    );
    deps.emit(TrackingEvent::SampleRecorded {
        sample: sample.clone(),
    });

    tokio::spawn(check_geofence(
        target.worker_id.clone(),
        sample.clone(),
        deps.clone(),
    ));

    Some(sample)
}

async fn check_geofence(worker_id: String, sample: LocationSample, deps: TrackingDeps) {
    let outcome = match deps.evaluator.evaluate(&worker_id, &sample).await {
        Ok(outcome) => outcome,
        Err(err) => {
            log_error!("geofence check failed for sample {}: {err:#}", sample.id);
            return;
        }
    };

    let dispatch = deps
        .dispatcher
        .handle_outcome(&worker_id, &sample, &outcome)
        .await;

    deps.emit(TrackingEvent::GeofenceChecked {
        sample_id: sample.id.clone(),
        outcome,
        dispatch,
    });
}
