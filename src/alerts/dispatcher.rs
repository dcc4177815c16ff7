use std::{sync::Arc, time::Duration};

use chrono::Utc;
use serde::Serialize;

use crate::{
    db::{models::display_name_or_unknown, AlertNotification, LocationSample, RecordStore},
    geofence::{FenceReading, GeofenceOutcome, GEOFENCE_RADIUS_KM},
};

use super::{
    channel::MessageChannel,
    ledger::{AlertLedger, LedgerDecision},
    message::{breach_notification, compose_ops_message, compose_test_message, test_notification, BreachDetails},
    presentation::AlertPresentation,
};

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

/// Upper bound on one ops-channel send. The in-app alert waits for it.
pub const DELIVERY_TIMEOUT: Duration = Duration::from_secs(15);

/// A breach that has passed deduplication and is about to be announced.
#[derive(Debug, Clone, PartialEq)]
pub struct BreachEvent {
    pub worker_id: String,
    pub sample: LocationSample,
    pub reading: FenceReading,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DispatchOutcome {
    NothingToDo,
    Rearmed,
    Suppressed,
    Alerted {
        /// Whether the ops channel accepted the message.
        delivered: bool,
        notification: AlertNotification,
    },
}

pub struct AlertDispatcher {
    store: Arc<dyn RecordStore>,
    channel: Arc<dyn MessageChannel>,
    channel_id: String,
    presentation: Arc<dyn AlertPresentation>,
    ledger: AlertLedger,
    radius_km: f64,
    delivery_timeout: Duration,
}

impl AlertDispatcher {
    pub fn new(
        store: Arc<dyn RecordStore>,
        channel: Arc<dyn MessageChannel>,
        channel_id: impl Into<String>,
        presentation: Arc<dyn AlertPresentation>,
    ) -> Self {
        Self {
            store,
            channel,
            channel_id: channel_id.into(),
            presentation,
            ledger: AlertLedger::new(),
            radius_km: GEOFENCE_RADIUS_KM,
            delivery_timeout: DELIVERY_TIMEOUT,
        }
    }

    /// Radius quoted in the ops message. Should match the evaluator's.
    pub fn with_radius(mut self, radius_km: f64) -> Self {
        self.radius_km = radius_km;
        self
    }

    pub fn with_delivery_timeout(mut self, timeout: Duration) -> Self {
        self.delivery_timeout = timeout;
        self
    }

    pub fn ledger(&self) -> &AlertLedger {
        &self.ledger
    }

    pub fn channel_id(&self) -> &str {
        &self.channel_id
    }

    /// Applies the re-arm rule to one evaluation and alerts if it opens a new
    /// breach episode. The worker's ledger entry stays locked until the alert
    /// has gone out.
    pub async fn handle_outcome(
        &self,
        worker_id: &str,
        sample: &LocationSample,
        outcome: &GeofenceOutcome,
    ) -> DispatchOutcome {
        let GeofenceOutcome::Evaluated(reading) = outcome else {
            return DispatchOutcome::NothingToDo;
        };

        let mut state = self.ledger.lock_worker(worker_id).await;
        match state.decide(reading.within_fence) {
            LedgerDecision::Ignore => DispatchOutcome::NothingToDo,
            LedgerDecision::Rearm => {
                log_info!("worker {worker_id} back inside the fence; alerts re-armed");
                state.rearm();
                DispatchOutcome::Rearmed
            }
            LedgerDecision::Suppress => {
                log_info!(
                    "breach by worker {worker_id} ({:.2} km, sample {}) already alerted; suppressed",
                    reading.distance_km,
                    sample.id
                );
                DispatchOutcome::Suppressed
            }
            LedgerDecision::Alert => {
                let event = BreachEvent {
                    worker_id: worker_id.to_string(),
                    sample: sample.clone(),
                    reading: reading.clone(),
                };
                let (delivered, notification) = self.dispatch(&event).await;
                // Marked even when delivery failed; the in-app alert went out.
                state.mark_alerted(&sample.id, Utc::now());
                DispatchOutcome::Alerted {
                    delivered,
                    notification,
                }
            }
        }
    }

    /// Ops message first, then the notifications feed, then the in-app
    /// alert. Neither earlier step can prevent the in-app alert.
    pub async fn dispatch(&self, event: &BreachEvent) -> (bool, AlertNotification) {
        let worker_name = self.worker_name(&event.worker_id).await;
        let details = BreachDetails::new(
            worker_name,
            &event.reading,
            event.sample.area_label.clone(),
            self.radius_km,
        );

        let delivered = self.send_external(&event.worker_id, &compose_ops_message(&details)).await;

        let notification = breach_notification(&details, Utc::now());
        self.raise_in_app(notification.clone()).await;

        (delivered, notification)
    }

    /// Sends a marked test message and raises a test alert. Episode state is
    /// left alone.
    pub async fn dispatch_test_alert(&self, worker_id: &str) -> DispatchOutcome {
        let worker_name = self.worker_name(worker_id).await;
        let delivered = self
            .send_external(worker_id, &compose_test_message(&worker_name))
            .await;

        let notification = test_notification(&worker_name, &self.channel_id, Utc::now());
        self.raise_in_app(notification.clone()).await;

        DispatchOutcome::Alerted {
            delivered,
            notification,
        }
    }

    async fn worker_name(&self, worker_id: &str) -> String {
        match self.store.get_worker_profile(worker_id).await {
            Ok(profile) => display_name_or_unknown(profile.as_ref()),
            Err(err) => {
                log_warn!("failed to load profile for worker {worker_id}: {err:#}");
                display_name_or_unknown(None)
            }
        }
    }

    /// A send that outlives `delivery_timeout` counts as a failed delivery.
    async fn send_external(&self, worker_id: &str, text: &str) -> bool {
        let send = self.channel.send(&self.channel_id, text);
        match tokio::time::timeout(self.delivery_timeout, send).await {
            Ok(Ok(())) => {
                log_info!("ops alert for worker {worker_id} sent to {}", self.channel_id);
                true
            }
            Ok(Err(err)) => {
                log_error!(
                    "ops alert for worker {worker_id} to {} failed: {err:#}",
                    self.channel_id
                );
                false
            }
            Err(_) => {
                log_error!(
                    "ops alert for worker {worker_id} to {} timed out after {:?}",
                    self.channel_id,
                    self.delivery_timeout
                );
                false
            }
        }
    }

    async fn raise_in_app(&self, notification: AlertNotification) {
        if let Err(err) = self.store.insert_notification(&notification).await {
            log_warn!("failed to store notification {}: {err:#}", notification.id);
        }
        self.presentation.show(notification).await;
    }
}
