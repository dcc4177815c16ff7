use anyhow::{Context, Result};
use log::info;
use serde::Serialize;
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
    time::Duration,
};
use tokio_util::sync::CancellationToken;

use crate::db::LocationSample;

use super::loop_worker::{run_cycle, tracking_loop, TrackingDeps, TrackingEvent, TrackingTarget};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StartOutcome {
    Started,
    /// Already tracking this exact target; no new timer.
    AlreadyRunning,
    /// A different session was being tracked and has been stopped.
    Restarted,
}

struct ActiveTracking {
    target: TrackingTarget,
    cancel_token: CancellationToken,
    handle: JoinHandle<()>,
}

/// Owns the one tracking loop that may run at a time.
pub struct TrackingController {
    deps: TrackingDeps,
    interval: Duration,
    active: Mutex<Option<ActiveTracking>>,
    root_token: CancellationToken,
}

impl TrackingController {
    pub fn new(deps: TrackingDeps, interval: Duration) -> Self {
        Self {
            deps,
            interval,
            active: Mutex::new(None),
            root_token: CancellationToken::new(),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TrackingEvent> {
        self.deps.events.subscribe()
    }

    pub async fn start(&self, target: TrackingTarget) -> Result<StartOutcome> {
        let mut active = self.active.lock().await;

        let mut outcome = StartOutcome::Started;
        if let Some(current) = active.as_ref() {
            if current.target == target && !current.handle.is_finished() {
                return Ok(StartOutcome::AlreadyRunning);
            }
            outcome = StartOutcome::Restarted;
        }
        if let Some(previous) = active.take() {
            shut_down(previous).await?;
        }

        let cancel_token = self.root_token.child_token();
        let handle = tokio::spawn(tracking_loop(
            target.clone(),
            self.deps.clone(),
            self.interval,
            cancel_token.clone(),
        ));

        info!(
            "tracking {:?} for worker {} session {}",
            outcome, target.worker_id, target.session_id
        );
        *active = Some(ActiveTracking {
            target,
            cancel_token,
            handle,
        });
        Ok(outcome)
    }

    /// Cancels the timer before waiting for the loop to wind down.
    pub async fn stop(&self) -> Result<()> {
        let previous = self.active.lock().await.take();
        match previous {
            Some(previous) => shut_down(previous).await,
            None => Ok(()),
        }
    }

    /// Starts when the worker is known, signed in and has a session; stops
    /// when any of those goes away. A new session id restarts the loop.
    pub async fn sync(
        &self,
        worker_id: Option<&str>,
        is_signed_in: bool,
        session_id: Option<&str>,
    ) -> Result<Option<StartOutcome>> {
        match (worker_id, is_signed_in, session_id) {
            (Some(worker_id), true, Some(session_id))
                if !worker_id.is_empty() && !session_id.is_empty() =>
            {
                let outcome = self
                    .start(TrackingTarget::new(worker_id, session_id))
                    .await?;
                Ok(Some(outcome))
            }
            _ => {
                self.stop().await?;
                Ok(None)
            }
        }
    }

    pub async fn is_running(&self) -> bool {
        self.active
            .lock()
            .await
            .as_ref()
            .is_some_and(|active| !active.handle.is_finished())
    }

    pub async fn current_target(&self) -> Option<TrackingTarget> {
        self.active
            .lock()
            .await
            .as_ref()
            .map(|active| active.target.clone())
    }

    /// Runs one cycle now for the active target, outside the timer. `None`
    /// when nothing is being tracked or the cycle was skipped.
    pub async fn track_now(&self) -> Option<LocationSample> {
        let target = self.current_target().await?;
        run_cycle(&target, &self.deps).await
    }
}

async fn shut_down(active: ActiveTracking) -> Result<()> {
    active.cancel_token.cancel();
    active
        .handle
        .await
        .with_context(|| format!("tracking loop for session {} failed to join", active.target.session_id))
}

impl Drop for TrackingController {
    fn drop(&mut self) {
        self.root_token.cancel();
    }
}
