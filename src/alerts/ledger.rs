//! Per-worker breach-episode state.
//!
//! A worker is `Armed` until a breach alert goes out, then `Alerted` until a
//! within-fence sample is seen. Only an armed worker can be alerted.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::utils::sync::lock;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum EpisodeState {
    Armed,
    Alerted {
        sample_id: String,
        alerted_at: DateTime<Utc>,
    },
}

impl Default for EpisodeState {
    fn default() -> Self {
        EpisodeState::Armed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerDecision {
    /// First breach of an episode.
    Alert,
    /// Breach inside an episode that already alerted.
    Suppress,
    /// Back inside the fence after an alert.
    Rearm,
    /// Inside the fence, nothing pending.
    Ignore,
}

impl EpisodeState {
    pub fn decide(&self, within_fence: bool) -> LedgerDecision {
        match (self, within_fence) {
            (EpisodeState::Armed, false) => LedgerDecision::Alert,
            (EpisodeState::Alerted { .. }, false) => LedgerDecision::Suppress,
            (EpisodeState::Alerted { .. }, true) => LedgerDecision::Rearm,
            (EpisodeState::Armed, true) => LedgerDecision::Ignore,
        }
    }

    pub fn mark_alerted(&mut self, sample_id: impl Into<String>, alerted_at: DateTime<Utc>) {
        *self = EpisodeState::Alerted {
            sample_id: sample_id.into(),
            alerted_at,
        };
    }

    pub fn rearm(&mut self) {
        *self = EpisodeState::Armed;
    }

    pub fn is_alerted(&self) -> bool {
        matches!(self, EpisodeState::Alerted { .. })
    }
}

/// Holder of every worker's episode state. Each worker gets its own async
/// lock so a decision and the send it leads to happen as one step.
#[derive(Default)]
pub struct AlertLedger {
    workers: Mutex<HashMap<String, Arc<AsyncMutex<EpisodeState>>>>,
}

impl AlertLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock_worker(&self, worker_id: &str) -> OwnedMutexGuard<EpisodeState> {
        let slot = {
            let mut workers = lock(&self.workers);
            workers
                .entry(worker_id.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(EpisodeState::Armed)))
                .clone()
        };
        slot.lock_owned().await
    }

    pub async fn snapshot(&self, worker_id: &str) -> EpisodeState {
        self.lock_worker(worker_id).await.clone()
    }
}
