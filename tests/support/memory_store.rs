use std::{sync::Mutex, time::Duration};

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use fieldtrack::db::{AlertNotification, LocationSample, RecordStore, WorkAssignment, WorkerProfile};

/// In-process record store. Unlike the SQLite one it never leaves the
/// runtime thread, which keeps paused-clock tests deterministic.
#[derive(Default)]
pub struct MemoryStore {
    samples: Mutex<Vec<LocationSample>>,
    assignments: Mutex<Vec<WorkAssignment>>,
    profiles: Mutex<Vec<WorkerProfile>>,
    notifications: Mutex<Vec<AlertNotification>>,
    write_delay: Mutex<Option<Duration>>,
}

impl MemoryStore {
    pub fn with_assignment(assignment: WorkAssignment) -> Self {
        let store = Self::default();
        store.assignments.lock().unwrap().push(assignment);
        store
    }

    pub fn add_profile(&self, id: &str, name: &str) {
        self.profiles.lock().unwrap().push(WorkerProfile {
            id: id.into(),
            name: Some(name.into()),
        });
    }

    /// Sample inserts take `delay` before they land.
    pub fn set_write_delay(&self, delay: Duration) {
        *self.write_delay.lock().unwrap() = Some(delay);
    }

    pub fn samples(&self) -> Vec<LocationSample> {
        self.samples.lock().unwrap().clone()
    }

    pub fn notifications(&self) -> Vec<AlertNotification> {
        self.notifications.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn insert_location_sample(&self, sample: &LocationSample) -> Result<()> {
        let delay = *self.write_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.samples.lock().unwrap().push(sample.clone());
        Ok(())
    }

    async fn get_assignment(&self, worker_id: &str, date: NaiveDate) -> Result<Option<WorkAssignment>> {
        Ok(self
            .assignments
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.worker_id == worker_id && a.date == date)
            .cloned())
    }

    async fn get_worker_profile(&self, worker_id: &str) -> Result<Option<WorkerProfile>> {
        Ok(self
            .profiles
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == worker_id)
            .cloned())
    }

    async fn insert_notification(&self, notification: &AlertNotification) -> Result<()> {
        self.notifications.lock().unwrap().push(notification.clone());
        Ok(())
    }
}
