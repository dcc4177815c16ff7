use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

use super::models::{AlertNotification, LocationSample, WorkAssignment, WorkerProfile};
use super::Database;

/// The record store the tracking core writes samples to and reads
/// assignments and profiles from.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn insert_location_sample(&self, sample: &LocationSample) -> Result<()>;

    async fn get_assignment(&self, worker_id: &str, date: NaiveDate)
        -> Result<Option<WorkAssignment>>;

    async fn get_worker_profile(&self, worker_id: &str) -> Result<Option<WorkerProfile>>;

    /// Adds an entry to the notifications feed.
    async fn insert_notification(&self, notification: &AlertNotification) -> Result<()>;
}

#[async_trait]
impl RecordStore for Database {
    async fn insert_location_sample(&self, sample: &LocationSample) -> Result<()> {
        Database::insert_location_sample(self, sample).await
    }

    async fn get_assignment(
        &self,
        worker_id: &str,
        date: NaiveDate,
    ) -> Result<Option<WorkAssignment>> {
        Database::get_assignment(self, worker_id, date).await
    }

    async fn get_worker_profile(&self, worker_id: &str) -> Result<Option<WorkerProfile>> {
        Database::get_worker_profile(self, worker_id).await
    }

    async fn insert_notification(&self, notification: &AlertNotification) -> Result<()> {
        Database::insert_notification(self, notification).await
    }
}
