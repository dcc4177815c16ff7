use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension};

use crate::db::{models::WorkerProfile, Database};

impl Database {
    pub async fn upsert_worker_profile(&self, profile: &WorkerProfile) -> Result<()> {
        let record = profile.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO worker_profiles (id, name) VALUES (?1, ?2)
                 ON CONFLICT (id) DO UPDATE SET name = excluded.name",
                params![record.id, record.name],
            )
            .with_context(|| "failed to upsert worker profile")?;
            Ok(())
        })
        .await
    }

    pub async fn get_worker_profile(&self, worker_id: &str) -> Result<Option<WorkerProfile>> {
        let worker_id = worker_id.to_string();
        self.execute(move |conn| {
            let profile = conn
                .query_row(
                    "SELECT id, name FROM worker_profiles WHERE id = ?1",
                    params![worker_id],
                    |row| {
                        Ok(WorkerProfile {
                            id: row.get(0)?,
                            name: row.get(1)?,
                        })
                    },
                )
                .optional()?;
            Ok(profile)
        })
        .await
    }
}
