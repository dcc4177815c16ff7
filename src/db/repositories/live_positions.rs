use std::collections::HashSet;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::params;

use crate::db::{
    helpers::{coordinate_from_columns, format_datetime, parse_datetime},
    models::{LivePosition, UNNAMED_WORKER},
    Database,
};

impl Database {
    /// One entry per worker with an open session that started at or after
    /// `since`, holding that worker's newest sample. Workers with no samples
    /// are left out. Newest first.
    pub async fn latest_locations_for_active_workers(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<LivePosition>> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT s.worker_id, p.name, s.latitude, s.longitude, s.area_label, s.recorded_at
                 FROM location_samples s
                 JOIN (
                     SELECT DISTINCT worker_id
                     FROM attendance_sessions
                     WHERE sign_out_at IS NULL AND sign_in_at >= ?1
                 ) active ON active.worker_id = s.worker_id
                 LEFT JOIN worker_profiles p ON p.id = s.worker_id
                 ORDER BY s.recorded_at DESC",
            )?;
            let mut rows = stmt.query(params![format_datetime(&since)])?;

            let mut seen = HashSet::new();
            let mut positions = Vec::new();
            while let Some(row) = rows.next()? {
                let worker_id: String = row.get(0)?;
                if !seen.insert(worker_id.clone()) {
                    continue;
                }

                let name: Option<String> = row.get(1)?;
                let coordinate =
                    coordinate_from_columns(row.get(2)?, row.get(3)?, "location_samples")?
                        .context("location sample without coordinate")?;
                let recorded_at: String = row.get(5)?;

                positions.push(LivePosition {
                    worker_name: name
                        .map(|name| name.trim().to_string())
                        .filter(|name| !name.is_empty())
                        .unwrap_or_else(|| UNNAMED_WORKER.to_string()),
                    worker_id,
                    coordinate,
                    area_label: row.get(4)?,
                    recorded_at: parse_datetime(&recorded_at, "recorded_at")?,
                });
            }
            Ok(positions)
        })
        .await
    }
}
