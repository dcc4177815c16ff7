use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Row};

use crate::db::{
    helpers::{coordinate_from_columns, format_datetime, parse_datetime},
    models::LocationSample,
    Database,
};

const SELECT_COLUMNS: &str =
    "SELECT id, worker_id, session_id, latitude, longitude, area_label, recorded_at
     FROM location_samples";

fn row_to_sample(row: &Row) -> Result<LocationSample> {
    let latitude: f64 = row.get("latitude")?;
    let longitude: f64 = row.get("longitude")?;
    let recorded_at: String = row.get("recorded_at")?;

    let coordinate = coordinate_from_columns(Some(latitude), Some(longitude), "location_samples")?
        .context("location sample without coordinate")?;

    Ok(LocationSample {
        id: row.get("id")?,
        worker_id: row.get("worker_id")?,
        session_id: row.get("session_id")?,
        coordinate,
        area_label: row.get("area_label")?,
        recorded_at: parse_datetime(&recorded_at, "recorded_at")?,
    })
}

fn query_samples<P: rusqlite::Params>(
    conn: &rusqlite::Connection,
    sql: &str,
    params: P,
) -> Result<Vec<LocationSample>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    let mut samples = Vec::new();
    while let Some(row) = rows.next()? {
        samples.push(row_to_sample(row)?);
    }
    Ok(samples)
}

impl Database {
    pub async fn insert_location_sample(&self, sample: &LocationSample) -> Result<()> {
        let record = sample.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO location_samples (id, worker_id, session_id, latitude, longitude, area_label, recorded_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    record.id,
                    record.worker_id,
                    record.session_id,
                    record.coordinate.latitude,
                    record.coordinate.longitude,
                    record.area_label,
                    format_datetime(&record.recorded_at),
                ],
            )
            .with_context(|| "failed to insert location sample")?;
            Ok(())
        })
        .await
    }

    /// Chronological samples tagged with `session_id`.
    pub async fn get_samples_for_session(&self, session_id: &str) -> Result<Vec<LocationSample>> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            query_samples(
                conn,
                &format!("{SELECT_COLUMNS} WHERE session_id = ?1 ORDER BY recorded_at ASC"),
                params![session_id],
            )
        })
        .await
    }

    /// Chronological samples for a worker with `start <= recorded_at <= end`.
    pub async fn get_samples_in_range(
        &self,
        worker_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<LocationSample>> {
        let worker_id = worker_id.to_string();
        self.execute(move |conn| {
            query_samples(
                conn,
                &format!(
                    "{SELECT_COLUMNS}
                     WHERE worker_id = ?1 AND recorded_at >= ?2 AND recorded_at <= ?3
                     ORDER BY recorded_at ASC"
                ),
                params![worker_id, format_datetime(&start), format_datetime(&end)],
            )
        })
        .await
    }

    /// Chronological samples for a worker on one UTC calendar day.
    pub async fn get_samples_for_day(
        &self,
        worker_id: &str,
        day: NaiveDate,
    ) -> Result<Vec<LocationSample>> {
        let start = day.and_hms_opt(0, 0, 0).context("invalid start of day")?.and_utc();
        let end = day
            .and_hms_micro_opt(23, 59, 59, 999_999)
            .context("invalid end of day")?
            .and_utc();
        self.get_samples_in_range(worker_id, start, end).await
    }
}
