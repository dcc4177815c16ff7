use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension};

use crate::db::{
    helpers::{coordinate_from_columns, format_date, parse_date},
    models::WorkAssignment,
    Database,
};

impl Database {
    /// Insert or replace the assignment for the worker and day.
    pub async fn upsert_assignment(&self, assignment: &WorkAssignment) -> Result<()> {
        let record = assignment.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO work_assignments (worker_id, assignment_date, location_label, latitude, longitude)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT (worker_id, assignment_date) DO UPDATE SET
                     location_label = excluded.location_label,
                     latitude = excluded.latitude,
                     longitude = excluded.longitude",
                params![
                    record.worker_id,
                    format_date(record.date),
                    record.location_label,
                    record.coordinate.map(|c| c.latitude),
                    record.coordinate.map(|c| c.longitude),
                ],
            )
            .with_context(|| "failed to upsert work assignment")?;
            Ok(())
        })
        .await
    }

    pub async fn get_assignment(
        &self,
        worker_id: &str,
        date: NaiveDate,
    ) -> Result<Option<WorkAssignment>> {
        let worker_id = worker_id.to_string();
        self.execute(move |conn| {
            let row = conn
                .query_row(
                    "SELECT worker_id, assignment_date, location_label, latitude, longitude
                     FROM work_assignments
                     WHERE worker_id = ?1 AND assignment_date = ?2",
                    params![worker_id, format_date(date)],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                            row.get::<_, Option<f64>>(3)?,
                            row.get::<_, Option<f64>>(4)?,
                        ))
                    },
                )
                .optional()?;

            let Some((worker_id, date, location_label, latitude, longitude)) = row else {
                return Ok(None);
            };

            Ok(Some(WorkAssignment {
                worker_id,
                date: parse_date(&date, "assignment_date")?,
                location_label,
                coordinate: coordinate_from_columns(latitude, longitude, "work_assignments")?,
            }))
        })
        .await
    }
}
