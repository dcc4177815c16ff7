use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Row};

use crate::db::{
    helpers::{format_datetime, parse_datetime, parse_optional_datetime},
    models::AttendanceSession,
    Database,
};

fn row_to_session(row: &Row) -> Result<AttendanceSession> {
    let sign_in_at: String = row.get("sign_in_at")?;
    let sign_out_at: Option<String> = row.get("sign_out_at")?;

    Ok(AttendanceSession {
        id: row.get("id")?,
        worker_id: row.get("worker_id")?,
        sign_in_at: parse_datetime(&sign_in_at, "sign_in_at")?,
        sign_out_at: parse_optional_datetime(sign_out_at, "sign_out_at")?,
    })
}

impl Database {
    pub async fn insert_attendance_session(&self, session: &AttendanceSession) -> Result<()> {
        let record = session.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO attendance_sessions (id, worker_id, sign_in_at, sign_out_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    record.id,
                    record.worker_id,
                    format_datetime(&record.sign_in_at),
                    record.sign_out_at.map(|dt| format_datetime(&dt)),
                ],
            )
            .with_context(|| "failed to insert attendance session")?;
            Ok(())
        })
        .await
    }

    pub async fn close_attendance_session(
        &self,
        session_id: &str,
        sign_out_at: DateTime<Utc>,
    ) -> Result<()> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            conn.execute(
                "UPDATE attendance_sessions SET sign_out_at = ?1 WHERE id = ?2",
                params![format_datetime(&sign_out_at), session_id],
            )
            .with_context(|| "failed to close attendance session")?;
            Ok(())
        })
        .await
    }

    pub async fn get_attendance_session(&self, session_id: &str) -> Result<Option<AttendanceSession>> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, worker_id, sign_in_at, sign_out_at
                 FROM attendance_sessions
                 WHERE id = ?1",
            )?;
            let mut rows = stmt.query(params![session_id])?;
            match rows.next()? {
                Some(row) => Ok(Some(row_to_session(row)?)),
                None => Ok(None),
            }
        })
        .await
    }
}
