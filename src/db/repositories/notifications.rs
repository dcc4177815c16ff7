use anyhow::{Context, Result};
use rusqlite::params;

use crate::db::{
    helpers::{format_datetime, parse_datetime},
    models::AlertNotification,
    Database,
};

impl Database {
    pub async fn insert_notification(&self, notification: &AlertNotification) -> Result<()> {
        let record = notification.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO notifications (id, title, body, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![
                    record.id,
                    record.title,
                    record.body,
                    format_datetime(&record.created_at),
                ],
            )
            .with_context(|| "failed to insert notification")?;
            Ok(())
        })
        .await
    }

    /// Newest first.
    pub async fn get_recent_notifications(&self, limit: u32) -> Result<Vec<AlertNotification>> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, title, body, created_at FROM notifications
                 ORDER BY created_at DESC
                 LIMIT ?1",
            )?;
            let mut rows = stmt.query(params![limit])?;
            let mut notifications = Vec::new();
            while let Some(row) = rows.next()? {
                let created_at: String = row.get(3)?;
                notifications.push(AlertNotification {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    body: row.get(2)?,
                    created_at: parse_datetime(&created_at, "created_at")?,
                });
            }
            Ok(notifications)
        })
        .await
    }
}
