use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use crate::db::{Database, LocationSample};

/// Samples to replay for an attendance session, oldest first.
///
/// Samples tagged with the session id win. Older samples may carry no
/// session id, so the lookup falls back to the worker's samples inside the
/// session window, then to everything the worker recorded that day.
pub async fn load_session_route(
    db: &Database,
    session_id: &str,
    now: DateTime<Utc>,
) -> Result<Vec<LocationSample>> {
    let tagged = db
        .get_samples_for_session(session_id)
        .await
        .with_context(|| format!("failed to load samples for session {session_id}"))?;
    if !tagged.is_empty() {
        return Ok(tagged);
    }

    let Some(session) = db.get_attendance_session(session_id).await? else {
        return Ok(Vec::new());
    };

    let (start, end) = session.window(now);
    let in_window = db
        .get_samples_in_range(&session.worker_id, start, end)
        .await?;
    if !in_window.is_empty() {
        return Ok(in_window);
    }

    db.get_samples_for_day(&session.worker_id, session.sign_in_at.date_naive())
        .await
}
