use serde::{Deserialize, Serialize};

/// Shown in alerts when a worker's profile is missing or has no usable name.
pub const UNKNOWN_WORKER_NAME: &str = "Unknown Recruiter";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkerProfile {
    pub id: String,
    pub name: Option<String>,
}

impl WorkerProfile {
    pub fn display_name(&self) -> &str {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => UNKNOWN_WORKER_NAME,
        }
    }
}

/// Display name for an optional profile lookup result.
pub fn display_name_or_unknown(profile: Option<&WorkerProfile>) -> String {
    profile
        .map(WorkerProfile::display_name)
        .unwrap_or(UNKNOWN_WORKER_NAME)
        .to_string()
}
