use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SessionState {
    Initializing,
    Ready,
    Failed,
    Unsupported,
}

impl Default for SessionState {
    fn default() -> Self {
        SessionState::Initializing
    }
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Initializing => "Initializing",
            SessionState::Ready => "Ready",
            SessionState::Failed => "Failed",
            SessionState::Unsupported => "Unsupported",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, SessionState::Initializing)
    }

    /// Localisation key for the status banner; Ready shows no banner.
    pub fn status_key(&self) -> Option<&'static str> {
        match self {
            SessionState::Initializing => Some("status.initializing"),
            SessionState::Ready => None,
            SessionState::Failed => Some("status.failed"),
            SessionState::Unsupported => Some("status.unsupported"),
        }
    }

    /// Only a timeout is worth retrying; missing hardware support is permanent.
    pub fn retry_offered(&self) -> bool {
        matches!(self, SessionState::Failed)
    }
}

/// What the AR runtime reports about device support.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Availability {
    NotDetermined,
    Unsupported,
    Determined,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionAttempt {
    pub id: String,
    pub started_at: DateTime<Utc>,
}

impl SessionAttempt {
    pub fn begin() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            started_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionStateChanged {
    pub state: SessionState,
    pub attempt_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub attempt: Option<SessionAttempt>,
    pub tracking_enabled: bool,
}
