use chrono::{DateTime, Utc};
use serde::Serialize;

/// A previously generated summary keyed by the external video id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct CachedSummary {
    pub video_id: String,
    pub summary: String,
    pub provider: String,
    pub transcript_length: i64,
    pub created_at: DateTime<Utc>,
}

/// A single credit spent on a successful summarization
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageTransaction {
    pub user_id: String,
    pub video_id: String,
    pub provider: String,
    pub transcript_length: i64,
    pub date: DateTime<Utc>,
}

impl UsageTransaction {
    pub const KIND: &str = "usage";
    pub const CREDITS: i64 = -1;
}

/// Returned by [`crate::DataStore::deduct_credit`] when the balance was spent
/// between the caller's check and the deduction
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("User {user_id} has no credits to deduct")]
pub struct InsufficientCredits {
    pub user_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Completed,
    Error,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Completed => "completed",
            RequestStatus::Error => "error",
        }
    }
}

/// Outcome of one summarization request, kept for auditing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestLog {
    pub user_id: String,
    pub video_id: Option<String>,
    pub transcript_length: i64,
    pub status: RequestStatus,
    pub cache_hit: bool,
    pub provider: Option<String>,
    pub error_kind: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}
