use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A persisted model-generated condensation of a transcript. One row per
/// successful completion call; rows are never updated or deleted, and a
/// (transcript, model) pair may have many — "latest" is created_at descending.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub id: Uuid,
    pub transcript_id: Uuid,
    pub model_used: String,
    pub prompt: String,
    pub temperature: f64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// The slice of a summary row echoed back by the summarize endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRecord {
    pub id: Uuid,
    pub content: String,
    pub model_used: String,
    pub created_at: DateTime<Utc>,
}
