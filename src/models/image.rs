use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A generated cover image candidate. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsletterImage {
    pub id: i64,
    pub newsletter_id: i64,
    pub blob_url: String,
    pub prompt: Option<String>,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewImage {
    pub newsletter_id: i64,
    pub blob_url: String,
    pub prompt: String,
    pub provider: String,
    pub model: String,
}
