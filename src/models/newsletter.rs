use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NewsletterStatus {
    #[default]
    Draft,
    Scheduled,
    Sent,
    Archived,
}

impl NewsletterStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NewsletterStatus::Draft => "draft",
            NewsletterStatus::Scheduled => "scheduled",
            NewsletterStatus::Sent => "sent",
            NewsletterStatus::Archived => "archived",
        }
    }

    /// Unknown values read back from the store fall back to draft.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "scheduled" => NewsletterStatus::Scheduled,
            "sent" => NewsletterStatus::Sent,
            "archived" => NewsletterStatus::Archived,
            _ => NewsletterStatus::Draft,
        }
    }

    pub fn cycle(&self) -> Self {
        match self {
            NewsletterStatus::Draft => NewsletterStatus::Scheduled,
            NewsletterStatus::Scheduled => NewsletterStatus::Sent,
            NewsletterStatus::Sent => NewsletterStatus::Archived,
            NewsletterStatus::Archived => NewsletterStatus::Draft,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Newsletter {
    pub id: i64,
    pub title: Option<String>,
    pub sub_title: Option<String>,
    pub publish_date: Option<DateTime<Utc>>,
    pub status: NewsletterStatus,
    pub cover_image: Option<String>,
    /// Id of the `NewsletterArticle` that leads the export.
    pub cover_article: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl Newsletter {
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or("Untitled newsletter")
    }
}

#[derive(Debug, Clone)]
pub struct NewNewsletter {
    pub title: String,
    pub publish_date: Option<DateTime<Utc>>,
    pub status: NewsletterStatus,
}
