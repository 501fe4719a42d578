use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An article placed in a newsletter. Source fields are copied at assignment
/// time so later edits to the catalog article do not leak into the issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsletterArticle {
    pub id: i64,
    pub newsletter_id: i64,
    pub article_id: Option<i64>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub publisher: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub ai_title: Option<String>,
    pub ai_description: Option<String>,
    pub newsletter_category: Option<String>,
}

impl NewsletterArticle {
    pub fn display_title(&self) -> &str {
        [self.ai_title.as_deref(), self.title.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|t| !t.is_empty())
            .unwrap_or("Untitled article")
    }
}

#[derive(Debug, Clone)]
pub struct NewAssignment {
    pub newsletter_id: i64,
    pub article_id: i64,
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub publisher: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

/// Partial update of an assignment. `None` leaves a column untouched;
/// `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct AssignmentPatch {
    pub title: Option<Option<String>>,
    pub description: Option<Option<String>>,
    pub ai_title: Option<Option<String>>,
    pub ai_description: Option<Option<String>>,
    pub newsletter_category: Option<Option<String>>,
}

impl AssignmentPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.ai_title.is_none()
            && self.ai_description.is_none()
            && self.newsletter_category.is_none()
    }
}
