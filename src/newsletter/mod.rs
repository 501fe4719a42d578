mod cover;

pub use cover::{select_cover_image, CoverImagePipeline};

use chrono::{DateTime, NaiveDate, Utc};
use tracing::info;

use crate::db::Repository;
use crate::error::{AppError, Result};
use crate::models::{NewNewsletter, NewsletterStatus};

/// Accepts RFC 3339 or a bare `YYYY-MM-DD` (midnight UTC). Blank means none.
pub fn parse_publish_date(raw: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(None);
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(dt.with_timezone(&Utc)));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(Some(midnight.and_utc()));
        }
    }

    Err(AppError::validation(format!("Invalid publish date: {raw}")))
}

fn required_title(title: &str) -> Result<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::validation("Newsletter title is required"));
    }
    Ok(title.to_string())
}

pub async fn create_newsletter(
    repo: &Repository,
    title: &str,
    publish_date: Option<&str>,
) -> Result<i64> {
    let title = required_title(title)?;
    let publish_date = parse_publish_date(publish_date)?;

    let id = repo
        .insert_newsletter(NewNewsletter {
            title,
            publish_date,
            status: NewsletterStatus::Draft,
        })
        .await?;

    info!(newsletter_id = id, "Newsletter created");
    Ok(id)
}

pub async fn update_details(
    repo: &Repository,
    id: i64,
    title: &str,
    sub_title: Option<&str>,
) -> Result<()> {
    let title = required_title(title)?;
    let sub_title = sub_title
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    repo.update_newsletter_details(id, title, sub_title).await?;
    info!(newsletter_id = id, "Newsletter details updated");
    Ok(())
}

pub async fn update_publish_date(repo: &Repository, id: i64, raw: Option<&str>) -> Result<()> {
    let publish_date = parse_publish_date(raw)?;
    repo.update_publish_date(id, publish_date).await?;
    info!(newsletter_id = id, ?publish_date, "Publish date updated");
    Ok(())
}

/// Designate (or clear) the lead article. It must be curated in this newsletter.
pub async fn set_cover_article(
    repo: &Repository,
    newsletter_id: i64,
    assignment_id: Option<i64>,
) -> Result<()> {
    if let Some(assignment_id) = assignment_id {
        let owner = repo.assignment_newsletter_id(assignment_id).await?;
        if owner != Some(newsletter_id) {
            return Err(AppError::validation(
                "Selected article is not part of this newsletter",
            ));
        }
    }

    repo.update_cover_article(newsletter_id, assignment_id).await?;
    info!(newsletter_id, ?assignment_id, "Cover article set");
    Ok(())
}

pub async fn set_status(repo: &Repository, id: i64, status: NewsletterStatus) -> Result<()> {
    repo.update_status(id, status).await?;
    info!(newsletter_id = id, status = status.as_str(), "Newsletter status changed");
    Ok(())
}
