use tracing::{info, warn};

use crate::db::Repository;
use crate::error::{AppError, Result, StoreError};
use crate::models::{Article, AssignmentPatch, NewAssignment, NewsletterArticle};

use super::category::{normalize, Category};
use super::InboxQuery;

/// The two disjoint article sets shown while curating one newsletter.
#[derive(Debug, Clone, Default)]
pub struct CurationSets {
    /// Newest assignment first.
    pub curated: Vec<NewsletterArticle>,
    pub inbox: Vec<Article>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added(i64),
    AlreadyPresent,
}

fn require_id(id: i64, what: &str) -> Result<()> {
    if id <= 0 {
        return Err(AppError::validation(format!("Invalid {what} id")));
    }
    Ok(())
}

pub async fn load_sets(
    repo: &Repository,
    newsletter_id: i64,
    query: &InboxQuery,
) -> Result<CurationSets> {
    require_id(newsletter_id, "newsletter")?;

    let curated = repo.list_assignments(newsletter_id).await?;
    let exclude_ids: Vec<i64> = curated.iter().filter_map(|a| a.article_id).collect();
    let inbox = repo
        .query_articles(query.to_article_query(exclude_ids))
        .await?;

    Ok(CurationSets { curated, inbox })
}

/// Assign an article to a newsletter. Repeating the call is a no-op success.
pub async fn add_article(
    repo: &Repository,
    article_id: i64,
    newsletter_id: i64,
) -> Result<AddOutcome> {
    require_id(article_id, "article")?;
    require_id(newsletter_id, "newsletter")?;

    if repo.find_assignment(newsletter_id, article_id).await?.is_some() {
        info!(article_id, newsletter_id, "Article already curated");
        return Ok(AddOutcome::AlreadyPresent);
    }

    let article = repo
        .get_article(article_id)
        .await?
        .ok_or_else(|| AppError::validation(format!("Article {article_id} not found")))?;

    let assignment = NewAssignment {
        newsletter_id,
        article_id: article.id,
        title: article.title,
        description: article.description,
        url: article.url,
        publisher: article.publisher,
        published_at: article.published_at,
    };

    match repo.insert_assignment(assignment).await {
        Ok(id) => {
            info!(article_id, newsletter_id, assignment_id = id, "Article added to newsletter");
            Ok(AddOutcome::Added(id))
        }
        Err(AppError::Store(StoreError::Conflict)) => {
            warn!(article_id, newsletter_id, "Concurrent add collided, treating as present");
            Ok(AddOutcome::AlreadyPresent)
        }
        Err(e) => Err(e),
    }
}

/// Delete an assignment. Returns the owning newsletter id so the caller can
/// refresh that newsletter's views, or `None` when the row was already gone.
pub async fn remove_article(repo: &Repository, assignment_id: i64) -> Result<Option<i64>> {
    require_id(assignment_id, "newsletter article")?;

    let newsletter_id = match repo.assignment_newsletter_id(assignment_id).await {
        Ok(id) => id,
        Err(e) => {
            warn!(assignment_id, "Owner lookup failed before removal: {}", e);
            None
        }
    };

    let deleted = repo.delete_assignment(assignment_id).await?;
    if deleted == 0 {
        info!(assignment_id, "Assignment already removed");
        return Ok(None);
    }

    info!(assignment_id, ?newsletter_id, "Article removed from newsletter");
    Ok(newsletter_id)
}

/// Store the normalized category and return it.
pub async fn set_category(repo: &Repository, assignment_id: i64, raw: &str) -> Result<String> {
    require_id(assignment_id, "newsletter article")?;

    let key = normalize(Some(raw));
    if Category::from_key(&key).is_none() {
        warn!(assignment_id, category = %key, "Category outside the newsletter sections");
    }

    repo.update_assignment(
        assignment_id,
        AssignmentPatch {
            newsletter_category: Some(Some(key.clone())),
            ..AssignmentPatch::default()
        },
    )
    .await?;

    Ok(key)
}

/// Partial content edit. Blank text clears a field; the category is normalized.
pub async fn update_content(
    repo: &Repository,
    assignment_id: i64,
    patch: AssignmentPatch,
) -> Result<()> {
    require_id(assignment_id, "newsletter article")?;

    let clean = |field: Option<Option<String>>| {
        field.map(|value| {
            value
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
    };

    let patch = AssignmentPatch {
        title: clean(patch.title),
        description: clean(patch.description),
        ai_title: clean(patch.ai_title),
        ai_description: clean(patch.ai_description),
        newsletter_category: patch
            .newsletter_category
            .map(|value| Some(normalize(value.as_deref()))),
    };

    repo.update_assignment(assignment_id, patch).await?;
    info!(assignment_id, "Newsletter article updated");
    Ok(())
}
