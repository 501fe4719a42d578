use tracing::info;

use crate::db::Repository;
use crate::error::{Result, StoreError};
use crate::models::AssignmentPatch;

const FALLBACK_TITLE: &str = "Breaking AI Update";
const FALLBACK_DESCRIPTION: &str = "Fresh AI signals are shaping what founders should do next.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snippet {
    pub ai_title: String,
    pub ai_description: String,
}

/// Fill the editorial template from the copied title and description.
pub fn draft_snippet(title: Option<&str>, description: Option<&str>) -> Snippet {
    let pick = |value: Option<&str>, fallback: &'static str| {
        value
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(fallback)
            .to_string()
    };
    let title = pick(title, FALLBACK_TITLE);
    let description = pick(description, FALLBACK_DESCRIPTION);

    Snippet {
        ai_title: format!("⚡ {title}: The Founder Playbook Angle"),
        ai_description: format!(
            "Move fast on this: {description} Here's the sharp takeaway, what it means right now, and the next move to stay ahead."
        ),
    }
}

/// Draft a snippet for an assignment and store it as its override text.
pub async fn generate_snippet(repo: &Repository, assignment_id: i64) -> Result<Snippet> {
    let assignment = repo
        .get_assignment(assignment_id)
        .await?
        .ok_or(StoreError::NotFound)?;

    let snippet = draft_snippet(
        assignment.title.as_deref(),
        assignment.description.as_deref(),
    );

    repo.update_assignment(
        assignment_id,
        AssignmentPatch {
            ai_title: Some(Some(snippet.ai_title.clone())),
            ai_description: Some(Some(snippet.ai_description.clone())),
            ..AssignmentPatch::default()
        },
    )
    .await?;

    info!(assignment_id, "Snippet generated");
    Ok(snippet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::{NewArticle, NewAssignment, NewNewsletter, NewsletterStatus};

    #[test]
    fn test_draft_uses_source_text() {
        let snippet = draft_snippet(Some(" Chips rally "), Some("Fabs are sold out."));
        assert_eq!(snippet.ai_title, "⚡ Chips rally: The Founder Playbook Angle");
        assert!(snippet.ai_description.starts_with("Move fast on this: Fabs are sold out. "));
    }

    #[test]
    fn test_draft_falls_back_on_blank_text() {
        let snippet = draft_snippet(None, Some("  "));
        assert_eq!(snippet.ai_title, "⚡ Breaking AI Update: The Founder Playbook Angle");
        assert!(snippet
            .ai_description
            .contains("Fresh AI signals are shaping what founders should do next."));
    }

    #[tokio::test]
    async fn test_generate_stores_override_text() {
        let repo = Repository::new(":memory:").await.unwrap();
        let newsletter_id = repo
            .insert_newsletter(NewNewsletter {
                title: "Weekly".to_string(),
                publish_date: None,
                status: NewsletterStatus::Draft,
            })
            .await
            .unwrap();
        let article_id = repo
            .insert_article(NewArticle {
                title: Some("Alpha".to_string()),
                ..NewArticle::default()
            })
            .await
            .unwrap();
        let id = repo
            .insert_assignment(NewAssignment {
                newsletter_id,
                article_id,
                title: Some("Alpha".to_string()),
                description: None,
                url: None,
                publisher: None,
                published_at: None,
            })
            .await
            .unwrap();

        let snippet = generate_snippet(&repo, id).await.unwrap();

        let row = repo.get_assignment(id).await.unwrap().unwrap();
        assert_eq!(row.ai_title.as_deref(), Some(snippet.ai_title.as_str()));
        assert_eq!(row.display_title(), "⚡ Alpha: The Founder Playbook Angle");
    }

    #[tokio::test]
    async fn test_generate_for_missing_assignment_is_not_found() {
        let repo = Repository::new(":memory:").await.unwrap();
        let err = generate_snippet(&repo, 9).await.unwrap_err();
        assert!(matches!(err, AppError::Store(StoreError::NotFound)));
    }
}
