//! Newsletter export: one curated issue rendered as a paste-ready HTML
//! fragment plus a plain-text fallback, and the clipboard handoff.

mod clipboard;
mod html;
mod text;

pub use clipboard::{copy_payload, Clipboard, ClipboardError, CopyMode, SystemClipboard};

use tracing::warn;
use url::Url;

use crate::curation::{group_by_category, Categorized, Category};
use crate::db::Repository;
use crate::error::{Result, StoreError};
use crate::models::NewsletterArticle;

/// The subset of an assignment the export needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArticle {
    pub id: i64,
    pub title: Option<String>,
    pub ai_title: Option<String>,
    pub description: Option<String>,
    pub ai_description: Option<String>,
    pub url: Option<String>,
    pub category: Option<String>,
}

impl ExportArticle {
    pub fn display_title(&self) -> &str {
        first_non_blank([self.ai_title.as_deref(), self.title.as_deref()])
            .unwrap_or("Untitled article")
    }

    pub fn display_description(&self) -> Option<&str> {
        first_non_blank([self.ai_description.as_deref(), self.description.as_deref()])
    }
}

impl Categorized for ExportArticle {
    fn raw_category(&self) -> Option<&str> {
        self.category.as_deref()
    }
}

impl From<NewsletterArticle> for ExportArticle {
    fn from(a: NewsletterArticle) -> Self {
        Self {
            id: a.id,
            title: a.title,
            ai_title: a.ai_title,
            description: a.description,
            ai_description: a.ai_description,
            url: a.url,
            category: a.newsletter_category,
        }
    }
}

fn first_non_blank<const N: usize>(values: [Option<&str>; N]) -> Option<&str> {
    values
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|v| !v.is_empty())
}

#[derive(Debug, Clone, Default)]
pub struct ExportInput {
    pub newsletter_title: Option<String>,
    pub cover_image: Option<String>,
    /// Assignment id of the lead article.
    pub cover_article: Option<i64>,
    pub articles: Vec<ExportArticle>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPayload {
    pub html: String,
    pub text: String,
    /// Assignments whose category has no section, by id.
    pub omitted: Vec<i64>,
}

/// Content in render order: the lead article, then one entry per section.
pub(crate) struct Layout {
    pub cover_image: Option<String>,
    pub image_alt: String,
    pub cover: Option<ExportArticle>,
    pub sections: Vec<(Category, Vec<ExportArticle>)>,
}

pub fn build_payload(input: ExportInput) -> ExportPayload {
    let ExportInput {
        newsletter_title,
        cover_image,
        cover_article,
        mut articles,
    } = input;

    let cover = cover_article
        .and_then(|id| articles.iter().position(|a| a.id == id))
        .map(|index| articles.remove(index));

    let mut grouped = group_by_category(articles);
    let sections: Vec<(Category, Vec<ExportArticle>)> = Category::EXPORT_ORDER
        .into_iter()
        .map(|category| (category, grouped.remove(category.key()).unwrap_or_default()))
        .collect();

    let mut omitted: Vec<i64> = grouped.values().flatten().map(|a| a.id).collect();
    omitted.sort_unstable();
    if !omitted.is_empty() {
        let keys: Vec<&str> = grouped.keys().map(String::as_str).collect();
        warn!(?keys, count = omitted.len(), "Articles left out of export: category has no section");
    }

    let image_alt = newsletter_title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or("Newsletter cover image")
        .to_string();

    let layout = Layout {
        cover_image: safe_image_url(cover_image.as_deref()),
        image_alt,
        cover,
        sections,
    };

    ExportPayload {
        html: html::render(&layout),
        text: text::render(&layout),
        omitted,
    }
}

/// Load a newsletter and its assignments, in curation order, for export.
pub async fn load_export_input(repo: &Repository, newsletter_id: i64) -> Result<ExportInput> {
    let newsletter = repo
        .get_newsletter(newsletter_id)
        .await?
        .ok_or(StoreError::NotFound)?;
    let articles = repo
        .list_assignments_in_curation_order(newsletter_id)
        .await?
        .into_iter()
        .map(ExportArticle::from)
        .collect();

    Ok(ExportInput {
        newsletter_title: newsletter.title,
        cover_image: newsletter.cover_image,
        cover_article: newsletter.cover_article,
        articles,
    })
}

pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn parse_web_url(value: Option<&str>) -> Option<String> {
    let parsed = Url::parse(value?.trim()).ok()?;
    matches!(parsed.scheme(), "http" | "https").then(|| parsed.to_string())
}

/// Link target for an article; anything but http(s) becomes `#`.
pub fn safe_url(value: Option<&str>) -> String {
    parse_web_url(value).unwrap_or_else(|| "#".to_string())
}

pub fn safe_image_url(value: Option<&str>) -> Option<String> {
    parse_web_url(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewArticle, NewAssignment, NewNewsletter, NewsletterStatus};

    pub(super) fn article(id: i64, title: &str, category: Option<&str>) -> ExportArticle {
        ExportArticle {
            id,
            title: Some(title.to_string()),
            ai_title: None,
            description: None,
            ai_description: None,
            url: Some(format!("https://news.example.com/{id}")),
            category: category.map(str::to_string),
        }
    }

    fn unescape_html(value: &str) -> String {
        value
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&#39;", "'")
            .replace("&amp;", "&")
    }

    #[test]
    fn test_escape_round_trip() {
        let raw = r#"Tom & Jerry's <b>"big"</b> day &amp; more"#;
        let escaped = escape_html(raw);
        for c in ['<', '>', '"', '\''] {
            assert!(!escaped.contains(c));
        }
        assert_eq!(unescape_html(&escaped), raw);
    }

    #[test]
    fn test_safe_url_rejects_non_web_schemes() {
        assert_eq!(safe_url(Some("javascript:alert(1)")), "#");
        assert_eq!(safe_url(Some("ftp://files.example.com/x")), "#");
        assert_eq!(safe_url(Some("not a url")), "#");
        assert_eq!(safe_url(None), "#");
        assert_eq!(safe_url(Some("https://example.com/a?b=1")), "https://example.com/a?b=1");
        assert_eq!(safe_image_url(Some("data:image/png;base64,AAAA")), None);
    }

    #[test]
    fn test_display_title_and_description_overrides() {
        let mut a = article(1, "Original", None);
        assert_eq!(a.display_title(), "Original");
        assert_eq!(a.display_description(), None);

        a.ai_title = Some("  ".to_string());
        a.description = Some("Plain".to_string());
        assert_eq!(a.display_title(), "Original");
        assert_eq!(a.display_description(), Some("Plain"));

        a.ai_title = Some("Sharper".to_string());
        a.ai_description = Some("Punchier".to_string());
        assert_eq!(a.display_title(), "Sharper");
        assert_eq!(a.display_description(), Some("Punchier"));

        a.title = None;
        a.ai_title = None;
        assert_eq!(a.display_title(), "Untitled article");
    }

    #[test]
    fn test_unknown_categories_are_reported() {
        let payload = build_payload(ExportInput {
            articles: vec![
                article(1, "Kept", Some("brief")),
                article(2, "Opinion piece", Some("Opinion")),
            ],
            ..ExportInput::default()
        });

        assert_eq!(payload.omitted, vec![2]);
        assert!(payload.html.contains("Kept"));
        assert!(!payload.html.contains("Opinion piece"));
        assert!(!payload.text.contains("Opinion piece"));
    }

    #[test]
    fn test_missing_cover_article_is_ignored() {
        let payload = build_payload(ExportInput {
            cover_article: Some(99),
            articles: vec![article(1, "Lead", Some("feature"))],
            ..ExportInput::default()
        });
        assert_eq!(payload.text, "- Lead (https://news.example.com/1)");
    }

    #[tokio::test]
    async fn test_load_export_input_in_curation_order() {
        let repo = Repository::new(":memory:").await.unwrap();
        let newsletter_id = repo
            .insert_newsletter(NewNewsletter {
                title: "Issue 12".to_string(),
                publish_date: None,
                status: NewsletterStatus::Draft,
            })
            .await
            .unwrap();

        let mut assignment_ids = Vec::new();
        for title in ["First", "Second"] {
            let article_id = repo
                .insert_article(NewArticle {
                    title: Some(title.to_string()),
                    ..NewArticle::default()
                })
                .await
                .unwrap();
            let id = repo
                .insert_assignment(NewAssignment {
                    newsletter_id,
                    article_id,
                    title: Some(title.to_string()),
                    description: None,
                    url: None,
                    publisher: None,
                    published_at: None,
                })
                .await
                .unwrap();
            assignment_ids.push(id);
        }
        repo.update_cover_article(newsletter_id, Some(assignment_ids[1]))
            .await
            .unwrap();

        let input = load_export_input(&repo, newsletter_id).await.unwrap();

        assert_eq!(input.newsletter_title.as_deref(), Some("Issue 12"));
        assert_eq!(input.cover_article, Some(assignment_ids[1]));
        let ids: Vec<i64> = input.articles.iter().map(|a| a.id).collect();
        assert_eq!(ids, assignment_ids);
    }

    #[tokio::test]
    async fn test_load_export_input_missing_newsletter() {
        let repo = Repository::new(":memory:").await.unwrap();
        let err = load_export_input(&repo, 5).await.unwrap_err();
        assert!(matches!(
            err,
            crate::error::AppError::Store(StoreError::NotFound)
        ));
    }
}
