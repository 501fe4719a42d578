use chrono::{DateTime, Utc};
use rusqlite::functions::FunctionFlags;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, OptionalExtension, Row};
use tokio_rusqlite::Connection;

use crate::error::{Result, StoreError};
use crate::models::{
    Article, AssignmentPatch, NewArticle, NewAssignment, NewImage, NewNewsletter, Newsletter,
    NewsletterArticle, NewsletterImage, NewsletterStatus,
};

use super::schema::SCHEMA;

const ARTICLE_COLUMNS: &str =
    "id, title, description, url, publisher, category, published_at, created_at";
const NEWSLETTER_COLUMNS: &str =
    "id, title, intro, publish_date, status, cover_image, cover_article, created_at";
const ASSIGNMENT_COLUMNS: &str = "id, newsletter_id, article_id, title, description, url, publisher, published_at, ai_title, ai_description, newsletter_category";
const IMAGE_COLUMNS: &str = "id, newsletter_id, blob_url, prompt, provider, model, created_at";

/// Ordering for article listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InboxSort {
    #[default]
    Newest,
    Oldest,
    PublishedNewest,
    PublishedOldest,
    TitleAz,
    TitleZa,
}

impl InboxSort {
    pub fn cycle(&self) -> Self {
        match self {
            InboxSort::Newest => InboxSort::Oldest,
            InboxSort::Oldest => InboxSort::PublishedNewest,
            InboxSort::PublishedNewest => InboxSort::PublishedOldest,
            InboxSort::PublishedOldest => InboxSort::TitleAz,
            InboxSort::TitleAz => InboxSort::TitleZa,
            InboxSort::TitleZa => InboxSort::Newest,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            InboxSort::Newest => "Newest",
            InboxSort::Oldest => "Oldest",
            InboxSort::PublishedNewest => "Published (newest)",
            InboxSort::PublishedOldest => "Published (oldest)",
            InboxSort::TitleAz => "Title A-Z",
            InboxSort::TitleZa => "Title Z-A",
        }
    }

    /// Undated and untitled rows always sort last.
    fn order_by(&self) -> &'static str {
        match self {
            InboxSort::Newest => "id DESC",
            InboxSort::Oldest => "id ASC",
            InboxSort::PublishedNewest => "published_at IS NULL, published_at DESC, id DESC",
            InboxSort::PublishedOldest => "published_at IS NULL, published_at ASC, id ASC",
            InboxSort::TitleAz => "title IS NULL, fold_case(title) ASC, id ASC",
            InboxSort::TitleZa => "title IS NULL, fold_case(title) DESC, id DESC",
        }
    }
}

/// Filter on the catalog article's own `category` column.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    /// NULL or blank category.
    Uncategorized,
    /// Lower-cased, trimmed category key.
    Named(String),
}

/// Typed article query: exclusion set, free-text search, category, sort.
#[derive(Debug, Clone, Default)]
pub struct ArticleQuery {
    pub exclude_ids: Vec<i64>,
    pub search: Option<String>,
    pub category: CategoryFilter,
    pub sort: InboxSort,
    pub limit: Option<usize>,
}

impl ArticleQuery {
    fn to_sql(&self) -> (String, Vec<Value>) {
        let mut sql = format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE 1 = 1");
        let mut values: Vec<Value> = Vec::new();

        // An empty NOT IN list is left out entirely.
        if !self.exclude_ids.is_empty() {
            let placeholders = vec!["?"; self.exclude_ids.len()].join(", ");
            sql.push_str(&format!(" AND id NOT IN ({placeholders})"));
            values.extend(self.exclude_ids.iter().map(|id| Value::Integer(*id)));
        }

        match &self.category {
            CategoryFilter::All => {}
            CategoryFilter::Uncategorized => {
                sql.push_str(" AND (category IS NULL OR trim(category) = '')");
            }
            CategoryFilter::Named(key) => {
                sql.push_str(" AND fold_case(trim(category)) = ?");
                values.push(Value::Text(key.clone()));
            }
        }

        if let Some(term) = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
        {
            let term = term.to_lowercase();
            sql.push_str(
                " AND (instr(fold_case(coalesce(title, '')), ?) > 0 \
                 OR instr(fold_case(coalesce(description, '')), ?) > 0 \
                 OR instr(fold_case(coalesce(publisher, '')), ?) > 0)",
            );
            for _ in 0..3 {
                values.push(Value::Text(term.clone()));
            }
        }

        sql.push_str(&format!(" ORDER BY {}", self.sort.order_by()));

        if let Some(limit) = self.limit {
            sql.push_str(" LIMIT ?");
            values.push(Value::Integer(limit as i64));
        }

        (sql, values)
    }
}

/// SQLite's `lower()` and `NOCASE` only fold ASCII. `fold_case` applies the
/// same Unicode lowercasing that search terms get on the Rust side.
fn register_functions(conn: &rusqlite::Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "fold_case",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let value: Option<String> = ctx.get(0)?;
            Ok(value.map(|s| s.to_lowercase()))
        },
    )
}

#[derive(Clone)]
pub struct Repository {
    conn: Connection,
}

impl Repository {
    pub async fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await?;

        conn.call(|conn| {
            register_functions(conn)?;
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    // Article operations

    pub async fn insert_article(&self, article: NewArticle) -> Result<i64> {
        let id = self
            .conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO articles (title, description, url, publisher, category, published_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        article.title,
                        article.description,
                        article.url,
                        article.publisher,
                        article.category,
                        article.published_at.map(|dt| dt.to_rfc3339()),
                    ],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;
        Ok(id)
    }

    pub async fn get_article(&self, id: i64) -> Result<Option<Article>> {
        let article = self
            .conn
            .call(move |conn| {
                let article = conn
                    .query_row(
                        &format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = ?1"),
                        params![id],
                        article_from_row,
                    )
                    .optional()?;
                Ok(article)
            })
            .await?;
        Ok(article)
    }

    /// Assignments keep their copied fields; their `article_id` is nulled.
    pub async fn delete_article(&self, id: i64) -> Result<usize> {
        let deleted = self
            .conn
            .call(move |conn| {
                let deleted = conn.execute("DELETE FROM articles WHERE id = ?1", params![id])?;
                Ok(deleted)
            })
            .await?;
        Ok(deleted)
    }

    pub async fn query_articles(&self, query: ArticleQuery) -> Result<Vec<Article>> {
        let (sql, values) = query.to_sql();
        let articles = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&sql)?;
                let articles = stmt
                    .query_map(params_from_iter(values.iter()), article_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(articles)
            })
            .await?;
        Ok(articles)
    }

    // Newsletter operations

    pub async fn insert_newsletter(&self, newsletter: NewNewsletter) -> Result<i64> {
        let id = self
            .conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO newsletters (title, publish_date, status) VALUES (?1, ?2, ?3)",
                    params![
                        newsletter.title,
                        newsletter.publish_date.map(|dt| dt.to_rfc3339()),
                        newsletter.status.as_str(),
                    ],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;
        Ok(id)
    }

    pub async fn get_newsletter(&self, id: i64) -> Result<Option<Newsletter>> {
        let newsletter = self
            .conn
            .call(move |conn| {
                let newsletter = conn
                    .query_row(
                        &format!("SELECT {NEWSLETTER_COLUMNS} FROM newsletters WHERE id = ?1"),
                        params![id],
                        newsletter_from_row,
                    )
                    .optional()?;
                Ok(newsletter)
            })
            .await?;
        Ok(newsletter)
    }

    pub async fn list_newsletters(&self) -> Result<Vec<Newsletter>> {
        let newsletters = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {NEWSLETTER_COLUMNS} FROM newsletters ORDER BY publish_date IS NULL, publish_date DESC, id DESC"
                ))?;
                let newsletters = stmt
                    .query_map([], newsletter_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(newsletters)
            })
            .await?;
        Ok(newsletters)
    }

    pub async fn update_newsletter_details(
        &self,
        id: i64,
        title: String,
        intro: Option<String>,
    ) -> Result<()> {
        self.update_newsletter(
            "UPDATE newsletters SET title = ?1, intro = ?2 WHERE id = ?3",
            vec![Value::Text(title), optional_text(intro), Value::Integer(id)],
        )
        .await
    }

    pub async fn update_publish_date(&self, id: i64, publish_date: Option<DateTime<Utc>>) -> Result<()> {
        self.update_newsletter(
            "UPDATE newsletters SET publish_date = ?1 WHERE id = ?2",
            vec![
                optional_text(publish_date.map(|dt| dt.to_rfc3339())),
                Value::Integer(id),
            ],
        )
        .await
    }

    pub async fn update_status(&self, id: i64, status: NewsletterStatus) -> Result<()> {
        self.update_newsletter(
            "UPDATE newsletters SET status = ?1 WHERE id = ?2",
            vec![Value::Text(status.as_str().to_string()), Value::Integer(id)],
        )
        .await
    }

    pub async fn update_cover_image(&self, id: i64, cover_image: Option<String>) -> Result<()> {
        self.update_newsletter(
            "UPDATE newsletters SET cover_image = ?1 WHERE id = ?2",
            vec![optional_text(cover_image), Value::Integer(id)],
        )
        .await
    }

    pub async fn update_cover_article(&self, id: i64, assignment_id: Option<i64>) -> Result<()> {
        self.update_newsletter(
            "UPDATE newsletters SET cover_article = ?1 WHERE id = ?2",
            vec![
                assignment_id.map(Value::Integer).unwrap_or(Value::Null),
                Value::Integer(id),
            ],
        )
        .await
    }

    async fn update_newsletter(&self, sql: &'static str, values: Vec<Value>) -> Result<()> {
        let changed = self
            .conn
            .call(move |conn| {
                let changed = conn.execute(sql, params_from_iter(values.iter()))?;
                Ok(changed)
            })
            .await?;
        if changed == 0 {
            return Err(StoreError::NotFound.into());
        }
        Ok(())
    }

    // Assignment operations

    /// Newest assignment first.
    pub async fn list_assignments(&self, newsletter_id: i64) -> Result<Vec<NewsletterArticle>> {
        self.list_assignments_ordered(newsletter_id, "id DESC").await
    }

    /// Oldest assignment first, the order articles were curated in.
    pub async fn list_assignments_in_curation_order(
        &self,
        newsletter_id: i64,
    ) -> Result<Vec<NewsletterArticle>> {
        self.list_assignments_ordered(newsletter_id, "id ASC").await
    }

    async fn list_assignments_ordered(
        &self,
        newsletter_id: i64,
        order: &'static str,
    ) -> Result<Vec<NewsletterArticle>> {
        let assignments = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {ASSIGNMENT_COLUMNS} FROM newsletter_articles WHERE newsletter_id = ?1 ORDER BY {order}"
                ))?;
                let assignments = stmt
                    .query_map(params![newsletter_id], assignment_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(assignments)
            })
            .await?;
        Ok(assignments)
    }

    pub async fn get_assignment(&self, id: i64) -> Result<Option<NewsletterArticle>> {
        let assignment = self
            .conn
            .call(move |conn| {
                let assignment = conn
                    .query_row(
                        &format!("SELECT {ASSIGNMENT_COLUMNS} FROM newsletter_articles WHERE id = ?1"),
                        params![id],
                        assignment_from_row,
                    )
                    .optional()?;
                Ok(assignment)
            })
            .await?;
        Ok(assignment)
    }

    /// Existing assignment id for a (newsletter, article) pair, if any.
    pub async fn find_assignment(&self, newsletter_id: i64, article_id: i64) -> Result<Option<i64>> {
        let id = self
            .conn
            .call(move |conn| {
                let id = conn
                    .query_row(
                        "SELECT id FROM newsletter_articles WHERE newsletter_id = ?1 AND article_id = ?2 LIMIT 1",
                        params![newsletter_id, article_id],
                        |row| row.get(0),
                    )
                    .optional()?;
                Ok(id)
            })
            .await?;
        Ok(id)
    }

    /// Fails with `StoreError::Conflict` if the pair is already assigned.
    pub async fn insert_assignment(&self, assignment: NewAssignment) -> Result<i64> {
        let id = self
            .conn
            .call(move |conn| {
                conn.execute(
                    r#"INSERT INTO newsletter_articles
                           (newsletter_id, article_id, title, description, url, publisher, published_at)
                       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"#,
                    params![
                        assignment.newsletter_id,
                        assignment.article_id,
                        assignment.title,
                        assignment.description,
                        assignment.url,
                        assignment.publisher,
                        assignment.published_at.map(|dt| dt.to_rfc3339()),
                    ],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;
        Ok(id)
    }

    pub async fn assignment_newsletter_id(&self, id: i64) -> Result<Option<i64>> {
        let newsletter_id = self
            .conn
            .call(move |conn| {
                let newsletter_id = conn
                    .query_row(
                        "SELECT newsletter_id FROM newsletter_articles WHERE id = ?1",
                        params![id],
                        |row| row.get(0),
                    )
                    .optional()?;
                Ok(newsletter_id)
            })
            .await?;
        Ok(newsletter_id)
    }

    pub async fn update_assignment(&self, id: i64, patch: AssignmentPatch) -> Result<()> {
        if patch.is_empty() {
            return Ok(());
        }

        let mut sets = Vec::new();
        let mut values = Vec::new();
        let fields = [
            ("title", patch.title),
            ("description", patch.description),
            ("ai_title", patch.ai_title),
            ("ai_description", patch.ai_description),
            ("newsletter_category", patch.newsletter_category),
        ];
        for (column, value) in fields {
            if let Some(value) = value {
                sets.push(format!("{column} = ?"));
                values.push(optional_text(value));
            }
        }
        values.push(Value::Integer(id));
        let sql = format!("UPDATE newsletter_articles SET {} WHERE id = ?", sets.join(", "));

        let changed = self
            .conn
            .call(move |conn| {
                let changed = conn.execute(&sql, params_from_iter(values.iter()))?;
                Ok(changed)
            })
            .await?;
        if changed == 0 {
            return Err(StoreError::NotFound.into());
        }
        Ok(())
    }

    /// Returns the number of rows removed (0 when already gone).
    pub async fn delete_assignment(&self, id: i64) -> Result<usize> {
        let deleted = self
            .conn
            .call(move |conn| {
                let deleted = conn.execute(
                    "DELETE FROM newsletter_articles WHERE id = ?1",
                    params![id],
                )?;
                Ok(deleted)
            })
            .await?;
        Ok(deleted)
    }

    // Image operations

    pub async fn insert_image(&self, image: NewImage) -> Result<i64> {
        let id = self
            .conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO newsletter_images (newsletter_id, blob_url, prompt, provider, model) VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        image.newsletter_id,
                        image.blob_url,
                        image.prompt,
                        image.provider,
                        image.model,
                    ],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;
        Ok(id)
    }

    pub async fn list_images(&self, newsletter_id: i64) -> Result<Vec<NewsletterImage>> {
        let images = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {IMAGE_COLUMNS} FROM newsletter_images WHERE newsletter_id = ?1 ORDER BY id DESC"
                ))?;
                let images = stmt
                    .query_map(params![newsletter_id], image_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(images)
            })
            .await?;
        Ok(images)
    }

    pub async fn find_image_by_url(&self, newsletter_id: i64, url: String) -> Result<Option<i64>> {
        let id = self
            .conn
            .call(move |conn| {
                let id = conn
                    .query_row(
                        "SELECT id FROM newsletter_images WHERE newsletter_id = ?1 AND blob_url = ?2 LIMIT 1",
                        params![newsletter_id, url],
                        |row| row.get(0),
                    )
                    .optional()?;
                Ok(id)
            })
            .await?;
        Ok(id)
    }
}

fn optional_text(value: Option<String>) -> Value {
    value.map(Value::Text).unwrap_or(Value::Null)
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    // Try RFC3339 first (e.g., "2026-01-11T12:34:56+00:00")
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // Try SQLite datetime format (e.g., "2026-01-11 12:34:56")
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}

fn optional_datetime(row: &Row, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    Ok(row
        .get::<_, Option<String>>(idx)?
        .and_then(|s| parse_datetime(&s)))
}

fn required_datetime(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    Ok(optional_datetime(row, idx)?.unwrap_or_else(Utc::now))
}

fn article_from_row(row: &Row) -> rusqlite::Result<Article> {
    Ok(Article {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        url: row.get(3)?,
        publisher: row.get(4)?,
        category: row.get(5)?,
        published_at: optional_datetime(row, 6)?,
        created_at: required_datetime(row, 7)?,
    })
}

fn newsletter_from_row(row: &Row) -> rusqlite::Result<Newsletter> {
    Ok(Newsletter {
        id: row.get(0)?,
        title: row.get(1)?,
        sub_title: row.get(2)?,
        publish_date: optional_datetime(row, 3)?,
        status: NewsletterStatus::parse(&row.get::<_, String>(4)?),
        cover_image: row.get(5)?,
        cover_article: row.get(6)?,
        created_at: required_datetime(row, 7)?,
    })
}

fn assignment_from_row(row: &Row) -> rusqlite::Result<NewsletterArticle> {
    Ok(NewsletterArticle {
        id: row.get(0)?,
        newsletter_id: row.get(1)?,
        article_id: row.get(2)?,
        title: row.get(3)?,
        description: row.get(4)?,
        url: row.get(5)?,
        publisher: row.get(6)?,
        published_at: optional_datetime(row, 7)?,
        ai_title: row.get(8)?,
        ai_description: row.get(9)?,
        newsletter_category: row.get(10)?,
    })
}

fn image_from_row(row: &Row) -> rusqlite::Result<NewsletterImage> {
    Ok(NewsletterImage {
        id: row.get(0)?,
        newsletter_id: row.get(1)?,
        blob_url: row.get(2)?,
        prompt: row.get(3)?,
        provider: row.get(4)?,
        model: row.get(5)?,
        created_at: required_datetime(row, 6)?,
    })
}
