pub const SCHEMA: &str = r#"
PRAGMA foreign_keys = ON;

-- articles table (catalog)
CREATE TABLE IF NOT EXISTS articles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT,
    description TEXT,
    url TEXT,
    publisher TEXT,
    category TEXT,
    published_at TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_articles_published_at ON articles(published_at DESC);

-- newsletters table
CREATE TABLE IF NOT EXISTS newsletters (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT,
    intro TEXT,
    publish_date TEXT,
    status TEXT NOT NULL DEFAULT 'draft',
    cover_image TEXT,
    cover_article INTEGER REFERENCES newsletter_articles(id) ON DELETE SET NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- newsletter_articles table (assignment of catalog articles to a newsletter)
CREATE TABLE IF NOT EXISTS newsletter_articles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    newsletter_id INTEGER NOT NULL REFERENCES newsletters(id) ON DELETE CASCADE,
    article_id INTEGER REFERENCES articles(id) ON DELETE SET NULL,
    title TEXT,
    description TEXT,
    url TEXT,
    publisher TEXT,
    published_at TEXT,
    ai_title TEXT,
    ai_description TEXT,
    newsletter_category TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE(newsletter_id, article_id)
);

CREATE INDEX IF NOT EXISTS idx_newsletter_articles_newsletter_id ON newsletter_articles(newsletter_id);

-- newsletter_images table (generated cover candidates, append-only)
CREATE TABLE IF NOT EXISTS newsletter_images (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    newsletter_id INTEGER NOT NULL REFERENCES newsletters(id) ON DELETE CASCADE,
    blob_url TEXT NOT NULL,
    prompt TEXT,
    provider TEXT,
    model TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_newsletter_images_newsletter_id ON newsletter_images(newsletter_id);
"#;
