use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use crossterm::event::KeyEventKind;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use tracing::info;

mod ai;
mod api;
mod app;
mod config;
mod curation;
mod db;
mod error;
mod export;
mod models;
mod newsletter;
mod services;
mod tui;

use app::App;
use config::Config;
use db::Repository;
use error::{AppError, Result};
use models::NewArticle;
use tui::{draw, handle_key_event};

enum Command {
    Tui,
    Serve,
    Import(PathBuf),
    DeleteArticle(i64),
    Export(i64),
}

fn parse_args(args: &[String]) -> Result<Command> {
    match args.get(1).map(String::as_str) {
        None => Ok(Command::Tui),
        Some("--serve") => Ok(Command::Serve),
        Some("--import") => args
            .get(2)
            .map(|p| Command::Import(PathBuf::from(p)))
            .ok_or_else(|| AppError::validation("Usage: newsdesk --import <articles.json>")),
        Some("--delete-article") => args
            .get(2)
            .and_then(|id| id.parse().ok())
            .map(Command::DeleteArticle)
            .ok_or_else(|| AppError::validation("Usage: newsdesk --delete-article <article-id>")),
        Some("--export") => args
            .get(2)
            .and_then(|id| id.parse().ok())
            .map(Command::Export)
            .ok_or_else(|| AppError::validation("Usage: newsdesk --export <newsletter-id>")),
        Some(other) => Err(AppError::validation(format!("Unknown argument: {other}"))),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (only show warnings and errors by default)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let command = parse_args(&args)?;

    let config = Config::load()?;

    match command {
        Command::Serve => api::serve(&config).await,
        Command::Import(path) => import_articles(&config, &path).await,
        Command::DeleteArticle(id) => delete_article(&config, id).await,
        Command::Export(id) => export_newsletter(&config, id).await,
        Command::Tui => run_tui(&config).await,
    }
}

/// Seed the article pool from a JSON array of articles.
async fn import_articles(config: &Config, path: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read {}", path.display()))?;
    let articles: Vec<NewArticle> = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a JSON array of articles", path.display()))?;

    let repository = Repository::new(&config.db_path).await?;
    let count = articles.len();
    for article in articles {
        repository.insert_article(article).await?;
    }

    info!(count, "Articles imported");
    println!("Imported {} articles from {:?}", count, path);
    Ok(())
}

/// Drop an article from the pool. Curated copies stay in their newsletters.
async fn delete_article(config: &Config, article_id: i64) -> Result<()> {
    let repository = Repository::new(&config.db_path).await?;
    match repository.delete_article(article_id).await? {
        0 => println!("No article with id {article_id}"),
        _ => {
            info!(article_id, "Article deleted");
            println!("Deleted article {article_id}");
        }
    }
    Ok(())
}

async fn export_newsletter(config: &Config, newsletter_id: i64) -> Result<()> {
    let repository = Repository::new(&config.db_path).await?;
    let payload = export::build_payload(export::load_export_input(&repository, newsletter_id).await?);

    println!("{}", payload.html);
    println!();
    println!("{}", payload.text);

    if !payload.omitted.is_empty() {
        eprintln!(
            "Left out {} article(s) with categories outside the newsletter sections: {:?}",
            payload.omitted.len(),
            payload.omitted
        );
    }
    Ok(())
}

async fn run_tui(config: &Config) -> Result<()> {
    let mut app = App::new(config).await?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    Ok(())
}

async fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|frame| draw(frame, app))?;

        // Advance spinner animation
        app.tick_spinner();

        // Poll for a finished cover image
        app.poll_cover_result().await?;

        // Poll for events with timeout to allow async operations
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Some(action) =
                        handle_key_event(key, app.view, app.input_mode, app.show_help)
                    {
                        let should_quit = app.handle_action(action).await?;
                        if should_quit {
                            return Ok(());
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        std::iter::once("newsdesk")
            .chain(values.iter().copied())
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_parse_args() {
        assert!(matches!(parse_args(&args(&[])), Ok(Command::Tui)));
        assert!(matches!(parse_args(&args(&["--serve"])), Ok(Command::Serve)));
        assert!(matches!(parse_args(&args(&["--export", "7"])), Ok(Command::Export(7))));
        assert!(matches!(
            parse_args(&args(&["--import", "seed.json"])),
            Ok(Command::Import(p)) if p == PathBuf::from("seed.json")
        ));
        assert!(parse_args(&args(&["--export", "seven"])).is_err());
        assert!(parse_args(&args(&["--import"])).is_err());
        assert!(matches!(
            parse_args(&args(&["--delete-article", "3"])),
            Ok(Command::DeleteArticle(3))
        ));
        assert!(parse_args(&args(&["--refresh"])).is_err());
    }
}
