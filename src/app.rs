use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::ai::{ImageGenerator, ImageModel, IMAGE_MODELS};
use crate::config::Config;
use crate::curation::{
    self, counts_by_category, load_sets, AddOutcome, CategoryCount, CurationSets, InboxQuery,
};
use crate::db::Repository;
use crate::error::Result;
use crate::export::{build_payload, copy_payload, load_export_input, Clipboard, SystemClipboard};
use crate::models::{Article, AssignmentPatch, Newsletter, NewsletterArticle};
use crate::newsletter::{self, CoverImagePipeline};
use crate::services::BlobStore;
use crate::tui::AppAction;

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Newsletters,
    Curate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    Inbox,
    Curated,
}

/// Which single-line prompt, if any, is capturing keystrokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    None,
    Search,
    NewNewsletter,
    Category,
    CoverPrompt,
    PublishDate,
    Title,
    Intro,
    Headline,
}

impl InputMode {
    pub fn title(&self) -> &'static str {
        match self {
            InputMode::None => "",
            InputMode::Search => " Search inbox (title, description, publisher) ",
            InputMode::NewNewsletter => " New newsletter title ",
            InputMode::Category => " Category (feature, brief, economy, research) ",
            InputMode::CoverPrompt => " Cover image prompt ",
            InputMode::PublishDate => " Publish date (YYYY-MM-DD, blank to clear) ",
            InputMode::Title => " Newsletter title ",
            InputMode::Intro => " Newsletter intro (blank to clear) ",
            InputMode::Headline => " Headline override (blank to clear) ",
        }
    }
}

// Message for a finished cover image generation
pub struct CoverResult {
    pub newsletter_id: i64,
    pub result: std::result::Result<String, String>, // blob url or user-facing error
}

pub struct App {
    // Data
    pub newsletters: Vec<Newsletter>,
    pub current: Option<Newsletter>,
    pub sets: CurationSets,
    pub category_summary: Vec<CategoryCount>,

    // UI State
    pub view: View,
    pub focus: Pane,
    pub newsletter_index: usize,
    pub inbox_index: usize,
    pub curated_index: usize,
    pub inbox_query: InboxQuery,
    pub show_help: bool,
    pub input_mode: InputMode,
    pub input: String,
    pub image_model_index: usize,
    /// The one message describing the outcome of the last action.
    pub status: Option<String>,

    // Async state
    pub generating_cover: Option<i64>,
    spinner_frame: usize,
    cover_rx: mpsc::Receiver<CoverResult>,
    cover_tx: mpsc::Sender<CoverResult>,

    // Services
    pub repository: Repository,
    pipeline: Arc<CoverImagePipeline>,
    clipboard: Option<SystemClipboard>,
}

impl App {
    pub async fn new(config: &Config) -> Result<Self> {
        let repository = Repository::new(&config.db_path).await?;

        let pipeline = Arc::new(CoverImagePipeline::new(
            repository.clone(),
            ImageGenerator::new(config)?,
            BlobStore::from_config(&config.blob)?,
            &config.default_image_model,
        )?);
        let image_model_index = IMAGE_MODELS
            .iter()
            .position(|m| m.key == pipeline.default_model().key)
            .unwrap_or(0);

        let clipboard = match SystemClipboard::new() {
            Ok(clipboard) => Some(clipboard),
            Err(e) => {
                warn!("Clipboard unavailable: {}", e);
                None
            }
        };

        let newsletters = repository.list_newsletters().await?;

        let (cover_tx, cover_rx) = mpsc::channel(1);

        Ok(Self {
            newsletters,
            current: None,
            sets: CurationSets::default(),
            category_summary: curation::summary(&Default::default()),
            view: View::Newsletters,
            focus: Pane::Inbox,
            newsletter_index: 0,
            inbox_index: 0,
            curated_index: 0,
            inbox_query: InboxQuery::default(),
            show_help: false,
            input_mode: InputMode::None,
            input: String::new(),
            image_model_index,
            status: None,
            generating_cover: None,
            spinner_frame: 0,
            cover_rx,
            cover_tx,
            repository,
            pipeline,
            clipboard,
        })
    }

    pub fn selected_newsletter(&self) -> Option<&Newsletter> {
        match self.view {
            View::Curate => self.current.as_ref(),
            View::Newsletters => self.newsletters.get(self.newsletter_index),
        }
    }

    pub fn selected_inbox_article(&self) -> Option<&Article> {
        self.sets.inbox.get(self.inbox_index)
    }

    pub fn selected_curated_article(&self) -> Option<&NewsletterArticle> {
        self.sets.curated.get(self.curated_index)
    }

    pub fn image_model(&self) -> &'static ImageModel {
        &IMAGE_MODELS[self.image_model_index % IMAGE_MODELS.len()]
    }

    pub fn spinner(&self) -> &'static str {
        SPINNER[self.spinner_frame % SPINNER.len()]
    }

    pub fn tick_spinner(&mut self) {
        if self.generating_cover.is_some() {
            self.spinner_frame = self.spinner_frame.wrapping_add(1);
        }
    }

    /// Run one action. Failures end up in the status line instead of
    /// tearing down the terminal.
    pub async fn handle_action(&mut self, action: AppAction) -> Result<bool> {
        if !matches!(action, AppAction::InputChar(_) | AppAction::InputBackspace) {
            self.status = None;
        }

        match self.dispatch(action).await {
            Ok(quit) => Ok(quit),
            Err(e) => {
                error!("Action failed: {}", e);
                self.status = Some(e.user_message());
                Ok(false)
            }
        }
    }

    async fn dispatch(&mut self, action: AppAction) -> Result<bool> {
        match action {
            AppAction::Quit => return Ok(true),

            AppAction::MoveUp => {
                let index = self.focused_index_mut();
                *index = index.saturating_sub(1);
            }

            AppAction::MoveDown => {
                let len = self.focused_len();
                let index = self.focused_index_mut();
                if *index + 1 < len {
                    *index += 1;
                }
            }

            AppAction::MoveToTop => {
                *self.focused_index_mut() = 0;
            }

            AppAction::MoveToBottom => {
                let len = self.focused_len();
                *self.focused_index_mut() = len.saturating_sub(1);
            }

            AppAction::Select => match self.view {
                View::Newsletters => self.open_selected_newsletter().await?,
                View::Curate => match self.focus {
                    Pane::Inbox => self.add_selected_article().await?,
                    Pane::Curated => self.open_selected_url(),
                },
            },

            AppAction::Back => {
                if self.view == View::Curate {
                    self.view = View::Newsletters;
                    self.current = None;
                    self.reload_newsletters().await?;
                }
            }

            AppAction::SwitchPane => {
                self.focus = match self.focus {
                    Pane::Inbox => Pane::Curated,
                    Pane::Curated => Pane::Inbox,
                };
            }

            AppAction::Reload => match self.view {
                View::Newsletters => self.reload_newsletters().await?,
                View::Curate => self.reload_sets().await?,
            },

            AppAction::AddArticle => {
                if self.view == View::Curate {
                    self.add_selected_article().await?;
                }
            }

            AppAction::RemoveArticle => {
                if let Some(id) = self.curated_target().map(|a| a.id) {
                    match curation::remove_article(&self.repository, id).await? {
                        Some(_) => self.status = Some("Removed from newsletter".to_string()),
                        None => self.status = Some("Already removed".to_string()),
                    }
                    self.reload_sets().await?;
                }
            }

            AppAction::GenerateSnippet => {
                if let Some(id) = self.curated_target().map(|a| a.id) {
                    curation::generate_snippet(&self.repository, id).await?;
                    self.status = Some("Snippet generated".to_string());
                    self.reload_sets().await?;
                }
            }

            AppAction::SetCoverArticle => {
                if let (Some(newsletter_id), Some(assignment_id)) = (
                    self.current.as_ref().map(|n| n.id),
                    self.curated_target().map(|a| a.id),
                ) {
                    let already = self
                        .current
                        .as_ref()
                        .and_then(|n| n.cover_article)
                        == Some(assignment_id);
                    let (target, message) = if already {
                        (None, "Cover article cleared")
                    } else {
                        (Some(assignment_id), "Cover article set")
                    };
                    newsletter::set_cover_article(&self.repository, newsletter_id, target).await?;
                    self.status = Some(message.to_string());
                    self.reload_current().await?;
                }
            }

            AppAction::CycleCategoryFilter => {
                if self.view == View::Curate {
                    self.inbox_query.category = self.inbox_query.category.cycle();
                    self.inbox_index = 0;
                    self.reload_sets().await?;
                }
            }

            AppAction::CycleSort => {
                if self.view == View::Curate {
                    self.inbox_query.sort = self.inbox_query.sort.cycle();
                    self.inbox_index = 0;
                    self.reload_sets().await?;
                }
            }

            AppAction::CycleImageModel => {
                self.image_model_index = (self.image_model_index + 1) % IMAGE_MODELS.len();
                self.status = Some(format!("Image model: {}", self.image_model().label));
            }

            AppAction::CycleStatus => {
                if let Some((id, status)) = self.selected_newsletter().map(|n| (n.id, n.status)) {
                    let next = status.cycle();
                    newsletter::set_status(&self.repository, id, next).await?;
                    self.status = Some(format!("Status: {}", next.as_str()));
                    self.reload_newsletters().await?;
                    self.reload_current().await?;
                }
            }

            AppAction::CopyExport => self.copy_export().await?,

            AppAction::OpenInBrowser => self.open_selected_url(),

            AppAction::StartSearch => self.start_input(InputMode::Search),
            AppAction::StartNewNewsletter => self.start_input(InputMode::NewNewsletter),
            AppAction::StartCategory => {
                if self.curated_target().is_some() {
                    self.start_input(InputMode::Category);
                }
            }
            AppAction::StartCoverPrompt => {
                if self.current.is_some() {
                    self.start_input(InputMode::CoverPrompt);
                }
            }
            AppAction::StartPublishDate => {
                if self.selected_newsletter().is_some() {
                    self.start_input(InputMode::PublishDate);
                }
            }

            AppAction::StartTitle => {
                if self.selected_newsletter().is_some() {
                    self.start_input(InputMode::Title);
                }
            }
            AppAction::StartIntro => {
                if self.selected_newsletter().is_some() {
                    self.start_input(InputMode::Intro);
                }
            }
            AppAction::StartHeadline => {
                if self.curated_target().is_some() {
                    self.start_input(InputMode::Headline);
                }
            }

            AppAction::CycleCoverImage => self.cycle_cover_image().await?,

            AppAction::ShowHelp => {
                self.show_help = true;
            }

            AppAction::HideHelp => {
                self.show_help = false;
            }

            AppAction::InputChar(c) => {
                self.input.push(c);
            }

            AppAction::InputBackspace => {
                self.input.pop();
            }

            AppAction::InputConfirm => {
                let mode = self.input_mode;
                let input = std::mem::take(&mut self.input);
                self.input_mode = InputMode::None;
                self.confirm_input(mode, input).await?;
            }

            AppAction::InputCancel => {
                self.input_mode = InputMode::None;
                self.input.clear();
            }
        }

        Ok(false)
    }

    fn focused_len(&self) -> usize {
        match (self.view, self.focus) {
            (View::Newsletters, _) => self.newsletters.len(),
            (View::Curate, Pane::Inbox) => self.sets.inbox.len(),
            (View::Curate, Pane::Curated) => self.sets.curated.len(),
        }
    }

    fn focused_index_mut(&mut self) -> &mut usize {
        match (self.view, self.focus) {
            (View::Newsletters, _) => &mut self.newsletter_index,
            (View::Curate, Pane::Inbox) => &mut self.inbox_index,
            (View::Curate, Pane::Curated) => &mut self.curated_index,
        }
    }

    fn curated_target(&self) -> Option<&NewsletterArticle> {
        if self.view == View::Curate && self.focus == Pane::Curated {
            self.selected_curated_article()
        } else {
            None
        }
    }

    fn start_input(&mut self, mode: InputMode) {
        self.input = match mode {
            InputMode::Search => self.inbox_query.search.clone(),
            InputMode::Category => self
                .selected_curated_article()
                .and_then(|a| a.newsletter_category.clone())
                .unwrap_or_default(),
            InputMode::Title => self
                .selected_newsletter()
                .and_then(|n| n.title.clone())
                .unwrap_or_default(),
            InputMode::Intro => self
                .selected_newsletter()
                .and_then(|n| n.sub_title.clone())
                .unwrap_or_default(),
            InputMode::Headline => self
                .selected_curated_article()
                .and_then(|a| a.ai_title.clone())
                .unwrap_or_default(),
            _ => String::new(),
        };
        self.input_mode = mode;
    }

    async fn confirm_input(&mut self, mode: InputMode, input: String) -> Result<()> {
        match mode {
            InputMode::None => {}

            InputMode::Search => {
                self.inbox_query.search = input;
                self.inbox_index = 0;
                self.reload_sets().await?;
            }

            InputMode::NewNewsletter => {
                let id = newsletter::create_newsletter(&self.repository, &input, None).await?;
                self.reload_newsletters().await?;
                if let Some(index) = self.newsletters.iter().position(|n| n.id == id) {
                    self.newsletter_index = index;
                }
                self.status = Some("Newsletter created".to_string());
            }

            InputMode::Category => {
                if let Some(id) = self.curated_target().map(|a| a.id) {
                    let key = curation::set_category(&self.repository, id, &input).await?;
                    self.status = Some(format!("Category set to {key}"));
                    self.reload_sets().await?;
                }
            }

            InputMode::CoverPrompt => self.start_cover_generation(input),

            InputMode::PublishDate => {
                if let Some(id) = self.selected_newsletter().map(|n| n.id) {
                    newsletter::update_publish_date(&self.repository, id, Some(&input)).await?;
                    self.status = Some("Publish date updated".to_string());
                    self.reload_newsletters().await?;
                    self.reload_current().await?;
                }
            }

            InputMode::Title | InputMode::Intro => {
                if let Some(selected) = self.selected_newsletter().cloned() {
                    let (title, intro) = match mode {
                        InputMode::Title => (input, selected.sub_title),
                        _ => (selected.title.unwrap_or_default(), Some(input)),
                    };
                    newsletter::update_details(
                        &self.repository,
                        selected.id,
                        &title,
                        intro.as_deref(),
                    )
                    .await?;
                    self.status = Some("Newsletter updated".to_string());
                    self.reload_newsletters().await?;
                    self.reload_current().await?;
                }
            }

            InputMode::Headline => {
                if let Some(id) = self.curated_target().map(|a| a.id) {
                    let patch = AssignmentPatch {
                        ai_title: Some(Some(input)),
                        ..AssignmentPatch::default()
                    };
                    curation::update_content(&self.repository, id, patch).await?;
                    self.status = Some("Headline updated".to_string());
                    self.reload_sets().await?;
                }
            }
        }
        Ok(())
    }

    /// Promote the next previously generated image to the cover.
    async fn cycle_cover_image(&mut self) -> Result<()> {
        let Some(current) = self.current.clone() else {
            return Ok(());
        };

        let mut images = self.repository.list_images(current.id).await?;
        if images.is_empty() {
            self.status = Some("No cover images generated yet".to_string());
            return Ok(());
        }
        images.reverse();

        let next_index = images
            .iter()
            .position(|i| Some(i.blob_url.as_str()) == current.cover_image.as_deref())
            .map_or(0, |i| (i + 1) % images.len());
        let next = &images[next_index];

        newsletter::select_cover_image(&self.repository, current.id, &next.blob_url).await?;
        self.status = Some(format!("Cover image {} of {}", next_index + 1, images.len()));
        self.reload_current().await
    }

    async fn open_selected_newsletter(&mut self) -> Result<()> {
        let Some(selected) = self.newsletters.get(self.newsletter_index).cloned() else {
            return Ok(());
        };

        self.current = Some(selected);
        self.view = View::Curate;
        self.focus = Pane::Inbox;
        self.inbox_index = 0;
        self.curated_index = 0;
        self.reload_sets().await
    }

    async fn add_selected_article(&mut self) -> Result<()> {
        let (Some(newsletter_id), Some(article_id)) = (
            self.current.as_ref().map(|n| n.id),
            self.selected_inbox_article().map(|a| a.id),
        ) else {
            return Ok(());
        };

        let outcome = curation::add_article(&self.repository, article_id, newsletter_id).await?;
        self.status = Some(
            match outcome {
                AddOutcome::Added(_) => "Added to newsletter",
                AddOutcome::AlreadyPresent => "Already in this newsletter",
            }
            .to_string(),
        );
        self.reload_sets().await
    }

    fn open_selected_url(&mut self) {
        let url = match (self.view, self.focus) {
            (View::Curate, Pane::Inbox) => self.selected_inbox_article().and_then(|a| a.url.clone()),
            (View::Curate, Pane::Curated) => {
                self.selected_curated_article().and_then(|a| a.url.clone())
            }
            _ => None,
        };

        if let Some(url) = url {
            if let Err(e) = open::that(&url) {
                warn!("Failed to open {}: {}", url, e);
                self.status = Some("Could not open the article in a browser".to_string());
            }
        }
    }

    async fn copy_export(&mut self) -> Result<()> {
        let Some(newsletter_id) = self.current.as_ref().map(|n| n.id) else {
            return Ok(());
        };

        let payload = build_payload(load_export_input(&self.repository, newsletter_id).await?);
        let mode = copy_payload(
            self.clipboard.as_mut().map(|c| c as &mut dyn Clipboard),
            &payload,
        )?;

        let mut message = mode.message().to_string();
        if !payload.omitted.is_empty() {
            message.push_str(&format!(
                " {} article(s) with other categories were left out.",
                payload.omitted.len()
            ));
        }
        self.status = Some(message);
        Ok(())
    }

    fn start_cover_generation(&mut self, prompt: String) {
        let Some(newsletter_id) = self.current.as_ref().map(|n| n.id) else {
            return;
        };
        if self.generating_cover.is_some() {
            self.status = Some("A cover image is already being generated".to_string());
            return;
        }

        let model_key = self.image_model().key;
        let pipeline = Arc::clone(&self.pipeline);
        let tx = self.cover_tx.clone();

        self.generating_cover = Some(newsletter_id);

        tokio::spawn(async move {
            let result = pipeline
                .generate(newsletter_id, &prompt, Some(model_key), true)
                .await
                .map(|object| object.url)
                .map_err(|e| {
                    error!("Cover image generation failed: {}", e);
                    e.user_message()
                });

            let _ = tx.send(CoverResult { newsletter_id, result }).await;
        });
    }

    /// Poll for a finished cover image (non-blocking)
    pub async fn poll_cover_result(&mut self) -> Result<()> {
        if let Ok(result) = self.cover_rx.try_recv() {
            if self.generating_cover == Some(result.newsletter_id) {
                self.generating_cover = None;
            }
            match result.result {
                Ok(url) => {
                    info!(newsletter_id = result.newsletter_id, "Cover image ready: {}", url);
                    self.status = Some("Cover image generated".to_string());
                    self.reload_current().await?;
                }
                Err(message) => {
                    self.status = Some(message);
                }
            }
        }
        Ok(())
    }

    async fn reload_newsletters(&mut self) -> Result<()> {
        self.newsletters = self.repository.list_newsletters().await?;
        if self.newsletter_index >= self.newsletters.len() {
            self.newsletter_index = self.newsletters.len().saturating_sub(1);
        }
        Ok(())
    }

    async fn reload_current(&mut self) -> Result<()> {
        if let Some(id) = self.current.as_ref().map(|n| n.id) {
            self.current = self.repository.get_newsletter(id).await?;
        }
        Ok(())
    }

    async fn reload_sets(&mut self) -> Result<()> {
        let Some(newsletter_id) = self.current.as_ref().map(|n| n.id) else {
            return Ok(());
        };

        self.sets = load_sets(&self.repository, newsletter_id, &self.inbox_query).await?;
        self.category_summary = curation::summary(&counts_by_category(&self.sets.curated));

        if self.inbox_index >= self.sets.inbox.len() {
            self.inbox_index = self.sets.inbox.len().saturating_sub(1);
        }
        if self.curated_index >= self.sets.curated.len() {
            self.curated_index = self.sets.curated.len().saturating_sub(1);
        }

        self.reload_current().await
    }
}
