use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, InputMode, Pane, View};
use crate::curation::{normalize, Category};
use crate::models::NewsletterStatus;

pub fn draw(frame: &mut Frame, app: &App) {
    match app.view {
        View::Newsletters => draw_newsletters(frame, app),
        View::Curate => draw_curate(frame, app),
    }

    if app.input_mode != InputMode::None {
        render_input(frame, app);
    }

    if app.show_help {
        render_help(frame);
    }
}

fn draw_newsletters(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(0),    // Newsletter list
            Constraint::Length(1), // Status line
        ])
        .split(frame.area());

    let drafts = app
        .newsletters
        .iter()
        .filter(|n| n.status == NewsletterStatus::Draft)
        .count();
    let stats = format!(" {} Newsletters | {} Drafts", app.newsletters.len(), drafts);
    render_header(frame, " Newsdesk ", &stats, chunks[0]);

    let items: Vec<ListItem> = app
        .newsletters
        .iter()
        .map(|newsletter| {
            let date = newsletter
                .publish_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "no date   ".to_string());

            ListItem::new(Line::from(vec![
                Span::styled(format!("{date}  "), Style::default().fg(Color::Blue)),
                Span::styled(
                    format!("[{}] ", newsletter.status.as_str()),
                    Style::default().fg(status_color(newsletter.status)),
                ),
                Span::styled(newsletter.display_title(), Style::default().fg(Color::White)),
            ]))
        })
        .collect();

    render_list(frame, items, Some(app.newsletter_index), true, chunks[1], "");

    render_status(
        frame,
        app,
        "Enter:open  n:new  t:title  p:date  S:status  ?:help  q:quit",
        chunks[2],
    );
}

fn draw_curate(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Newsletter + category counts
            Constraint::Min(0),    // Inbox | Curated
            Constraint::Length(5), // Selected article detail
            Constraint::Length(1), // Status line
        ])
        .split(frame.area());

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 2), Constraint::Ratio(1, 2)])
        .split(chunks[1]);

    render_curate_header(frame, app, chunks[0]);
    render_inbox(frame, app, panes[0]);
    render_curated(frame, app, panes[1]);
    render_detail(frame, app, chunks[2]);
    render_status(
        frame,
        app,
        "Tab:pane  a:add  x:remove  c:category  g:snippet  v:cover  i:image  y:copy  ?:help",
        chunks[3],
    );
}

fn render_header(frame: &mut Frame, title: &str, stats: &str, area: Rect) {
    let block = Block::default()
        .title(title.to_string())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let paragraph = Paragraph::new(stats.to_string()).style(Style::default().fg(Color::White));
    frame.render_widget(paragraph, inner);
}

fn render_curate_header(frame: &mut Frame, app: &App, area: Rect) {
    let Some(newsletter) = app.current.as_ref() else {
        return;
    };

    let title = format!(
        " {} [{}] ",
        newsletter.display_title(),
        newsletter.status.as_str()
    );

    let counts: Vec<Span> = app
        .category_summary
        .iter()
        .flat_map(|c| {
            [
                Span::styled(format!(" {} ", c.category.label()), Style::default().fg(Color::Gray)),
                Span::styled(
                    c.count.to_string(),
                    Style::default()
                        .fg(category_color(c.category))
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw(" |"),
            ]
        })
        .collect();

    let cover = match newsletter.cover_image.as_deref() {
        Some(url) => format!(" Cover image: {url}"),
        None => " Cover image: none".to_string(),
    };
    let generating = match app.generating_cover {
        Some(_) => format!("  {} generating with {}", app.spinner(), app.image_model().label),
        None => format!("  model: {}", app.image_model().label),
    };

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let text = vec![
        Line::from(counts),
        Line::from(vec![
            Span::styled(cover, Style::default().fg(Color::DarkGray)),
            Span::styled(generating, Style::default().fg(Color::Yellow)),
        ]),
    ];
    frame.render_widget(Paragraph::new(text), inner);
}

fn render_inbox(frame: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .sets
        .inbox
        .iter()
        .map(|article| {
            let publisher = article.publisher.as_deref().unwrap_or("Unknown");
            ListItem::new(Line::from(vec![
                Span::styled(format!("[{publisher}] "), Style::default().fg(Color::Blue)),
                Span::styled(article.display_title(), Style::default().fg(Color::White)),
            ]))
        })
        .collect();

    let query = &app.inbox_query;
    let mut title = format!(
        " Inbox ({}) [{} | {}] ",
        app.sets.inbox.len(),
        query.category.label(),
        query.sort.label()
    );
    if !query.search.trim().is_empty() {
        title.push_str(&format!("/{}/ ", query.search.trim()));
    }

    let focused = app.focus == Pane::Inbox;
    render_list(frame, items, Some(app.inbox_index), focused, area, &title);
}

fn render_curated(frame: &mut Frame, app: &App, area: Rect) {
    let cover_article = app.current.as_ref().and_then(|n| n.cover_article);

    let items: Vec<ListItem> = app
        .sets
        .curated
        .iter()
        .map(|article| {
            let key = normalize(article.newsletter_category.as_deref());
            let color = Category::from_key(&key)
                .map(category_color)
                .unwrap_or(Color::Red);
            let marker = if cover_article == Some(article.id) { "★ " } else { "  " };

            ListItem::new(Line::from(vec![
                Span::styled(marker, Style::default().fg(Color::Yellow)),
                Span::styled(format!("[{key}] "), Style::default().fg(color)),
                Span::styled(article.display_title(), Style::default().fg(Color::White)),
            ]))
        })
        .collect();

    let title = format!(" Curated ({}) ", app.sets.curated.len());
    let focused = app.focus == Pane::Curated;
    render_list(frame, items, Some(app.curated_index), focused, area, &title);
}

fn render_detail(frame: &mut Frame, app: &App, area: Rect) {
    let (heading, body) = match app.focus {
        Pane::Inbox => match app.selected_inbox_article() {
            Some(a) => (
                a.display_title().to_string(),
                a.description.clone().unwrap_or_default(),
            ),
            None => ("No article selected".to_string(), String::new()),
        },
        Pane::Curated => match app.selected_curated_article() {
            Some(a) => {
                let headline = a.ai_title.clone().unwrap_or_else(|| a.display_title().to_string());
                let body = a
                    .ai_description
                    .clone()
                    .or_else(|| a.description.clone())
                    .unwrap_or_default();
                (headline, body)
            }
            None => ("No article selected".to_string(), String::new()),
        },
    };

    let block = Block::default()
        .title(format!(" {heading} "))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));

    let paragraph = Paragraph::new(body).block(block).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn render_list(
    frame: &mut Frame,
    items: Vec<ListItem>,
    selected: Option<usize>,
    focused: bool,
    area: Rect,
    title: &str,
) {
    let border = if focused { Color::Cyan } else { Color::DarkGray };
    let list = List::new(items)
        .block(
            Block::default()
                .title(title.to_string())
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border)),
        )
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    if focused {
        state.select(selected);
    }

    frame.render_stateful_widget(list, area, &mut state);
}

fn render_status(frame: &mut Frame, app: &App, hints: &str, area: Rect) {
    let (text, color) = match app.status.as_deref() {
        Some(message) => (message.to_string(), Color::Yellow),
        None => (hints.to_string(), Color::DarkGray),
    };

    let paragraph = Paragraph::new(text).style(Style::default().fg(color));
    frame.render_widget(paragraph, area);
}

fn render_input(frame: &mut Frame, app: &App) {
    let area = centered_rect(60, 20, frame.area());

    let block = Block::default()
        .title(app.input_mode.title())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let inner = block.inner(area);

    frame.render_widget(Clear, area);
    frame.render_widget(block, area);

    let input_text = format!("> {}_", app.input);
    let paragraph = Paragraph::new(input_text).style(Style::default().fg(Color::White));
    frame.render_widget(paragraph, inner);
}

fn render_help(frame: &mut Frame) {
    let area = centered_rect(60, 80, frame.area());

    let help_text = vec![
        "",
        " Navigation:",
        "   j / ↓       Move down",
        "   k / ↑       Move up",
        "   < / >       Jump to top / bottom",
        "   Enter       Open newsletter / add article / open link",
        "   Tab / h / l Switch inbox and curated panes",
        "   Esc         Back to newsletters",
        "",
        " Newsletter:",
        "   n           New newsletter",
        "   t / T       Edit title / intro",
        "   p           Set publish date",
        "   S           Cycle status",
        "   i           Generate cover image",
        "   I           Cycle generated cover images",
        "   m           Cycle image model",
        "   y           Copy export to clipboard",
        "",
        " Curation:",
        "   a           Add inbox article",
        "   x           Remove curated article",
        "   c           Set category",
        "   e           Edit headline",
        "   g           Generate snippet",
        "   v           Toggle cover article",
        "   /           Search inbox",
        "   f           Cycle category filter",
        "   s           Cycle sort order",
        "   o           Open in browser",
        "",
        " General:",
        "   r           Reload",
        "   ?           Toggle this help",
        "   q           Quit",
        "",
        " Press any key to close",
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let paragraph = Paragraph::new(help_text.join("\n"))
        .block(block)
        .style(Style::default().fg(Color::White));

    frame.render_widget(Clear, area);
    frame.render_widget(paragraph, area);
}

fn status_color(status: NewsletterStatus) -> Color {
    match status {
        NewsletterStatus::Draft => Color::Yellow,
        NewsletterStatus::Scheduled => Color::Cyan,
        NewsletterStatus::Sent => Color::Green,
        NewsletterStatus::Archived => Color::DarkGray,
    }
}

fn category_color(category: Category) -> Color {
    match category {
        Category::Feature => Color::Magenta,
        Category::Brief => Color::Cyan,
        Category::Economy => Color::Green,
        Category::Research => Color::Blue,
        Category::Uncategorized => Color::DarkGray,
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
