use super::{safe_url, ExportArticle, Layout};
use crate::curation::Category;

pub(super) fn render(layout: &Layout) -> String {
    let mut blocks: Vec<String> = Vec::new();

    if let Some(src) = &layout.cover_image {
        blocks.push(format!("Cover Image: {src}"));
    }

    if let Some(cover) = &layout.cover {
        blocks.push(line(cover));
    }

    for (category, articles) in &layout.sections {
        if articles.is_empty() {
            continue;
        }
        let lines: Vec<String> = articles.iter().map(line).collect();
        match category.export_heading() {
            Some(heading) if *category != Category::Feature => {
                blocks.push(format!("{heading}\n{}", lines.join("\n")));
            }
            _ => blocks.push(lines.join("\n")),
        }
    }

    blocks.join("\n\n")
}

fn line(article: &ExportArticle) -> String {
    format!(
        "- {} ({})",
        article.display_title(),
        safe_url(article.url.as_deref())
    )
}
