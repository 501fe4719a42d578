use super::{escape_html, safe_url, ExportArticle, Layout};
use crate::curation::Category;

const CELL_STYLE: &str = "padding:10px;border:1px solid #d1d5db;";
const HEADER_CELL_STYLE: &str =
    "padding:10px;border:1px solid #d1d5db;background:#f3f4f6;font-weight:bold;";
const TABLE_STYLE: &str =
    "border-collapse:collapse;width:100%;margin-top:12px;border:1px solid #d1d5db;";

const MARKET_COLUMNS: [&str; 3] = ["Sector", "Leader", "Laggard"];

const MARKET_PLACEHOLDER_ROWS: [[&str; 3]; 4] = [
    ["⚡ Sector Placeholder", "🟢 Leader ticker +X.X%", "Laggard ticker +X.X%"],
    ["⚙️ Sector Placeholder", "🟢 Leader ticker +X.X%", "Laggard ticker +X.X%"],
    ["📡 Sector Placeholder", "🔴 Leader ticker -X.X%", "Laggard ticker +X.X%"],
    ["🛡️ Sector Placeholder", "⚪ Leader ticker +X.X%", "Laggard ticker +X.X%"],
];

pub(super) fn render(layout: &Layout) -> String {
    let mut out = String::new();

    if let Some(src) = &layout.cover_image {
        out.push_str(&format!(
            r#"<p><img src="{}" alt="{}" style="max-width:100%;height:auto;" /></p>"#,
            escape_html(src),
            escape_html(&layout.image_alt),
        ));
    }

    if let Some(cover) = &layout.cover {
        push_entry(&mut out, cover);
    }

    for (category, articles) in &layout.sections {
        match category {
            Category::Feature => {}
            Category::Economy => {
                push_heading(&mut out, *category);
                out.push_str(&market_table());
            }
            _ if articles.is_empty() => continue,
            _ => push_heading(&mut out, *category),
        }
        for article in articles {
            push_entry(&mut out, article);
        }
    }

    out
}

fn push_heading(out: &mut String, category: Category) {
    if let Some(heading) = category.export_heading() {
        out.push_str(&format!("<h2>{}</h2>", escape_html(heading)));
    }
}

fn push_entry(out: &mut String, article: &ExportArticle) {
    out.push_str(&format!(
        r#"<p><a href="{}">{}</a></p>"#,
        escape_html(&safe_url(article.url.as_deref())),
        escape_html(article.display_title()),
    ));
    if let Some(description) = article.display_description() {
        out.push_str(&format!("<p>{}</p>", escape_html(description)));
    }
}

/// Placeholder market table the editor fills in by hand after pasting.
fn market_table() -> String {
    let header: String = MARKET_COLUMNS
        .iter()
        .map(|column| format!(r#"<td style="{HEADER_CELL_STYLE}">{}</td>"#, escape_html(column)))
        .collect();

    let rows: String = MARKET_PLACEHOLDER_ROWS
        .iter()
        .map(|row| {
            let cells: String = row
                .iter()
                .map(|cell| format!(r#"<td style="{CELL_STYLE}">{}</td>"#, escape_html(cell)))
                .collect();
            format!("<tr>{cells}</tr>")
        })
        .collect();

    format!(
        r#"<table role="presentation" cellpadding="0" cellspacing="0" width="100%" style="{TABLE_STYLE}"><thead><tr>{header}</tr></thead><tbody>{rows}</tbody></table>"#
    )
}
