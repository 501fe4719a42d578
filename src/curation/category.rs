use std::collections::BTreeMap;

use crate::models::NewsletterArticle;

pub const UNCATEGORIZED: &str = "uncategorized";

/// The fixed newsletter section vocabulary. Other keys may be stored but
/// never get a section of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Feature,
    Brief,
    Economy,
    Research,
    Uncategorized,
}

impl Category {
    /// Order used by count summaries and the curate view.
    pub const SUMMARY_ORDER: [Category; 5] = [
        Category::Feature,
        Category::Brief,
        Category::Economy,
        Category::Research,
        Category::Uncategorized,
    ];

    /// Order sections are rendered in the exported newsletter.
    pub const EXPORT_ORDER: [Category; 5] = [
        Category::Feature,
        Category::Economy,
        Category::Brief,
        Category::Research,
        Category::Uncategorized,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Category::Feature => "feature",
            Category::Brief => "brief",
            Category::Economy => "economy",
            Category::Research => "research",
            Category::Uncategorized => UNCATEGORIZED,
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::SUMMARY_ORDER.into_iter().find(|c| c.key() == key)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Feature => "Feature",
            Category::Brief => "Brief",
            Category::Economy => "Economy",
            Category::Research => "Research",
            Category::Uncategorized => "Uncategorized",
        }
    }

    /// Section heading in the export. The feature section has none.
    pub fn export_heading(&self) -> Option<&'static str> {
        match self {
            Category::Feature => None,
            Category::Economy => Some("The AI Economy"),
            other => Some(other.label()),
        }
    }
}

/// Anything carrying a free-text newsletter category.
pub trait Categorized {
    fn raw_category(&self) -> Option<&str>;
}

impl Categorized for NewsletterArticle {
    fn raw_category(&self) -> Option<&str> {
        self.newsletter_category.as_deref()
    }
}

/// Lower-case and trim; blank or missing collapses to `uncategorized`.
pub fn normalize(raw: Option<&str>) -> String {
    match raw.map(|s| s.trim().to_lowercase()) {
        Some(key) if !key.is_empty() => key,
        _ => UNCATEGORIZED.to_string(),
    }
}

pub fn counts_by_category<T: Categorized>(items: &[T]) -> BTreeMap<String, usize> {
    items.iter().fold(BTreeMap::new(), |mut counts, item| {
        *counts.entry(normalize(item.raw_category())).or_insert(0) += 1;
        counts
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryCount {
    pub category: Category,
    pub count: usize,
}

/// One entry per vocabulary category in summary order, zero counts included.
pub fn summary(counts: &BTreeMap<String, usize>) -> Vec<CategoryCount> {
    Category::SUMMARY_ORDER
        .into_iter()
        .map(|category| CategoryCount {
            category,
            count: counts.get(category.key()).copied().unwrap_or(0),
        })
        .collect()
}

/// Groups items by normalized category, preserving input order within a group.
pub fn group_by_category<T: Categorized>(items: Vec<T>) -> BTreeMap<String, Vec<T>> {
    let mut grouped: BTreeMap<String, Vec<T>> = BTreeMap::new();
    for item in items {
        grouped
            .entry(normalize(item.raw_category()))
            .or_default()
            .push(item);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Item(&'static str, Option<&'static str>);

    impl Categorized for Item {
        fn raw_category(&self) -> Option<&str> {
            self.1
        }
    }

    #[test]
    fn test_normalize_collapses_blank_and_missing() {
        assert_eq!(normalize(None), "uncategorized");
        assert_eq!(normalize(Some("")), "uncategorized");
        assert_eq!(normalize(Some("   ")), "uncategorized");
        assert_eq!(normalize(Some("  Feature ")), "feature");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for raw in ["Feature", " ECONOMY ", "", "Deep Dive", "research"] {
            let once = normalize(Some(raw));
            assert_eq!(normalize(Some(&once)), once);
        }
    }

    #[test]
    fn test_grouping_and_summary_scenario() {
        let items = vec![
            Item("A", Some("Feature")),
            Item("B", None),
            Item("C", Some("economy")),
        ];

        let counts = counts_by_category(&items);
        let summary = summary(&counts);
        let pairs: Vec<(&str, usize)> = summary.iter().map(|c| (c.category.key(), c.count)).collect();
        assert_eq!(
            pairs,
            vec![
                ("feature", 1),
                ("brief", 0),
                ("economy", 1),
                ("research", 0),
                ("uncategorized", 1),
            ]
        );

        let grouped = group_by_category(items);
        let names = |key: &str| -> Vec<&str> { grouped[key].iter().map(|i| i.0).collect() };
        assert_eq!(grouped.len(), 3);
        assert_eq!(names("feature"), vec!["A"]);
        assert_eq!(names("economy"), vec!["C"]);
        assert_eq!(names("uncategorized"), vec!["B"]);
    }

    #[test]
    fn test_summary_always_has_five_entries() {
        let empty = summary(&BTreeMap::new());
        assert_eq!(empty.len(), 5);
        assert!(empty.iter().all(|c| c.count == 0));

        let items = vec![Item("X", Some("opinion")), Item("Y", Some("Brief"))];
        let counts = counts_by_category(&items);
        assert_eq!(counts.get("opinion"), Some(&1));

        let summary = summary(&counts);
        assert_eq!(summary.len(), 5);
        assert_eq!(summary.iter().map(|c| c.count).sum::<usize>(), 1);
    }

    #[test]
    fn test_export_headings() {
        assert_eq!(Category::Feature.export_heading(), None);
        assert_eq!(Category::Economy.export_heading(), Some("The AI Economy"));
        assert_eq!(Category::Research.export_heading(), Some("Research"));
        assert_eq!(Category::from_key("brief"), Some(Category::Brief));
        assert_eq!(Category::from_key("opinion"), None);
    }
}
