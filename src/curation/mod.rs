mod category;
mod sets;
mod snippet;

pub use category::{
    counts_by_category, group_by_category, normalize, summary, Categorized, Category,
    CategoryCount, UNCATEGORIZED,
};
pub use sets::{
    add_article, load_sets, remove_article, set_category, update_content, AddOutcome,
    CurationSets,
};
pub use snippet::{draft_snippet, generate_snippet, Snippet};

use crate::db::{ArticleQuery, CategoryFilter, InboxSort};

/// Operator-controlled filters for the inbox pane.
#[derive(Debug, Clone, Default)]
pub struct InboxQuery {
    pub search: String,
    pub category: CategoryFilter,
    pub sort: InboxSort,
}

impl InboxQuery {
    pub(crate) fn to_article_query(&self, exclude_ids: Vec<i64>) -> ArticleQuery {
        let search = self.search.trim();
        ArticleQuery {
            exclude_ids,
            search: (!search.is_empty()).then(|| search.to_string()),
            category: self.category.clone(),
            sort: self.sort,
            limit: None,
        }
    }
}

impl CategoryFilter {
    /// All, then each vocabulary category in summary order.
    pub fn cycle(&self) -> Self {
        match self {
            CategoryFilter::All => CategoryFilter::Named(Category::Feature.key().to_string()),
            CategoryFilter::Named(key) => {
                let position = Category::SUMMARY_ORDER
                    .iter()
                    .position(|c| c.key() == key.as_str());
                match position.and_then(|i| Category::SUMMARY_ORDER.get(i + 1)) {
                    Some(Category::Uncategorized) => CategoryFilter::Uncategorized,
                    Some(next) => CategoryFilter::Named(next.key().to_string()),
                    None => CategoryFilter::Uncategorized,
                }
            }
            CategoryFilter::Uncategorized => CategoryFilter::All,
        }
    }

    pub fn label(&self) -> String {
        match self {
            CategoryFilter::All => "All".to_string(),
            CategoryFilter::Uncategorized => Category::Uncategorized.label().to_string(),
            CategoryFilter::Named(key) => Category::from_key(key)
                .map(|c| c.label().to_string())
                .unwrap_or_else(|| key.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_filter_cycles_through_vocabulary() {
        let mut filter = CategoryFilter::All;
        let mut labels = Vec::new();
        for _ in 0..6 {
            filter = filter.cycle();
            labels.push(filter.label());
        }
        assert_eq!(
            labels,
            vec!["Feature", "Brief", "Economy", "Research", "Uncategorized", "All"]
        );
    }

    #[test]
    fn test_blank_search_is_dropped() {
        let query = InboxQuery {
            search: "   ".to_string(),
            ..InboxQuery::default()
        };
        let article_query = query.to_article_query(vec![1, 2]);
        assert!(article_query.search.is_none());
        assert_eq!(article_query.exclude_ids, vec![1, 2]);
    }
}
