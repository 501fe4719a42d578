mod repository;
mod schema;

pub use repository::{ArticleQuery, CategoryFilter, InboxSort, Repository};
