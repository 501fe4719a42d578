mod article;
mod assignment;
mod image;
mod newsletter;

pub use article::{Article, NewArticle};
pub use assignment::{AssignmentPatch, NewAssignment, NewsletterArticle};
pub use image::{NewImage, NewsletterImage};
pub use newsletter::{NewNewsletter, Newsletter, NewsletterStatus};
