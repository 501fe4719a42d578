mod beehiiv;
mod blob;

pub use beehiiv::{is_valid_email, BeehiivClient, SubscribeOutcome};
pub use blob::{BlobObject, BlobStore};
