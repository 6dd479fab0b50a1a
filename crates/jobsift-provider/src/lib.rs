pub mod apify;

pub use apify::{ApifyClient, ProviderConfig};
