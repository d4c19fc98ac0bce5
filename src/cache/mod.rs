//! Response cache for outbound HTTP requests
//!
//! Every page and API response the tool downloads is kept in a single JSON file
//! so repeated lookups, including across runs, are answered without the
//! network. Entries never expire.

mod fetch;
mod store;

pub use fetch::{CachedFetcher, FetchError};
pub use store::{CacheStore, DEFAULT_CACHE_FILE};
