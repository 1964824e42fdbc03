// Listing logic: query parsing, filtering, pagination and the cache-first engine
pub mod config;
pub mod error;
pub mod filter;
pub mod listing;
pub mod models;
pub mod providers;
pub mod query;
pub mod source;

pub use config::Config;
pub use error::Error;
pub use listing::CachedListingEngine;
pub use models::{Item, Listing, ListingParams};
pub use query::ListingQuery;
pub use source::ListingSource;

pub type Result<T> = std::result::Result<T, Error>;
