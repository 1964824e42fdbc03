// Client for the upstream listing API
pub mod client;
pub mod record;

pub use client::{parse_envelope, ApiError, ListingPage, UpstreamClient, DEFAULT_PAGE_SIZE};
pub use record::ListingRecord;
