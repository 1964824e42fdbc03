// In-memory dataset cache
// One snapshot per process, refreshed wholesale once it ages out

pub mod cache;

pub use cache::{DatasetCache, DEFAULT_TTL_SECS};
