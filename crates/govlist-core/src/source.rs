use crate::{models::Item, Result};

/// Where the full dataset comes from
///
/// The engine only ever asks for everything at once; the upstream is the
/// production implementation, tests swap in a mock.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ListingSource: Send + Sync {
    async fn fetch_all(&self) -> Result<Vec<Item>>;
}
