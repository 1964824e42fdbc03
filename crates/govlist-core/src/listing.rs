// Listing engine with caching support
use crate::{
    filter::build_listing,
    models::{Item, Listing, ListingParams},
    query::ListingQuery,
    source::ListingSource,
    Result,
};
use govlist_cache::DatasetCache;
use std::sync::Arc;
use tracing::{debug, info};

/// Serves filtered, paginated listings out of a cached snapshot of the
/// upstream dataset, refetching the whole thing once it ages out
///
/// There's no single-flight guard on the refresh: two requests that both
/// miss will both fetch, and whichever finishes last wins. Both snapshots
/// are complete, so that only costs an extra upstream call.
pub struct CachedListingEngine {
    source: Box<dyn ListingSource>,
    cache: Arc<DatasetCache<Item>>,
}

impl CachedListingEngine {
    pub fn new(source: Box<dyn ListingSource>) -> Self {
        Self::with_cache(source, Arc::new(DatasetCache::default()))
    }

    pub fn with_cache(source: Box<dyn ListingSource>, cache: Arc<DatasetCache<Item>>) -> Self {
        Self { source, cache }
    }

    pub fn cache(&self) -> &DatasetCache<Item> {
        &self.cache
    }

    /// Validate raw params, then serve the listing
    ///
    /// Bad params are rejected before the cache or upstream is touched.
    pub async fn get_listing_for(&self, params: &ListingParams) -> Result<Listing> {
        let query = ListingQuery::from_params(params)?;
        self.get_listing(&query).await
    }

    pub async fn get_listing(&self, query: &ListingQuery) -> Result<Listing> {
        let dataset = self.dataset().await?;
        let listing = build_listing(&dataset, query);

        debug!(
            "Listing page {} ({} per page): {} of {} matched",
            query.page,
            query.per_page,
            listing.total_items,
            dataset.len()
        );

        Ok(listing)
    }

    /// Full dataset, cache-first
    ///
    /// On a failed fetch the error goes straight back to the caller and the
    /// previous entry stays put, expired or not, for the next request to
    /// judge by age again.
    pub async fn dataset(&self) -> Result<Arc<Vec<Item>>> {
        debug!("Checking dataset cache");
        if let Some(dataset) = self.cache.get() {
            info!("Cache hit! Serving {} cached records", dataset.len());
            return Ok(dataset);
        }

        info!("Cache miss - fetching full dataset from upstream");
        let items = self.source.fetch_all().await?;
        let dataset = self.cache.set(items);
        info!("Cached {} records", dataset.len());

        Ok(dataset)
    }
}
