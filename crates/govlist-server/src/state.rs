use std::sync::Arc;

use govlist_core::CachedListingEngine;

/// Shared across every request; the engine owns the one dataset cache
pub struct AppState {
    pub engine: CachedListingEngine,
}

impl AppState {
    pub fn new(engine: CachedListingEngine) -> Arc<Self> {
        Arc::new(Self { engine })
    }
}
