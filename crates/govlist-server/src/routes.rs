use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use govlist_core::{Listing, ListingParams};
use serde::Serialize;

use crate::{error::AppError, state::AppState};

pub async fn listings_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListingParams>,
) -> Result<Json<Listing>, AppError> {
    let listing = state.engine.get_listing_for(&params).await?;
    Ok(Json(listing))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Health {
    pub status: &'static str,
    /// Seconds since the cached dataset was fetched, if there is one
    pub cache_age_secs: Option<i64>,
    pub cached_items: Option<usize>,
    pub cache_fresh: bool,
}

/// Liveness plus a peek at the cache. Never touches the upstream.
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<Health> {
    let cache = state.engine.cache();
    let now = Utc::now();

    Json(Health {
        status: "ok",
        cache_age_secs: cache
            .fetched_at()
            .map(|fetched| now.signed_duration_since(fetched).num_seconds()),
        cached_items: cache.len(),
        cache_fresh: !cache.is_expired_at(now),
    })
}
