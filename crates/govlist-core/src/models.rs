use serde::{Deserialize, Serialize};

/// One listing record, passed through to clients exactly as the upstream sent it
pub use govlist_api::ListingRecord as Item;

/// One page of filtered results
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub data: Vec<Item>,
    /// Matches after filtering, before pagination
    pub total_items: usize,
}

/// Raw query-string parameters, exactly as the client sent them
///
/// Everything is a string here; `ListingQuery::from_params` does the parsing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingParams {
    pub page: Option<String>,
    pub per_page: Option<String>,
    pub search_term: Option<String>,
    pub region: Option<String>,
    pub category: Option<String>,
    pub favorites: Option<String>,
}
