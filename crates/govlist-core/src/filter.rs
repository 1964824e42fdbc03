// Filtering and pagination over a cached dataset
use crate::{
    models::{Item, Listing},
    query::ListingQuery,
};

/// Apply every filter in `query`, then cut out the requested page
///
/// Filters run in a fixed order (favorites, search term, region, category),
/// each one narrowing what the previous left.
pub fn build_listing(items: &[Item], query: &ListingQuery) -> Listing {
    let matched = filter_items(items, query);
    let total_items = matched.len();

    let data = matched
        .into_iter()
        .skip(query.offset())
        .take(query.per_page)
        .cloned()
        .collect();

    Listing { data, total_items }
}

pub fn filter_items<'a>(items: &'a [Item], query: &ListingQuery) -> Vec<&'a Item> {
    let search = query.search_term.as_deref().map(str::to_lowercase);

    items
        .iter()
        .filter(|item| {
            query
                .favorites
                .as_ref()
                .map_or(true, |ids| ids.contains(&item.id()))
        })
        .filter(|item| search.as_deref().map_or(true, |term| matches_search(item, term)))
        .filter(|item| {
            query
                .region
                .as_deref()
                .map_or(true, |region| item.region_code() == Some(region))
        })
        .filter(|item| {
            query.categories.as_deref().map_or(true, |codes| {
                item.category_code()
                    .is_some_and(|code| codes.iter().any(|c| c == code))
            })
        })
        .collect()
}

/// Case-insensitive substring match on the name or the organization name.
/// `term` must already be lowercase.
fn matches_search(item: &Item, term: &str) -> bool {
    item.name().to_lowercase().contains(term)
        || item
            .organization_name()
            .is_some_and(|org| org.to_lowercase().contains(term))
}
