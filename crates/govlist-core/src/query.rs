use std::collections::HashSet;

use crate::{models::ListingParams, Error, Result};

pub const DEFAULT_PAGE: usize = 1;
pub const DEFAULT_PER_PAGE: usize = 12;

/// Region value that means "don't filter by region"
pub const ALL_REGIONS: &str = "all";

/// A validated listing query
///
/// `None` on any filter means "don't filter on this".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingQuery {
    pub page: usize,
    pub per_page: usize,
    pub search_term: Option<String>,
    pub region: Option<String>,
    pub categories: Option<Vec<String>>,
    pub favorites: Option<HashSet<i64>>,
}

impl Default for ListingQuery {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            per_page: DEFAULT_PER_PAGE,
            search_term: None,
            region: None,
            categories: None,
            favorites: None,
        }
    }
}

impl ListingQuery {
    /// Parse raw query-string params
    ///
    /// Blank values are treated as absent. Numbers that don't parse, and
    /// pages or page sizes of zero, are rejected rather than quietly coerced.
    pub fn from_params(params: &ListingParams) -> Result<Self> {
        let page = parse_positive("page", params.page.as_deref())?.unwrap_or(DEFAULT_PAGE);
        let per_page =
            parse_positive("perPage", params.per_page.as_deref())?.unwrap_or(DEFAULT_PER_PAGE);

        let region = non_empty(params.region.as_deref())
            .filter(|region| *region != ALL_REGIONS)
            .map(str::to_string);

        let categories = non_empty(params.category.as_deref())
            .map(|raw| split_list(raw).map(str::to_string).collect::<Vec<_>>())
            .filter(|codes| !codes.is_empty());

        let favorites = match non_empty(params.favorites.as_deref()) {
            Some(raw) => Some(parse_ids(raw)?),
            None => None,
        };

        Ok(Self {
            page,
            per_page,
            search_term: non_empty(params.search_term.as_deref()).map(str::to_string),
            region,
            categories,
            favorites,
        })
    }

    /// Index of the first item on the requested page
    pub fn offset(&self) -> usize {
        (self.page - 1).saturating_mul(self.per_page)
    }
}

/// Blank values count as absent; anything else is kept verbatim
fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.filter(|value| !value.trim().is_empty())
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|part| !part.is_empty())
}

fn parse_positive(name: &str, raw: Option<&str>) -> Result<Option<usize>> {
    let Some(raw) = non_empty(raw) else {
        return Ok(None);
    };

    match raw.trim().parse::<usize>() {
        Ok(0) => Err(Error::InvalidQuery(format!("`{}` must be at least 1", name))),
        Ok(value) => Ok(Some(value)),
        Err(_) => Err(Error::InvalidQuery(format!(
            "`{}` must be a positive integer, got {:?}",
            name, raw
        ))),
    }
}

fn parse_ids(raw: &str) -> Result<HashSet<i64>> {
    split_list(raw)
        .map(|part| {
            part.parse::<i64>().map_err(|_| {
                Error::InvalidQuery(format!("`favorites` entry {:?} is not a numeric id", part))
            })
        })
        .collect()
}
