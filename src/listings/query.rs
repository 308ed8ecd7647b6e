//! Listing search, filter and sort
//!
//! Pure functions over already-loaded listings. Text filters are literal,
//! case-insensitive "contains" checks; price bounds are inclusive; every
//! provided filter must hold. Sorting is stable so ties keep insertion order.

use crate::error::AppError;
use crate::listings::models::Listing;
use serde::Deserialize;
use std::str::FromStr;

/// Client-requested sort order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Most recently created first
    Newest,
    /// Cheapest first
    PriceAsc,
    /// Most expensive first
    PriceDesc,
}

impl FromStr for SortOrder {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "newest" => Ok(SortOrder::Newest),
            "price-asc" => Ok(SortOrder::PriceAsc),
            "price-desc" => Ok(SortOrder::PriceDesc),
            other => Err(AppError::Validation(format!(
                "Unknown sort '{}'; expected newest, price-asc or price-desc",
                other
            ))),
        }
    }
}

/// Filters combined with AND
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingFilter {
    /// Substring of the title
    pub title: Option<String>,
    /// Substring of the description
    pub description: Option<String>,
    /// Inclusive lower price bound
    pub min_price: Option<f64>,
    /// Inclusive upper price bound
    pub max_price: Option<f64>,
    /// Exact property type, ignoring case
    pub property_type: Option<String>,
}

impl ListingFilter {
    /// True when no filter is set
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Check whether a listing satisfies every provided filter
    pub fn matches(&self, listing: &Listing) -> bool {
        if let Some(title) = &self.title {
            if !contains_ignore_case(&listing.title, title) {
                return false;
            }
        }
        if let Some(description) = &self.description {
            if !contains_ignore_case(&listing.description, description) {
                return false;
            }
        }
        if self.min_price.is_some_and(|min| listing.price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| listing.price > max) {
            return false;
        }
        if let Some(wanted) = &self.property_type {
            match &listing.details.property_type {
                Some(actual) if actual.to_lowercase() == wanted.to_lowercase() => {}
                _ => return false,
            }
        }
        true
    }
}

/// Case-insensitive literal substring check
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Stable sort of listings in place
pub fn sort_listings(listings: &mut [Listing], order: SortOrder) {
    match order {
        SortOrder::Newest => listings.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortOrder::PriceAsc => listings.sort_by(|a, b| a.price.total_cmp(&b.price)),
        SortOrder::PriceDesc => listings.sort_by(|a, b| b.price.total_cmp(&a.price)),
    }
}

/// A parsed filter plus optional sort
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingQuery {
    /// Filters to apply
    pub filter: ListingFilter,
    /// Sort to apply after filtering
    pub sort: Option<SortOrder>,
}

impl ListingQuery {
    /// Filter then sort, keeping insertion order where unspecified
    pub fn apply(&self, listings: Vec<Listing>) -> Vec<Listing> {
        let mut matched: Vec<Listing> = if self.filter.is_empty() {
            listings
        } else {
            listings
                .into_iter()
                .filter(|l| self.filter.matches(l))
                .collect()
        };
        if let Some(order) = self.sort {
            sort_listings(&mut matched, order);
        }
        matched
    }
}

/// Query string of `GET /api/listings`
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    /// Sort key
    pub sort: Option<String>,
    /// Property type, `all` for no restriction
    #[serde(rename = "type")]
    pub property_type: Option<String>,
}

/// Query string of `GET /api/listings/search`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    /// Title substring
    pub title: Option<String>,
    /// Description substring
    pub description: Option<String>,
    /// Inclusive lower price bound
    pub min_price: Option<String>,
    /// Inclusive upper price bound
    pub max_price: Option<String>,
    /// Property type, `all` for no restriction
    #[serde(rename = "type")]
    pub property_type: Option<String>,
    /// Sort key
    pub sort: Option<String>,
}

/// Empty query values count as absent
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_price(name: &str, value: Option<String>) -> Result<Option<f64>, AppError> {
    present(value)
        .map(|v| {
            v.trim()
                .parse::<f64>()
                .ok()
                .filter(|p| !p.is_nan())
                .ok_or_else(|| AppError::Validation(format!("{} must be a number", name)))
        })
        .transpose()
}

fn parse_sort(value: Option<String>) -> Result<Option<SortOrder>, AppError> {
    present(value).map(|s| s.trim().parse()).transpose()
}

fn parse_type(value: Option<String>) -> Option<String> {
    present(value)
        .map(|t| t.trim().to_string())
        .filter(|t| !t.eq_ignore_ascii_case("all"))
}

impl TryFrom<ListParams> for ListingQuery {
    type Error = AppError;

    fn try_from(params: ListParams) -> Result<Self, Self::Error> {
        Ok(Self {
            filter: ListingFilter {
                property_type: parse_type(params.property_type),
                ..Default::default()
            },
            sort: parse_sort(params.sort)?,
        })
    }
}

impl TryFrom<SearchParams> for ListingQuery {
    type Error = AppError;

    fn try_from(params: SearchParams) -> Result<Self, Self::Error> {
        Ok(Self {
            filter: ListingFilter {
                title: present(params.title),
                description: present(params.description),
                min_price: parse_price("minPrice", params.min_price)?,
                max_price: parse_price("maxPrice", params.max_price)?,
                property_type: parse_type(params.property_type),
            },
            sort: parse_sort(params.sort)?,
        })
    }
}
