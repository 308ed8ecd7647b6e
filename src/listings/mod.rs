//! Listings module
//!
//! Listing records, their SQLite store, and the search/sort pipeline.

pub mod db;
pub mod models;
pub mod query;

pub use db::ListingDb;
pub use models::{Listing, ListingFields, ListingForm, ListingId, PropertyDetails};
pub use query::{ListParams, ListingFilter, ListingQuery, SearchParams, SortOrder};
