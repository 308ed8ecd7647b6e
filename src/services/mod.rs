//! Service layer for business logic
//!
//! This module contains service abstractions that separate business logic
//! from HTTP handlers, making the code more modular and testable.

pub mod images;
pub mod listings;

pub use images::{ImageStore, UploadedFile};
pub use listings::ListingService;
