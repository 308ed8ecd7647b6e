//! Listing service
//!
//! CRUD and search over the listing store, composed with image ingestion.
//! Image files are written before the record; if the record write fails the
//! files written by that call are removed again. Deleting a listing also
//! removes the images it referenced.

use crate::error::AppError;
use crate::listings::{Listing, ListingDb, ListingForm, ListingQuery};
use crate::services::images::{ImageStore, UploadedFile};
use tracing::{debug, error, info};

/// Listing service
#[derive(Debug, Clone)]
pub struct ListingService {
    db: ListingDb,
    images: ImageStore,
}

impl ListingService {
    /// Create a service over an open store handle and an image store
    pub fn new(db: ListingDb, images: ImageStore) -> Self {
        Self { db, images }
    }

    /// The image store used for uploads
    pub fn images(&self) -> &ImageStore {
        &self.images
    }

    /// Close the underlying store handle
    pub async fn close(&self) {
        self.db.close().await;
    }

    /// Create a listing from form fields and at least one image
    ///
    /// # Returns
    /// * `Ok(Listing)` - The stored record
    /// * `Err(AppError::Validation)` - Missing field or no images
    /// * `Err(AppError::InvalidFileType | FileTooLarge)` - Batch rejected, nothing written
    /// * `Err(AppError::Storage | Io)` - Store or filesystem failure
    pub async fn create(
        &self,
        form: ListingForm,
        files: Vec<UploadedFile>,
    ) -> Result<Listing, AppError> {
        let fields = form.validate()?;
        if files.is_empty() {
            return Err(AppError::Validation(
                "At least one image is required".to_string(),
            ));
        }

        let paths = self.images.accept(files).await?;
        let listing = Listing::new(fields, paths);

        if let Err(e) = self.db.insert_listing(&listing).await {
            error!(
                listing_id = %listing.id,
                error = %e,
                "Failed to store listing, removing its uploaded images"
            );
            self.images.remove(&listing.images).await;
            return Err(e);
        }

        info!(
            listing_id = %listing.id,
            images = listing.images.len(),
            "Created listing"
        );
        Ok(listing)
    }

    /// Get a listing by ID
    pub async fn get(&self, id: &str) -> Result<Listing, AppError> {
        self.db
            .get_listing(id)
            .await?
            .ok_or_else(|| AppError::NotFound(id.to_string()))
    }

    /// List listings, optionally filtered by type and sorted
    pub async fn list(&self, query: &ListingQuery) -> Result<Vec<Listing>, AppError> {
        let listings = self.db.get_listings().await?;
        Ok(query.apply(listings))
    }

    /// Search listings
    ///
    /// # Returns
    /// * `Ok(Vec<Listing>)` - At least one match
    /// * `Err(AppError::NoMatch)` - Nothing matched
    pub async fn search(&self, query: &ListingQuery) -> Result<Vec<Listing>, AppError> {
        debug!(filter = ?query.filter, sort = ?query.sort, "Search query");

        let matched = self.list(query).await?;
        if matched.is_empty() {
            return Err(AppError::NoMatch);
        }
        Ok(matched)
    }

    /// Replace the scalar fields of a listing and append new images
    ///
    /// Existence is checked first, so an unknown ID is reported as NotFound
    /// even when the form is incomplete, and no file is written for it.
    ///
    /// # Returns
    /// * `Ok(Listing)` - The updated record
    /// * `Err(AppError::NotFound)` - No listing with that ID
    /// * `Err(AppError::Validation)` - Missing field
    pub async fn update(
        &self,
        id: &str,
        form: ListingForm,
        files: Vec<UploadedFile>,
    ) -> Result<Listing, AppError> {
        self.get(id).await?;
        let fields = form.validate()?;

        let new_paths = self.images.accept(files).await?;

        match self.db.update_listing(id, &fields, &new_paths).await {
            Ok(Some(listing)) => {
                info!(
                    listing_id = %id,
                    new_images = new_paths.len(),
                    "Updated listing"
                );
                Ok(listing)
            }
            Ok(None) => {
                // Deleted between the check and the write
                self.images.remove(&new_paths).await;
                Err(AppError::NotFound(id.to_string()))
            }
            Err(e) => {
                error!(
                    listing_id = %id,
                    error = %e,
                    "Failed to update listing, removing newly uploaded images"
                );
                self.images.remove(&new_paths).await;
                Err(e)
            }
        }
    }

    /// Delete a listing and the image files it referenced
    pub async fn delete(&self, id: &str) -> Result<Listing, AppError> {
        let listing = self
            .db
            .delete_listing(id)
            .await?
            .ok_or_else(|| AppError::NotFound(id.to_string()))?;

        self.images.remove(&listing.images).await;

        info!(listing_id = %id, "Deleted listing");
        Ok(listing)
    }
}
