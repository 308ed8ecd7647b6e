//! Listing API handlers
//!
//! CRUD and search endpoints. Create and update accept multipart form data:
//! - title, price, description: required text fields
//! - type, location, beds, baths: optional text fields
//! - images: zero or more image files

use crate::error::AppError;
use crate::listings::{Listing, ListingForm, ListingQuery, ListParams, SearchParams};
use crate::services::UploadedFile;
use crate::state::AppState;
use axum::{
    extract::{
        multipart::{Field, MultipartError, MultipartRejection},
        Multipart, Path, Query, State,
    },
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Listing plus a human-readable outcome
#[derive(Debug, Serialize, Deserialize)]
pub struct ListingEnvelope {
    /// What happened
    pub message: String,
    /// The affected listing
    pub listing: Listing,
}

impl ListingEnvelope {
    fn new(message: &str, listing: Listing) -> Json<Self> {
        Json(Self {
            message: message.to_string(),
            listing,
        })
    }
}

fn multipart_error(e: MultipartError) -> AppError {
    AppError::Validation(format!("Invalid multipart body: {}", e.body_text()))
}

fn multipart_rejection(e: MultipartRejection) -> AppError {
    AppError::Validation(format!("Invalid multipart request: {}", e.body_text()))
}

async fn read_text(field: Field<'_>) -> Result<String, AppError> {
    field.text().await.map_err(multipart_error)
}

/// Read a file field, stopping as soon as it exceeds `max_bytes`
async fn read_file(mut field: Field<'_>, max_bytes: usize) -> Result<UploadedFile, AppError> {
    let field_name = field.name().unwrap_or("images").to_string();
    let file_name = field.file_name().map(str::to_string);
    let content_type = field.content_type().map(str::to_string);

    let mut data = Vec::new();
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        if data.len() + chunk.len() > max_bytes {
            return Err(AppError::FileTooLarge {
                name: file_name.unwrap_or(field_name),
                limit: max_bytes,
            });
        }
        data.extend_from_slice(&chunk);
    }

    Ok(UploadedFile {
        field_name,
        file_name,
        content_type,
        data: data.into(),
    })
}

/// Parse a listing multipart body into form fields and image files
pub async fn read_listing_form(
    mut multipart: Multipart,
    max_file_bytes: usize,
) -> Result<(ListingForm, Vec<UploadedFile>), AppError> {
    let mut form = ListingForm::default();
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "title" => form.title = Some(read_text(field).await?),
            "price" => form.price = Some(read_text(field).await?),
            "description" => form.description = Some(read_text(field).await?),
            "type" => form.property_type = Some(read_text(field).await?),
            "location" => form.location = Some(read_text(field).await?),
            "beds" => form.beds = Some(read_text(field).await?),
            "baths" => form.baths = Some(read_text(field).await?),
            "images" | "images[]" => {
                let file = read_file(field, max_file_bytes).await?;
                // Browsers send an empty part when no file was picked
                if file.data.is_empty() && file.file_name.as_deref().unwrap_or("").is_empty() {
                    continue;
                }
                debug!(
                    file_name = ?file.file_name,
                    content_type = ?file.content_type,
                    size = file.data.len(),
                    "Received image part"
                );
                files.push(file);
            }
            _ => {
                warn!("Unknown multipart field: {}", field_name);
            }
        }
    }

    Ok((form, files))
}

/// GET /api/listings - List all listings, optionally sorted and filtered by type
pub async fn list_listings(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Listing>>, AppError> {
    let query = ListingQuery::try_from(params)?;
    let listings = state.listings.list(&query).await?;
    Ok(Json(listings))
}

/// GET /api/listings/search - Search listings by title, description, price and type
pub async fn search_listings(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Listing>>, AppError> {
    let query = ListingQuery::try_from(params)?;
    let listings = state.listings.search(&query).await?;
    Ok(Json(listings))
}

/// GET /api/listings/:id - Get a specific listing
pub async fn get_listing(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Listing>, AppError> {
    let listing = state.listings.get(&id).await?;
    Ok(Json(listing))
}

/// POST /api/listings - Create a listing with images
pub async fn create_listing(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<ListingEnvelope>), AppError> {
    let multipart = multipart.map_err(multipart_rejection)?;
    let max_file_bytes = state.listings.images().max_file_bytes();
    let (form, files) = read_listing_form(multipart, max_file_bytes).await?;

    let listing = state.listings.create(form, files).await?;

    Ok((
        StatusCode::CREATED,
        ListingEnvelope::new("Property listing created successfully!", listing),
    ))
}

/// PUT /api/listings/:id - Replace listing fields and append images
pub async fn update_listing(
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ListingEnvelope>, AppError> {
    let multipart = multipart.map_err(multipart_rejection)?;
    let max_file_bytes = state.listings.images().max_file_bytes();
    let (form, files) = read_listing_form(multipart, max_file_bytes).await?;

    let listing = state.listings.update(&id, form, files).await?;

    Ok(ListingEnvelope::new(
        "Property listing updated successfully!",
        listing,
    ))
}

/// DELETE /api/listings/:id - Delete a listing and its images
pub async fn delete_listing(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ListingEnvelope>, AppError> {
    let listing = state.listings.delete(&id).await?;

    Ok(ListingEnvelope::new(
        "Property listing deleted successfully!",
        listing,
    ))
}
