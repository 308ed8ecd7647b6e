//! Listing data models
//!
//! Defines the stored listing record, its database row shape, and the
//! unvalidated form input accepted on create/update.

use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Unique identifier for a listing
pub type ListingId = String;

/// Optional descriptive attributes of a property
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyDetails {
    /// Kind of property ("house", "apartment", ...)
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub property_type: Option<String>,
    /// Free-text location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Number of bedrooms
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beds: Option<u32>,
    /// Number of bathrooms
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baths: Option<u32>,
}

/// A persisted property listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    /// Store-generated identifier
    pub id: ListingId,
    /// Headline shown in listing cards
    pub title: String,
    /// Asking price, never negative
    pub price: f64,
    /// Long-form description
    pub description: String,
    /// Upload-relative image paths in upload order
    pub images: Vec<String>,
    /// Optional attributes
    #[serde(flatten)]
    pub details: PropertyDetails,
    /// When the listing was created
    pub created_at: DateTime<Utc>,
    /// When the listing was last modified
    pub updated_at: DateTime<Utc>,
}

impl Listing {
    /// Create a new listing with a fresh ID and timestamps
    pub fn new(fields: ListingFields, images: Vec<String>) -> Self {
        let now = now_millis();
        Self {
            id: Uuid::new_v4().to_string(),
            title: fields.title,
            price: fields.price,
            description: fields.description,
            images,
            details: fields.details,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Current time truncated to the millisecond precision the store keeps
fn now_millis() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}

/// Raw `listings` table row
#[allow(missing_docs)]
#[derive(Debug, Clone, FromRow)]
pub struct ListingRow {
    pub id: String,
    pub title: String,
    pub price: f64,
    pub description: String,
    /// JSON array of image paths
    pub images: String,
    pub property_type: Option<String>,
    pub location: Option<String>,
    pub beds: Option<i64>,
    pub baths: Option<i64>,
    /// Unix timestamp in milliseconds
    pub created_at: i64,
    /// Unix timestamp in milliseconds
    pub updated_at: i64,
}

impl TryFrom<ListingRow> for Listing {
    type Error = AppError;

    fn try_from(row: ListingRow) -> Result<Self, Self::Error> {
        let images: Vec<String> = serde_json::from_str(&row.images).map_err(|e| {
            AppError::Internal(anyhow::anyhow!(
                "Corrupt image list for listing {}: {}",
                row.id,
                e
            ))
        })?;
        let timestamp = |ms: i64| {
            DateTime::from_timestamp_millis(ms).ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!(
                    "Invalid timestamp {} for listing {}",
                    ms,
                    row.id
                ))
            })
        };

        Ok(Self {
            created_at: timestamp(row.created_at)?,
            updated_at: timestamp(row.updated_at)?,
            id: row.id,
            title: row.title,
            price: row.price,
            description: row.description,
            images,
            details: PropertyDetails {
                property_type: row.property_type,
                location: row.location,
                beds: row.beds.and_then(|b| u32::try_from(b).ok()),
                baths: row.baths.and_then(|b| u32::try_from(b).ok()),
            },
        })
    }
}

/// Validated scalar fields of a listing
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq)]
pub struct ListingFields {
    pub title: String,
    pub price: f64,
    pub description: String,
    pub details: PropertyDetails,
}

/// Unvalidated text fields as submitted in a form
#[allow(missing_docs)]
#[derive(Debug, Clone, Default)]
pub struct ListingForm {
    pub title: Option<String>,
    pub price: Option<String>,
    pub description: Option<String>,
    pub property_type: Option<String>,
    pub location: Option<String>,
    pub beds: Option<String>,
    pub baths: Option<String>,
}

/// Trimmed value, or `None` when absent or blank
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_count(name: &str, value: Option<String>) -> Result<Option<u32>, AppError> {
    non_blank(value)
        .map(|v| {
            v.parse::<u32>().map_err(|_| {
                AppError::Validation(format!("{} must be a non-negative whole number", name))
            })
        })
        .transpose()
}

impl ListingForm {
    /// Validate required fields and parse numeric ones
    ///
    /// # Returns
    /// * `Ok(ListingFields)` - All required fields present and well-formed
    /// * `Err(AppError::Validation)` - A required field is missing or malformed
    pub fn validate(self) -> Result<ListingFields, AppError> {
        let (Some(title), Some(price), Some(description)) = (
            non_blank(self.title),
            non_blank(self.price),
            non_blank(self.description),
        ) else {
            return Err(AppError::Validation("All fields are required!".to_string()));
        };

        let price = price
            .parse::<f64>()
            .ok()
            .filter(|p| p.is_finite() && *p >= 0.0)
            .ok_or_else(|| AppError::Validation("Price must be a non-negative number".to_string()))?;

        Ok(ListingFields {
            title,
            price,
            description,
            details: PropertyDetails {
                property_type: non_blank(self.property_type),
                location: non_blank(self.location),
                beds: parse_count("beds", self.beds)?,
                baths: parse_count("baths", self.baths)?,
            },
        })
    }
}
