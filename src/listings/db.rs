//! Listing database operations
//!
//! Handles all database interactions for listings. The pool is an explicit
//! handle created from configuration and closed on shutdown.

use crate::config::DatabaseConfig;
use crate::error::AppError;
use crate::listings::models::{Listing, ListingFields, ListingRow};
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

const LISTING_COLUMNS: &str = "id, title, price, description, images, property_type, location, \
                               beds, baths, created_at, updated_at";

/// Database connection pool for listing operations
#[derive(Debug, Clone)]
pub struct ListingDb {
    pool: SqlitePool,
}

impl ListingDb {
    /// Initialize database connection pool
    ///
    /// # Arguments
    /// * `config` - Connection string and pool bounds
    ///
    /// # Returns
    /// * `Ok(ListingDb)` if successful
    /// * `Err(AppError)` if connection or migration failed
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, AppError> {
        // SQLite connection string format: sqlite:path/to/db.db
        let connection_string = if config.url.starts_with("sqlite:") {
            config.url.clone()
        } else {
            format!("sqlite:{}", config.url)
        };

        // Ensure parent directory exists for file-backed databases
        let file_path = connection_string
            .trim_start_matches("sqlite:")
            .trim_start_matches("//");
        let file_path = file_path.split('?').next().unwrap_or_default();
        if !file_path.is_empty() && !file_path.contains(":memory:") {
            if let Some(parent) = Path::new(file_path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
        }

        let options = SqliteConnectOptions::from_str(&connection_string)?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .min_connections(config.min_connections)
            .max_connections(config.max_connections.max(1))
            .connect_with(options)
            .await?;

        info!(url = %config.url, "Connected to listing database");

        let db = Self { pool };
        db.run_migrations().await?;

        Ok(db)
    }

    /// Close every pooled connection
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Listing database pool closed");
    }

    /// Run database migrations
    async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations...");

        let migration_sql = include_str!("../../migrations/001_create_listings.sql");

        // Remove comments and normalize whitespace
        let mut cleaned_sql = String::new();
        for line in migration_sql.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with("--") {
                continue;
            }
            let without_comments = match trimmed.find("--") {
                Some(comment_pos) => &trimmed[..comment_pos],
                None => trimmed,
            };
            cleaned_sql.push_str(without_comments.trim());
            cleaned_sql.push(' ');
        }

        for statement in cleaned_sql.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    AppError::Internal(anyhow::anyhow!(
                        "Migration failed: {} - Statement: {}",
                        e,
                        statement.chars().take(100).collect::<String>()
                    ))
                })?;
        }

        info!("Database migrations completed successfully");
        Ok(())
    }

    /// Get all listings in insertion order
    pub async fn get_listings(&self) -> Result<Vec<Listing>, AppError> {
        let rows = sqlx::query_as::<_, ListingRow>(&format!(
            "SELECT {} FROM listings ORDER BY rowid ASC",
            LISTING_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Listing::try_from).collect()
    }

    /// Get a listing by ID
    pub async fn get_listing(&self, id: &str) -> Result<Option<Listing>, AppError> {
        let row = sqlx::query_as::<_, ListingRow>(&format!(
            "SELECT {} FROM listings WHERE id = ?",
            LISTING_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Listing::try_from).transpose()
    }

    /// Insert a new listing
    pub async fn insert_listing(&self, listing: &Listing) -> Result<(), AppError> {
        sqlx::query(&format!(
            "INSERT INTO listings ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            LISTING_COLUMNS
        ))
        .bind(&listing.id)
        .bind(&listing.title)
        .bind(listing.price)
        .bind(&listing.description)
        .bind(images_json(listing)?)
        .bind(&listing.details.property_type)
        .bind(&listing.details.location)
        .bind(listing.details.beds.map(i64::from))
        .bind(listing.details.baths.map(i64::from))
        .bind(listing.created_at.timestamp_millis())
        .bind(listing.updated_at.timestamp_millis())
        .execute(&self.pool)
        .await?;

        debug!(listing_id = %listing.id, "Inserted listing");
        Ok(())
    }

    /// Replace the scalar columns of a listing and append `new_images`
    ///
    /// The append happens inside the UPDATE statement, so concurrent updates
    /// each keep the paths they add.
    ///
    /// # Returns
    /// * `Ok(Some(Listing))` - The updated record
    /// * `Ok(None)` - No listing with that ID exists
    pub async fn update_listing(
        &self,
        id: &str,
        fields: &ListingFields,
        new_images: &[String],
    ) -> Result<Option<Listing>, AppError> {
        // json_insert applies its edits left to right, each '$[#]' appends
        let images_expr = if new_images.is_empty() {
            "images".to_string()
        } else {
            format!("json_insert(images{})", ", '$[#]', ?".repeat(new_images.len()))
        };
        let sql = format!(
            "UPDATE listings SET title = ?, price = ?, description = ?, property_type = ?, \
             location = ?, beds = ?, baths = ?, images = {}, updated_at = MAX(?, created_at) \
             WHERE id = ? RETURNING {}",
            images_expr, LISTING_COLUMNS
        );

        let mut query = sqlx::query_as::<_, ListingRow>(&sql)
            .bind(&fields.title)
            .bind(fields.price)
            .bind(&fields.description)
            .bind(&fields.details.property_type)
            .bind(&fields.details.location)
            .bind(fields.details.beds.map(i64::from))
            .bind(fields.details.baths.map(i64::from));
        for path in new_images {
            query = query.bind(path);
        }
        let row = query
            .bind(Utc::now().timestamp_millis())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        debug!(
            listing_id = %id,
            found = row.is_some(),
            new_images = new_images.len(),
            "Updated listing"
        );
        row.map(Listing::try_from).transpose()
    }

    /// Delete a listing and return the removed record
    pub async fn delete_listing(&self, id: &str) -> Result<Option<Listing>, AppError> {
        let row = sqlx::query_as::<_, ListingRow>(&format!(
            "DELETE FROM listings WHERE id = ? RETURNING {}",
            LISTING_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        debug!(listing_id = %id, found = row.is_some(), "Deleted listing");
        row.map(Listing::try_from).transpose()
    }
}

fn images_json(listing: &Listing) -> Result<String, AppError> {
    serde_json::to_string(&listing.images)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to encode image list: {}", e)))
}
