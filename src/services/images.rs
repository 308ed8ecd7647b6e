//! Image ingestion service
//!
//! Validates uploaded image batches, writes them under generated names to a
//! flat upload directory, and removes them again when a listing goes away.

use crate::config::UploadConfig;
use crate::error::AppError;
use axum::body::Bytes;
use futures_util::future::join_all;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// URL prefix (and stored path prefix) under which uploads are served
pub const UPLOADS_PREFIX: &str = "uploads";

/// Accepted image formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    /// `image/jpeg`
    Jpeg,
    /// `image/png`
    Png,
    /// `image/gif`
    Gif,
}

impl ImageKind {
    /// Look up an allowed MIME type
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(ImageKind::Jpeg),
            "image/png" => Some(ImageKind::Png),
            "image/gif" => Some(ImageKind::Gif),
            _ => None,
        }
    }

    /// Canonical file extension
    pub fn extension(&self) -> &'static str {
        match self {
            ImageKind::Jpeg => "jpg",
            ImageKind::Png => "png",
            ImageKind::Gif => "gif",
        }
    }

    /// Whether a lowercase extension is a known spelling for this kind
    pub fn accepts_extension(&self, ext: &str) -> bool {
        match self {
            ImageKind::Jpeg => matches!(ext, "jpg" | "jpeg" | "jpe" | "jfif"),
            ImageKind::Png => ext == "png",
            ImageKind::Gif => ext == "gif",
        }
    }
}

/// A file received in a multipart upload, not yet written anywhere
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Multipart field name the file arrived under
    pub field_name: String,
    /// Client-side filename, if sent
    pub file_name: Option<String>,
    /// Declared MIME type, if sent
    pub content_type: Option<String>,
    /// File contents
    pub data: Bytes,
}

impl UploadedFile {
    fn display_name(&self) -> &str {
        self.file_name.as_deref().unwrap_or(&self.field_name)
    }
}

/// Image storage service
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
    max_file_bytes: usize,
    max_files: usize,
}

impl ImageStore {
    /// Create a store over the configured upload directory
    pub fn new(config: &UploadConfig) -> Self {
        Self {
            dir: config.dir.clone(),
            max_file_bytes: config.max_file_bytes,
            max_files: config.max_files,
        }
    }

    /// Directory holding stored images
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Maximum size of a single file in bytes
    pub fn max_file_bytes(&self) -> usize {
        self.max_file_bytes
    }

    /// Request body limit large enough for a full batch plus form fields
    pub fn body_limit(&self) -> usize {
        self.max_file_bytes
            .saturating_mul(self.max_files)
            .saturating_add(1024 * 1024)
    }

    /// Validate a whole batch without touching the filesystem
    ///
    /// # Returns
    /// * `Ok(Vec<ImageKind>)` - Detected kind per file, in input order
    /// * `Err(AppError)` - First file that breaks the count, type or size limit
    pub fn validate(&self, files: &[UploadedFile]) -> Result<Vec<ImageKind>, AppError> {
        if files.len() > self.max_files {
            return Err(AppError::Validation(format!(
                "At most {} images can be uploaded at once",
                self.max_files
            )));
        }

        files
            .iter()
            .map(|file| {
                let mime = file.content_type.as_deref().unwrap_or("unknown");
                let kind = ImageKind::from_mime(mime)
                    .ok_or_else(|| AppError::InvalidFileType(mime.to_string()))?;
                if file.data.len() > self.max_file_bytes {
                    return Err(AppError::FileTooLarge {
                        name: file.display_name().to_string(),
                        limit: self.max_file_bytes,
                    });
                }
                Ok(kind)
            })
            .collect()
    }

    /// Validate and store a batch of images
    ///
    /// Nothing is written unless every file passes validation. If a write
    /// fails midway, the files already written for this batch are removed.
    ///
    /// # Returns
    /// * `Ok(Vec<String>)` - Stored relative paths (`uploads/<name>`) in input order
    /// * `Err(AppError)` - Validation or filesystem failure
    pub async fn accept(&self, files: Vec<UploadedFile>) -> Result<Vec<String>, AppError> {
        self.accept_named(files, |file, kind| {
            generate_filename(&file.field_name, file.file_name.as_deref(), kind)
        })
        .await
    }

    async fn accept_named<F>(
        &self,
        files: Vec<UploadedFile>,
        mut name_for: F,
    ) -> Result<Vec<String>, AppError>
    where
        F: FnMut(&UploadedFile, ImageKind) -> String,
    {
        let kinds = self.validate(&files)?;
        if files.is_empty() {
            return Ok(Vec::new());
        }

        fs::create_dir_all(&self.dir).await?;

        let mut stored = Vec::with_capacity(files.len());
        for (file, kind) in files.iter().zip(kinds) {
            let filename = name_for(file, kind);
            if let Err(e) = self.write_file(&filename, &file.data).await {
                warn!(filename = %filename, error = %e, "Failed to write image, rolling back batch");
                self.remove(&stored).await;
                return Err(e);
            }

            info!(
                "Saved uploaded image: {} ({} bytes)",
                filename,
                file.data.len()
            );
            stored.push(format!("{}/{}", UPLOADS_PREFIX, filename));
        }

        Ok(stored)
    }

    /// Write a new file, never replacing an existing one
    async fn write_file(&self, filename: &str, data: &[u8]) -> Result<(), AppError> {
        let path = self.dir.join(filename);
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;
        file.write_all(data).await?;
        file.sync_all().await?;
        Ok(())
    }

    /// Remove stored images, best-effort
    ///
    /// Paths outside the upload directory are ignored; failures are logged.
    pub async fn remove(&self, paths: &[String]) {
        let removals = paths.iter().map(|stored| async move {
            let Some(path) = self.resolve(stored) else {
                warn!(path = %stored, "Refusing to remove path outside upload directory");
                return;
            };
            match fs::remove_file(&path).await {
                Ok(()) => debug!(path = %stored, "Removed image"),
                Err(e) => warn!(path = %stored, error = %e, "Failed to remove image"),
            }
        });
        join_all(removals).await;
    }

    /// Map a stored relative path to a file inside the upload directory
    pub fn resolve(&self, stored: &str) -> Option<PathBuf> {
        let name = stored
            .strip_prefix(UPLOADS_PREFIX)
            .and_then(|rest| rest.strip_prefix('/'))?;
        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(file)), None) => Some(self.dir.join(file)),
            _ => None,
        }
    }
}

/// Build `<field>-<unix millis>-<9 random digits>.<ext>`
///
/// The client's extension is kept when it agrees with the detected kind,
/// otherwise the kind's canonical extension is used.
pub fn generate_filename(field_name: &str, original: Option<&str>, kind: ImageKind) -> String {
    let field: String = field_name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    let field = if field.is_empty() { "images".to_string() } else { field };

    let extension = original
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .filter(|ext| kind.accepts_extension(ext))
        .unwrap_or_else(|| kind.extension().to_string());

    let random = uuid::Uuid::new_v4().as_u128() % 1_000_000_000;

    format!(
        "{}-{}-{:09}.{}",
        field,
        chrono::Utc::now().timestamp_millis(),
        random,
        extension
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store(dir: &Path) -> ImageStore {
        ImageStore::new(&UploadConfig {
            dir: dir.to_path_buf(),
            max_file_bytes: 16,
            max_files: 3,
        })
    }

    fn file(name: &str, mime: &str, len: usize) -> UploadedFile {
        UploadedFile {
            field_name: "images".to_string(),
            file_name: Some(name.to_string()),
            content_type: Some(mime.to_string()),
            data: Bytes::from(vec![7u8; len]),
        }
    }

    fn files_in(dir: &Path) -> usize {
        std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
    }

    #[test]
    fn test_image_kind_from_mime() {
        assert_eq!(ImageKind::from_mime("image/jpeg"), Some(ImageKind::Jpeg));
        assert_eq!(ImageKind::from_mime("IMAGE/PNG"), Some(ImageKind::Png));
        assert_eq!(ImageKind::from_mime("image/gif"), Some(ImageKind::Gif));
        assert_eq!(ImageKind::from_mime("application/pdf"), None);
        assert_eq!(ImageKind::from_mime("image/webp"), None);
    }

    #[test]
    fn test_generate_filename_shape() {
        let name = generate_filename("images", Some("Front Door.JPEG"), ImageKind::Jpeg);
        let parts: Vec<&str> = name.trim_end_matches(".jpeg").split('-').collect();
        assert!(name.ends_with(".jpeg"));
        assert_eq!(parts[0], "images");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 9);

        let fallback = generate_filename("../evil", Some("noext"), ImageKind::Png);
        assert!(fallback.starts_with("evil-"));
        assert!(fallback.ends_with(".png"));

        let mismatched = generate_filename("images", Some("photo.exe"), ImageKind::Gif);
        assert!(mismatched.ends_with(".gif"));
    }

    #[test]
    fn test_generate_filename_unique() {
        let a = generate_filename("images", Some("a.png"), ImageKind::Png);
        let b = generate_filename("images", Some("a.png"), ImageKind::Png);
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_accept_writes_in_order() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let upload_dir = temp_dir.path().join("uploads");
        let store = store(&upload_dir);

        let paths = store
            .accept(vec![file("a.jpg", "image/jpeg", 4), file("b.gif", "image/gif", 8)])
            .await
            .expect("Failed to accept images");

        assert_eq!(paths.len(), 2);
        assert!(paths[0].starts_with("uploads/images-") && paths[0].ends_with(".jpg"));
        assert!(paths[1].ends_with(".gif"));
        for path in &paths {
            let on_disk = store.resolve(path).unwrap();
            assert!(on_disk.exists());
        }
        assert_eq!(std::fs::read(store.resolve(&paths[1]).unwrap()).unwrap().len(), 8);
    }

    #[tokio::test]
    async fn test_accept_rejects_whole_batch_on_bad_type() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let store = store(temp_dir.path());

        let result = store
            .accept(vec![
                file("a.jpg", "image/jpeg", 4),
                file("doc.pdf", "application/pdf", 4),
            ])
            .await;

        match result {
            Err(AppError::InvalidFileType(mime)) => assert_eq!(mime, "application/pdf"),
            other => panic!("Expected InvalidFileType error, got: {:?}", other),
        }
        assert_eq!(files_in(temp_dir.path()), 0);
    }

    #[tokio::test]
    async fn test_accept_rejects_oversized_file() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let store = store(temp_dir.path());

        let result = store.accept(vec![file("big.png", "image/png", 17)]).await;
        match result {
            Err(AppError::FileTooLarge { name, limit }) => {
                assert_eq!(name, "big.png");
                assert_eq!(limit, 16);
            }
            other => panic!("Expected FileTooLarge error, got: {:?}", other),
        }
        assert_eq!(files_in(temp_dir.path()), 0);
    }

    #[tokio::test]
    async fn test_accept_rejects_too_many_files() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let store = store(temp_dir.path());
        let batch = (0..4).map(|i| file(&format!("{}.png", i), "image/png", 1)).collect();

        let result = store.accept(batch).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(files_in(temp_dir.path()), 0);
    }

    #[tokio::test]
    async fn test_missing_content_type_is_invalid() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let store = store(temp_dir.path());
        let mut upload = file("a.png", "image/png", 1);
        upload.content_type = None;

        let result = store.accept(vec![upload]).await;
        assert!(matches!(result, Err(AppError::InvalidFileType(_))));
    }

    #[tokio::test]
    async fn test_failed_write_rolls_back_batch() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let store = store(temp_dir.path());
        std::fs::write(temp_dir.path().join("taken.png"), b"original").unwrap();

        let mut names = vec!["first.png", "taken.png", "third.png"].into_iter();
        let result = store
            .accept_named(
                vec![
                    file("a.png", "image/png", 1),
                    file("b.png", "image/png", 1),
                    file("c.png", "image/png", 1),
                ],
                |_, _| names.next().unwrap_or("extra.png").to_string(),
            )
            .await;

        assert!(matches!(result, Err(AppError::Io(_))));
        assert!(!temp_dir.path().join("first.png").exists());
        assert!(!temp_dir.path().join("third.png").exists());
        // The existing file is neither overwritten nor removed
        assert_eq!(
            std::fs::read(temp_dir.path().join("taken.png")).unwrap(),
            b"original"
        );
        assert_eq!(files_in(temp_dir.path()), 1);
    }

    #[tokio::test]
    async fn test_remove_deletes_files_and_ignores_missing() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let store = store(temp_dir.path());
        let mut paths = store
            .accept(vec![file("a.png", "image/png", 1)])
            .await
            .unwrap();
        paths.push("uploads/never-written.png".to_string());

        store.remove(&paths).await;
        assert_eq!(files_in(temp_dir.path()), 0);
    }

    #[test]
    fn test_body_limit_covers_full_batch() {
        let store = store(Path::new("/srv/uploads"));
        assert!(store.body_limit() > 16 * 3);
    }

    #[test]
    fn test_resolve_stays_inside_upload_dir() {
        let store = store(Path::new("/srv/uploads"));
        assert_eq!(
            store.resolve("uploads/images-1-000000001.png"),
            Some(PathBuf::from("/srv/uploads/images-1-000000001.png"))
        );
        assert_eq!(store.resolve("uploads/../secret.txt"), None);
        assert_eq!(store.resolve("uploads/nested/file.png"), None);
        assert_eq!(store.resolve("/etc/passwd"), None);
        assert_eq!(store.resolve("uploads/"), None);
    }
}
