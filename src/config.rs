//! Application configuration
//!
//! Centralized configuration management with environment variable support
//! and sensible defaults.

use std::env;
use std::path::PathBuf;

/// Default per-file upload cap (5 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Default number of images accepted per create/update call
pub const DEFAULT_MAX_UPLOAD_FILES: usize = 5;

/// Default completion model
pub const DEFAULT_CHAT_MODEL: &str = "gemini-2.5-flash";

/// Default completion API base URL
pub const DEFAULT_CHAT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Listing store configuration
    pub database: DatabaseConfig,
    /// Image upload configuration
    pub uploads: UploadConfig,
    /// Chat proxy configuration
    pub chat: ChatConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind the server to
    pub port: u16,
    /// Host address to bind to
    pub host: String,
}

/// Listing store configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Connection string, e.g. `sqlite:data/listings.db`
    pub url: String,
    /// Connections kept open by the pool
    pub min_connections: u32,
    /// Upper bound on pooled connections
    pub max_connections: u32,
}

/// Image upload configuration
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Flat directory holding uploaded images
    pub dir: PathBuf,
    /// Maximum size of a single file in bytes
    pub max_file_bytes: usize,
    /// Maximum number of files per call
    pub max_files: usize,
}

/// Chat proxy configuration
#[derive(Clone)]
pub struct ChatConfig {
    /// API key for the completion provider
    pub api_key: Option<String>,
    /// Model name
    pub model: String,
    /// Provider base URL
    pub base_url: String,
    /// HTTP timeout for upstream calls (in seconds)
    pub timeout_secs: u64,
}

// Keep the key out of the startup log
impl std::fmt::Debug for ChatConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:data/listings.db".to_string(),
            min_connections: 1,
            max_connections: 5,
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("uploads"),
            max_file_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            max_files: DEFAULT_MAX_UPLOAD_FILES,
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_CHAT_MODEL.to_string(),
            base_url: DEFAULT_CHAT_API_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

/// Parse an environment variable, falling back to `default` when unset or malformed
fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        let database = DatabaseConfig::default();
        let uploads = UploadConfig::default();
        let chat = ChatConfig::default();

        Self {
            server: ServerConfig {
                port: env_or("PORT", 5013),
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or(database.url),
                min_connections: env_or("DB_MIN_CONNECTIONS", database.min_connections),
                max_connections: env_or("DB_MAX_CONNECTIONS", database.max_connections),
            },
            uploads: UploadConfig {
                dir: env::var_os("UPLOAD_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(uploads.dir),
                max_file_bytes: env_or("MAX_UPLOAD_BYTES", uploads.max_file_bytes),
                max_files: env_or("MAX_UPLOAD_FILES", uploads.max_files),
            },
            chat: ChatConfig {
                api_key: env::var("CHAT_API_KEY").ok().filter(|k| !k.is_empty()),
                model: env::var("CHAT_MODEL").unwrap_or(chat.model),
                base_url: env::var("CHAT_API_BASE_URL").unwrap_or(chat.base_url),
                timeout_secs: env_or("CHAT_TIMEOUT_SECS", chat.timeout_secs),
            },
        }
    }

    /// Get the server address as a string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
