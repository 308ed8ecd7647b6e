//! Shared helpers for router-level tests

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use http_body_util::BodyExt;
use property_market_backend::{
    api,
    chat::{ChatProxy, CompletionClient},
    config::{ChatConfig, DatabaseConfig, UploadConfig},
    listings::ListingDb,
    services::{ImageStore, ListingService},
    state::AppState,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

pub const BOUNDARY: &str = "----listing-test-boundary";

/// A test application with its own database and upload directory
pub struct TestApp {
    pub router: Router,
    pub upload_dir: PathBuf,
    _temp_dir: TempDir,
}

impl TestApp {
    /// App whose chat proxy talks to `chat_base_url`
    pub async fn with_chat(chat_base_url: &str, api_key: Option<&str>) -> Self {
        let max_file_bytes = UploadConfig::default().max_file_bytes;
        Self::build(chat_base_url, api_key, max_file_bytes).await
    }

    /// App with a custom per-image size cap
    pub async fn with_max_file_bytes(max_file_bytes: usize) -> Self {
        Self::build("http://127.0.0.1:9", Some("test-key"), max_file_bytes).await
    }

    async fn build(chat_base_url: &str, api_key: Option<&str>, max_file_bytes: usize) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let upload_dir = temp_dir.path().join("uploads");

        let db = ListingDb::connect(&DatabaseConfig {
            url: temp_dir.path().join("test.db").to_str().unwrap().to_string(),
            ..DatabaseConfig::default()
        })
        .await
        .expect("Failed to create test database");
        let images = ImageStore::new(&UploadConfig {
            dir: upload_dir.clone(),
            max_file_bytes,
            ..UploadConfig::default()
        });
        let completion = CompletionClient::new(&ChatConfig {
            api_key: api_key.map(str::to_string),
            base_url: chat_base_url.to_string(),
            ..ChatConfig::default()
        })
        .unwrap();

        let state = AppState::new(
            ListingService::new(db, images),
            ChatProxy::new(Arc::new(completion)),
        );

        Self {
            router: api::router(state),
            upload_dir,
            _temp_dir: temp_dir,
        }
    }

    /// App whose chat upstream is unreachable
    pub async fn new() -> Self {
        Self::with_chat("http://127.0.0.1:9", Some("test-key")).await
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.send(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn delete(&self, uri: &str) -> Response<Body> {
        self.send(Request::delete(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn multipart(&self, method: &str, uri: &str, parts: &[Part<'_>]) -> Response<Body> {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart_body(parts)))
            .unwrap();
        self.send(request).await
    }

    pub async fn post_raw(&self, uri: &str, content_type: &str, body: &str) -> Response<Body> {
        let request = Request::post(uri)
            .header("content-type", content_type)
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    pub async fn post_json(&self, uri: &str, body: &str) -> Response<Body> {
        let request = Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    pub fn upload_count(&self) -> usize {
        count_files(&self.upload_dir)
    }
}

pub fn count_files(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}

/// One part of a multipart body
pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        filename: &'a str,
        content_type: &'a str,
        data: &'a [u8],
    },
}

pub fn png(filename: &str) -> Part<'_> {
    Part::File {
        name: "images",
        filename,
        content_type: "image/png",
        data: b"\x89PNG\r\n\x1a\nfake",
    }
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                        .as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                filename,
                content_type,
                data,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        name, filename, content_type
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
