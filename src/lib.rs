//! Property Market Backend Library
//!
//! This library exposes modules for testing and external use.
//! The main binary is in `src/main.rs`.

pub mod api;
pub mod chat;
pub mod config;
pub mod error;
pub mod listings;
pub mod services;
/// Application state management
///
/// Holds the service handles injected into every request.
pub mod state;
