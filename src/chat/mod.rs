//! Chat module
//!
//! Forwards single user messages to an external completion API.

pub mod client;
pub mod proxy;
pub mod types;

pub use client::{CompletionClient, CompletionProvider};
pub use proxy::ChatProxy;
