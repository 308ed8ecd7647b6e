// Application state shared by all handlers
// Holds explicit service handles; nothing here is mutable after startup

use crate::chat::ChatProxy;
use crate::services::ListingService;
use std::sync::Arc;

/// Main application state
///
/// Cloned into every request; each field is a cheap shared handle.
#[derive(Clone)]
pub struct AppState {
    /// Listing CRUD/search service
    pub listings: Arc<ListingService>,
    /// Chat proxy
    pub chat: Arc<ChatProxy>,
}

impl AppState {
    /// Create application state from service handles
    pub fn new(listings: ListingService, chat: ChatProxy) -> Self {
        Self {
            listings: Arc::new(listings),
            chat: Arc::new(chat),
        }
    }
}
