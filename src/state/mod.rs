// State management module
// Handles the service handles shared across requests

pub mod app_state;

pub use app_state::AppState;
