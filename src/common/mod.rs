// Common module - shared types and utilities across all modules

pub mod config;
pub mod error;
pub mod helpers;
pub mod id_generator;
pub mod migrations;
pub mod net;
pub mod state;
pub mod validation;
pub mod views;

// Re-export commonly used types for convenience
pub use config::AppConfig;
pub use error::{ApiError, ErrorResponse, MessageResponse};
pub use helpers::{escape_html, redirect_found, safe_email_log, safe_token_log};
pub use id_generator::*;
pub use net::ClientIp;
pub use state::{AppState, SharedState};
pub use validation::{ValidationError, ValidationResult, Validator};
