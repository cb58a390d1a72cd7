// src/services/mod.rs
//
// Shared services used across the domain modules

pub mod google;
pub mod identity_provider;
pub mod rate_limit;

// Re-export commonly used types for convenience
pub use google::GoogleService;
pub use identity_provider::{IdentityProvider, OAuthError};
pub use rate_limit::RateLimitService;
