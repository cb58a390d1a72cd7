//! # Auth Module
//!
//! This module handles all authentication-related functionality including:
//! - OAuth sign-in with CSRF state-token protection
//! - The login page and logout
//! - The login gate for protected routes and the AuthedUser extractor

pub mod extractors;
pub mod gate;
pub mod handlers;
pub mod models;
pub mod routes;


pub use extractors::AuthedUser;
pub use gate::require_login;
pub use models::LoggedInUser;
pub use routes::auth_routes;
