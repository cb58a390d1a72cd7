//! # Users Module
//!
//! This module handles user records:
//! - The index page listing users alongside the signed-in profile
//! - Form-based creation and the JSON read/update/delete API
//! - Soft deletion through `deleted_at`

pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod validators;


pub use routes::users_routes;
