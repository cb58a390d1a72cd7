//! # Accounts Module
//!
//! Accounts belong to exactly one user and carry a bounded, non-negative balance.
//! All routes are form-driven and redirect back to the account list.

pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod validators;


pub use routes::accounts_routes;
