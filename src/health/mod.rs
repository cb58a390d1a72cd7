//! # Health Module
//!
//! Liveness, readiness, full health and metrics probes for orchestrators.

pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;


pub use routes::health_routes;
