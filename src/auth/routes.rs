//! Authentication routes

use axum::{routing::get, Router};

use super::handlers;

/// Creates and returns the authentication router
///
/// # Routes
/// - `GET /login` - Login page
/// - `GET /auth/google` - Start Google sign-in
/// - `GET /auth/:provider/login` - Start sign-in with the named provider
/// - `GET /auth/callback` - OAuth callback
/// - `GET /logout` - Clear the session user
pub fn auth_routes() -> Router {
    Router::new()
        .route("/login", get(handlers::login_page))
        .route("/auth/google", get(handlers::google_login))
        .route("/auth/:provider/login", get(handlers::oauth_login))
        .route("/auth/callback", get(handlers::oauth_callback))
        .route("/logout", get(handlers::logout))
}
