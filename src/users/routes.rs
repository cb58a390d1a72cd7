use super::handlers;
use axum::{routing::get, Router};

/// Creates the users router; every route here sits behind the login gate
pub fn users_routes() -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route(
            "/users",
            get(handlers::get_users).post(handlers::create_user),
        )
        .route(
            "/users/:id",
            get(handlers::get_user)
                .put(handlers::update_user)
                .delete(handlers::delete_user),
        )
}
