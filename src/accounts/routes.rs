use super::handlers;
use axum::{
    routing::{get, post},
    Router,
};

/// Creates the accounts router; every route here sits behind the login gate
pub fn accounts_routes() -> Router {
    Router::new()
        .route(
            "/accounts",
            get(handlers::list_accounts).post(handlers::create_account),
        )
        .route("/accounts/update/:id", post(handlers::update_account))
}
