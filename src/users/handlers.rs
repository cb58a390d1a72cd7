use super::models::{CreateUserForm, UpdateUserRequest, User};
use super::services::UsersService;
use crate::auth::AuthedUser;
use crate::common::{
    escape_html, redirect_found, safe_email_log, views, ApiError, ClientIp, MessageResponse,
    SharedState,
};
use crate::session::{FlashKind, Session};
use axum::{
    extract::{rejection::JsonRejection, Extension, Form, Path},
    response::{Html, IntoResponse, Response},
    Json,
};
use tracing::{info, warn};

fn users_table(users: &[User]) -> String {
    if users.is_empty() {
        return "<p>No users yet.</p>".to_string();
    }

    let rows: String = users
        .iter()
        .map(|user| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                escape_html(&user.id),
                escape_html(&user.name),
                escape_html(&user.email),
                escape_html(&user.phone)
            )
        })
        .collect();

    format!(
        "<table>\n<thead><tr><th>ID</th><th>Name</th><th>Email</th><th>Phone</th></tr></thead>\n<tbody>\n{}</tbody>\n</table>",
        rows
    )
}

const CREATE_USER_FORM: &str = r#"<form method="post" action="/users">
<input name="name" placeholder="Name" required>
<input name="email" type="email" placeholder="Email" required>
<input name="phone" placeholder="Phone" required>
<button type="submit">Add user</button>
</form>"#;

/// GET / - User list and the signed-in profile
pub async fn index(
    Extension(state): Extension<SharedState>,
    AuthedUser(profile): AuthedUser,
    session: Session,
) -> Result<Response, ApiError> {
    let db = state.read().await.db.clone();
    let users = UsersService::new(db).list_users().await?;

    let content = format!(
        "<h1>Users</h1>\n{}\n<h2>New user</h2>\n{}",
        users_table(&users),
        CREATE_USER_FORM
    );
    let flashes = session.take_all_flashes();

    Ok(Html(views::layout("Users", Some(&profile), &flashes, &content)).into_response())
}

/// POST /users - Create a user from a form and go back to the list
pub async fn create_user(
    Extension(state): Extension<SharedState>,
    ClientIp(client_ip): ClientIp,
    session: Session,
    Form(form): Form<CreateUserForm>,
) -> Result<Response, ApiError> {
    let db = state.read().await.db.clone();

    let user = UsersService::new(db).create_user(form).await.map_err(|e| {
        warn!(client_ip = %client_ip, error = %e, "Failed to create user");
        e
    })?;

    info!(
        user_id = %user.id,
        email = %safe_email_log(&user.email),
        client_ip = %client_ip,
        "User created"
    );
    if let Err(e) = session.set_flash(FlashKind::Success, "User created") {
        warn!(error = %e, "Failed to store flash message");
    }

    Ok(redirect_found("/"))
}

/// GET /users - All users as JSON
pub async fn get_users(
    Extension(state): Extension<SharedState>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.read().await.db.clone();
    let users = UsersService::new(db).list_users().await?;
    Ok(Json(users))
}

/// GET /users/:id
pub async fn get_user(
    Extension(state): Extension<SharedState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.read().await.db.clone();
    let user = UsersService::new(db).get_user(&user_id).await?;
    Ok(Json(user))
}

/// PUT /users/:id - Partial update from JSON
pub async fn update_user(
    Extension(state): Extension<SharedState>,
    ClientIp(client_ip): ClientIp,
    Path(user_id): Path<String>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.read().await.db.clone();
    let users_service = UsersService::new(db);

    // 404 takes precedence over a malformed body
    users_service.get_user(&user_id).await?;
    let Json(request) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    let user = users_service.update_user(&user_id, request).await?;

    info!(user_id = %user.id, client_ip = %client_ip, "User updated");
    Ok(Json(user))
}

/// DELETE /users/:id - Soft delete
pub async fn delete_user(
    Extension(state): Extension<SharedState>,
    ClientIp(client_ip): ClientIp,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.read().await.db.clone();
    UsersService::new(db).delete_user(&user_id).await?;

    info!(user_id = %user_id, client_ip = %client_ip, "User deleted");
    Ok(Json(MessageResponse {
        message: "User deleted".to_string(),
    }))
}
