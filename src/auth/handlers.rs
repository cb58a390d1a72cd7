//! Authentication handlers

use axum::{
    extract::{Extension, Path, Query},
    response::{Html, IntoResponse, Response},
};
use rand::RngCore;
use subtle::ConstantTimeEq;
use tracing::{error, info, warn};

use super::models::CallbackQuery;
use crate::common::{
    redirect_found, safe_email_log, safe_token_log, views, ApiError, ClientIp, SharedState,
};
use crate::session::{FlashKind, Session};

/// Random bytes in an OAuth state token (hex-encoded to twice this length)
pub const STATE_TOKEN_BYTES: usize = 32;

/// Generate a fresh OAuth state token
pub fn generate_state_token() -> String {
    let mut bytes = [0u8; STATE_TOKEN_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Compares the callback's state with the stored one without early exit
///
/// Empty values never match.
pub fn state_matches(received: &str, stored: &str) -> bool {
    if received.is_empty() || stored.is_empty() {
        return false;
    }
    received.as_bytes().ct_eq(stored.as_bytes()).into()
}

/// Sets a flash error and sends the browser back to the login page
fn back_to_login(session: &Session, message: &str) -> Response {
    if let Err(e) = session.set_flash(FlashKind::Error, message) {
        warn!(error = %e, "Failed to store flash message");
    }
    redirect_found("/login")
}

/// GET /login
/// Renders the login page, or redirects home when already signed in
pub async fn login_page(session: Session) -> Response {
    if session.is_logged_in() {
        return redirect_found("/");
    }

    let flashes = session.take_all_flashes();
    let content = "<h1>Sign in</h1>\n<p><a class=\"button\" href=\"/auth/google/login\">Sign in with Google</a></p>";
    Html(views::layout("Login", None, &flashes, content)).into_response()
}

/// GET /auth/:provider/login
/// Starts the OAuth flow: stores a new state token and redirects to the provider
pub async fn oauth_login(
    Extension(state): Extension<SharedState>,
    Path(provider): Path<String>,
    session: Session,
) -> Result<Response, ApiError> {
    let identity_provider = state.read().await.identity_provider.clone();

    if provider != identity_provider.name() {
        return Err(ApiError::NotFound(format!(
            "Unknown identity provider: {}",
            provider
        )));
    }

    let state_token = generate_state_token();
    session.set_state_token(&state_token).map_err(|e| {
        error!(error = %e, "Failed to store state token");
        ApiError::from(e)
    })?;

    Ok(redirect_found(
        &identity_provider.authorization_url(&state_token),
    ))
}

/// GET /auth/google
pub async fn google_login(
    state: Extension<SharedState>,
    session: Session,
) -> Result<Response, ApiError> {
    oauth_login(state, Path("google".to_string()), session).await
}

/// GET /auth/callback
/// Completes the OAuth flow
///
/// A missing or mismatched state is rejected with 400 and leaves the session
/// untouched. Every later failure is soft: a flash error and a redirect to
/// `/login` so the user can start over.
pub async fn oauth_callback(
    Extension(state): Extension<SharedState>,
    ClientIp(client_ip): ClientIp,
    session: Session,
    Query(query): Query<CallbackQuery>,
) -> Result<Response, ApiError> {
    let received_state = query.state.unwrap_or_default();
    let stored_state = session.state_token();

    if !state_matches(&received_state, &stored_state) {
        warn!(
            client_ip = %client_ip,
            received = %safe_token_log(&received_state),
            "OAuth state token mismatch or missing"
        );
        return Err(ApiError::BadRequest("Invalid state token".to_string()));
    }

    // Single use
    if let Err(e) = session.delete_state_token() {
        warn!(error = %e, "Failed to delete state token");
    }

    let code = match query.code.filter(|c| !c.is_empty()) {
        Some(code) => code,
        None => {
            warn!(client_ip = %client_ip, "Missing authorization code");
            return Ok(back_to_login(&session, "Sign-in was cancelled. Please try again."));
        }
    };

    let identity_provider = state.read().await.identity_provider.clone();

    let token = match identity_provider.exchange_code(&code).await {
        Ok(token) => token,
        Err(e) => {
            warn!(client_ip = %client_ip, error = %e, "OAuth token exchange failed");
            return Ok(back_to_login(&session, "Could not complete sign-in. Please try again."));
        }
    };

    let profile = match identity_provider.fetch_user_info(&token.access_token).await {
        Ok(profile) => profile,
        Err(e) => {
            warn!(client_ip = %client_ip, error = %e, "Failed to fetch user profile");
            return Ok(back_to_login(&session, "Could not load your profile. Please try again."));
        }
    };

    let user = match profile.into_logged_in_user() {
        Some(user) => user,
        None => {
            warn!(client_ip = %client_ip, "User profile is missing required fields");
            return Ok(back_to_login(
                &session,
                "Your account did not provide an id and email address.",
            ));
        }
    };

    if let Err(e) = session.set_logged_in_user(&user) {
        error!(error = %e, client_ip = %client_ip, "Failed to save user profile in session");
        return Ok(back_to_login(&session, "Could not start your session. Please try again."));
    }

    info!(
        email = %safe_email_log(&user.email),
        client_ip = %client_ip,
        "User logged in"
    );
    Ok(redirect_found("/"))
}

/// GET /logout
pub async fn logout(session: Session, ClientIp(client_ip): ClientIp) -> Result<Response, ApiError> {
    session.delete_logged_in_user().map_err(|e| {
        error!(error = %e, client_ip = %client_ip, "Failed to clear session user");
        ApiError::InternalServer("Could not delete user".to_string())
    })?;

    info!(client_ip = %client_ip, "User logged out");
    Ok(redirect_found("/"))
}
