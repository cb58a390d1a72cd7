//! Authentication gate for protected route groups

use axum::{extract::Request, middleware::Next, response::Response};
use tracing::{debug, warn};

use crate::common::{redirect_found, ClientIp};
use crate::session::Session;

/// Lets the request through only when the session holds a logged-in user
///
/// Anonymous requests are redirected to `/login` and the handler never runs.
/// Authenticated requests carry the [`LoggedInUser`](super::models::LoggedInUser)
/// in their extensions, read back with [`AuthedUser`](super::AuthedUser).
pub async fn require_login(
    session: Session,
    ClientIp(client_ip): ClientIp,
    mut request: Request,
    next: Next,
) -> Response {
    match session.logged_in_user() {
        Some(user) => {
            debug!(user_id = %user.id, path = %request.uri().path(), "Authenticated request");
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        None => {
            warn!(
                client_ip = %client_ip,
                path = %request.uri().path(),
                "Unauthenticated access attempt"
            );
            redirect_found("/login")
        }
    }
}
