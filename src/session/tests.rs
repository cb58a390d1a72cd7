//! Tests for session module
//!
//! These tests verify the session lifecycle:
//! - Typed accessors for user, state token and flashes
//! - Cookie round trip through the attachment middleware

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::auth::models::LoggedInUser;
    use crate::common::config::SessionConfig;
    use axum::{
        body::Body,
        extract::Extension,
        http::{header, Request, StatusCode},
        middleware,
        routing::get,
        Router,
    };
    use axum_extra::extract::cookie::SameSite;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn codec() -> Arc<SessionCodec> {
        Arc::new(SessionCodec::new(SessionConfig {
            secret: "session-tests-secret-0123456789abcdef".to_string(),
            max_age: 3600,
            http_only: true,
            secure: false,
            same_site: SameSite::Strict,
        }))
    }

    fn user(id: &str, email: &str) -> LoggedInUser {
        LoggedInUser {
            id: id.to_string(),
            email: email.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_login_then_logout() {
        let session = Session::new(SessionData::default(), codec());
        assert!(!session.is_logged_in());

        session.set_logged_in_user(&user("u1", "a@b.com")).unwrap();
        assert!(session.is_logged_in());
        assert_eq!(session.logged_in_user().unwrap().email, "a@b.com");

        session.delete_logged_in_user().unwrap();
        assert!(!session.is_logged_in());
        assert!(session.logged_in_user().is_none());
    }

    #[test]
    fn test_user_without_id_is_not_logged_in() {
        let session = Session::new(SessionData::default(), codec());
        session.set_logged_in_user(&user("", "a@b.com")).unwrap();
        assert!(!session.is_logged_in());
    }

    #[test]
    fn test_state_token_lifecycle() {
        let session = Session::new(SessionData::default(), codec());
        assert_eq!(session.state_token(), "");

        session.set_state_token("abc").unwrap();
        assert_eq!(session.state_token(), "abc");

        session.delete_state_token().unwrap();
        assert_eq!(session.state_token(), "");
    }

    #[test]
    fn test_flash_is_read_once() {
        let session = Session::new(SessionData::default(), codec());
        session.set_flash(FlashKind::Error, "Login failed").unwrap();
        session.set_flash(FlashKind::Info, "Welcome").unwrap();

        assert_eq!(session.take_flash(FlashKind::Error).as_deref(), Some("Login failed"));
        assert_eq!(session.take_flash(FlashKind::Error), None);

        let all = session.take_all_flashes();
        assert_eq!(all.info.as_deref(), Some("Welcome"));
        assert!(all.error.is_none());
        assert!(session.take_all_flashes().is_empty());
    }

    #[test]
    fn test_every_save_queues_a_cookie() {
        let session = Session::new(SessionData::default(), codec());
        assert!(session.take_pending_cookie().is_none());

        session.set_state_token("abc").unwrap();
        assert!(session.take_pending_cookie().is_some());
        assert!(session.take_pending_cookie().is_none());

        // Reading with nothing pending does not save
        assert!(session.take_all_flashes().is_empty());
        assert!(session.take_pending_cookie().is_none());
    }

    #[test]
    fn test_oversized_save_is_an_error() {
        let session = Session::new(SessionData::default(), codec());
        let result = session.set_flash(FlashKind::Info, &"x".repeat(5000));
        assert!(matches!(result, Err(SessionError::CookieTooLarge(_))));
        assert!(session.take_pending_cookie().is_none());
        assert!(session.take_flash(FlashKind::Info).is_none());

        let big_name = LoggedInUser {
            name: "x".repeat(5000),
            ..user("u1", "a@b.com")
        };
        assert!(session.set_logged_in_user(&big_name).is_err());
        assert!(!session.is_logged_in());
    }

    async fn login(session: Session) -> StatusCode {
        match session.set_logged_in_user(&user("u1", "a@b.com")) {
            Ok(()) => StatusCode::OK,
            Err(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    async fn whoami(session: Session) -> String {
        session
            .logged_in_user()
            .map(|u| u.email)
            .unwrap_or_else(|| "anonymous".to_string())
    }

    fn app(codec: Arc<SessionCodec>) -> Router {
        Router::new()
            .route("/login", get(login))
            .route("/whoami", get(whoami))
            .layer(middleware::from_fn(session_middleware))
            .layer(Extension(codec))
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_cookie_round_trip_through_middleware() {
        let codec = codec();

        let response = app(codec.clone())
            .oneshot(Request::get("/login").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .expect("session cookie")
            .to_str()
            .unwrap()
            .to_string();
        assert!(set_cookie.starts_with("session="));
        assert!(set_cookie.contains("HttpOnly"));
        assert!(set_cookie.contains("SameSite=Strict"));

        let cookie_pair = set_cookie.split(';').next().unwrap().to_string();
        let response = app(codec)
            .oneshot(
                Request::get("/whoami")
                    .header(header::COOKIE, cookie_pair)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(response.headers().get(header::SET_COOKIE).is_none());
        assert_eq!(body_string(response).await, "a@b.com");
    }

    #[tokio::test]
    async fn test_garbage_cookie_gives_empty_session() {
        let response = app(codec())
            .oneshot(
                Request::get("/whoami")
                    .header(header::COOKIE, "session=garbage")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "anonymous");
    }
}
