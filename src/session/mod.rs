//! # Session Module
//!
//! Cookie-backed sessions. The server keeps no session state: everything lives
//! in an encrypted cookie scoped to one browser.
//!
//! - `codec`: cookie encryption, expiry and Set-Cookie attributes
//! - `store`: the request-scoped [`Session`] handle and its typed accessors
//! - `middleware`: attaches a session to each request

pub mod codec;
pub mod middleware;
pub mod store;

#[cfg(test)]
mod tests;

use thiserror::Error;

pub use codec::{SessionCodec, SessionData, SESSION_COOKIE_NAME};
pub use middleware::session_middleware;
pub use store::{FlashKind, FlashMessages, Session};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session payload could not be serialized: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("session cookie could not be sealed")]
    Seal,

    #[error("session cookie failed authentication")]
    Decrypt,

    #[error("session has expired")]
    Expired,

    #[error("encoded session is {0} bytes, over the cookie size limit")]
    CookieTooLarge(usize),
}
