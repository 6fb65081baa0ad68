//! Tokenwarden Application - Session core and ports
//!
//! This crate defines the application layer with:
//! - Port traits (transport, clock, session persistence)
//! - Token storage, decoding and single-flight refresh
//! - The authenticated requester and the backend endpoint catalogue
//! - Session lifecycle orchestration

pub mod api;
pub mod auth;
pub mod ports;
pub mod session;

#[cfg(test)]
pub(crate) mod test_support;

pub use api::BackendApi;
pub use auth::{
    AuthenticatedRequester, NoticeBoard, RefreshCoordinator, SessionContext, TokenCodec,
    TokenStore,
};
pub use ports::{Clock, HttpTransport, SessionRepository, SessionStoreError};
pub use session::{Credentials, Freshness, LoginOutcome, SessionLifecycle};
