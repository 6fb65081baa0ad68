//! Token handling for the session.
//!
//! This module provides:
//! - In-memory token storage shared by every component
//! - Claim decoding and expiry checks against the injected clock
//! - The single-flight refresh coordinator
//! - The requester that retries once after a refresh

mod codec;
mod context;
mod notices;
mod refresh;
mod requester;
mod token_store;

pub use codec::TokenCodec;
pub use context::SessionContext;
pub use notices::NoticeBoard;
pub use refresh::RefreshCoordinator;
pub use requester::AuthenticatedRequester;
pub use token_store::TokenStore;
