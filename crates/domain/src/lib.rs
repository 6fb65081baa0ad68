//! Tokenwarden Domain - Core authentication types
//!
//! This crate defines the domain model for the Tokenwarden client:
//! tokens and their claims, user profiles, backend request/response
//! shapes, errors and notices. All types here are pure Rust with no I/O
//! dependencies.

pub mod auth;
pub mod config;
pub mod error;
pub mod notice;
pub mod request;
pub mod response;
pub mod session;
pub mod user;

mod wire;

pub use auth::{Claims, EnableTotp, Msg, NewTotp, RecoveryAck, TokenPair, WebToken};
pub use config::{ClientConfig, DEFAULT_API_URL};
pub use error::{AuthError, AuthResult};
pub use notice::{Notice, NoticeLevel};
pub use request::{ApiRequest, Header, Headers, HttpMethod, RequestBody};
pub use response::ApiResponse;
pub use session::SessionState;
pub use user::{UserProfile, UserProfileCreate, UserProfileUpdate};
