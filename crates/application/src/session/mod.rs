//! Session lifecycle: login, logout, and keeping tokens fresh.

mod lifecycle;
mod outcome;

pub use lifecycle::SessionLifecycle;
pub use outcome::{Credentials, Freshness, LoginOutcome};
