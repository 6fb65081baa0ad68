//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the application core and external systems.
//! Each port is a trait that can be implemented by adapters in the infrastructure layer.

mod clock;
mod http_transport;
mod session_repository;

pub use clock::Clock;
pub use http_transport::HttpTransport;
pub use session_repository::{SessionRepository, SessionStoreError};
