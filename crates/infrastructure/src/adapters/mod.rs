//! Adapter implementations for application ports.

mod reqwest_transport;
mod system_clock;

pub use reqwest_transport::ReqwestTransport;
pub use system_clock::SystemClock;
