//! Authentication domain types

mod claims;
mod types;

pub use claims::Claims;
pub use types::{EnableTotp, Msg, NewTotp, RecoveryAck, TokenPair, WebToken};
