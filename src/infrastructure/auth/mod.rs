//! Token minting and verification
//!
//! [`TokenFactory`] signs tokens with the private half of a key set,
//! [`TokenVerifier`] checks them against the public half and [`JwtBundle`]
//! builds both from configuration.

mod bundle;
mod clock;
mod factory;
mod verifier;

pub use bundle::JwtBundle;
pub use clock::{Clock, FixedClock, IdGenerator, SequentialIdGenerator, SystemClock, UuidGenerator};
pub use factory::TokenFactory;
pub use verifier::{TokenRejection, TokenVerifier};
