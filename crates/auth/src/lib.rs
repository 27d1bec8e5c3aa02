//! `echoledger-auth`: actor identity boundary.
//!
//! Turns a bearer token into an authenticated `ActorId`. The ledger itself
//! only compares identities that have already passed through here.

pub mod claims;
pub mod jwt;

pub use claims::{ActorClaims, TokenValidationError, validate_claims};
pub use jwt::{Hs256JwtValidator, JwtValidator};
