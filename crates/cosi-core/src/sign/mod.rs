//! Single-signer EdDSA module
//!
//! Deterministic Ed25519 signing and the standard verification equation
//! `s·B = R + c·A`, with `c = H(R || A || M) mod q`.

mod eddsa;

pub use eddsa::{sign, sign_expanded, verify, verify_batch, VerificationItem};
