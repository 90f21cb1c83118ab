//! # CoSi Core
//!
//! Ed25519 arithmetic and collective (threshold) Schnorr signing.
//!
//! This crate provides the fundamental building blocks for:
//! - Field, scalar and point arithmetic on the Ed25519 curve
//! - Key expansion, single-signer EdDSA sign and verify
//! - Collective signing with an absentee bitmask
//!
//! ## Protocol Overview
//!
//! A quorum of participants signs a message under the aggregate key
//! `A = Σ A_i`. Participants that did not contribute are marked in a
//! bitmask `Z` and subtracted from `A` before verification:
//! - Each quorum member commits a fresh nonce point `R_i = r_i·B`
//! - The challenge is `c = H(R || A || M)` over the full aggregate key
//! - Partial shares `s_i = r_i + c·a_i` sum to the response `s`
//! - Verifiers check `8·s·B = 8·R + 8·c·(A - Σ_{Z_i=1} A_i)`
//!
//! ## Example
//!
//! ```rust,ignore
//! use cosi_core::{cosign, KeyPair, SessionConfig};
//!
//! let config = SessionConfig::new(participants.len(), 2)?;
//! let signature = cosign::run_cosign(&config, &participants, &signers, b"Hello", &mut OsRng)?;
//!
//! assert!(cosign::verify_aggregate(&participants, &aggregate, b"Hello", &signature.to_bytes()));
//! ```

pub mod cosign;
pub mod curve;
pub mod error;
pub mod hash;
pub mod keygen;
pub mod sign;
pub mod types;

pub use error::{Error, Result};
pub use keygen::{ExpandedKey, KeyPair};
pub use types::{
    PartyId, PublicKey, SecretKey, SessionConfig, SessionId, Signature, KEY_LENGTH,
    SIGNATURE_LENGTH,
};

/// Protocol version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default threshold for a 3-party setup
pub const DEFAULT_THRESHOLD: usize = 2;

/// Default number of parties
pub const DEFAULT_PARTIES: usize = 3;

/// Nonce draws before a session gives up with `NonceDegenerate`
pub const MAX_NONCE_ATTEMPTS: usize = 16;
