//! Key derivation module
//!
//! Expands a 32-byte seed into the clamped signing scalar and the nonce
//! prefix, and derives the matching public key.

mod expand;

pub use expand::{derive_public, expand};

use crate::curve::{EdwardsPoint, Scalar};
use crate::{PublicKey, SecretKey};
use rand_core::{CryptoRng, RngCore};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Secret material derived from a seed: `(a, prefix)`
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct ExpandedKey {
    /// Clamped scalar a (bits 0-2 and 255 clear, bit 254 set)
    pub(crate) scalar: Scalar,
    /// Second half of the expansion hash, input to per-message nonces
    pub(crate) nonce_prefix: [u8; 32],
}

impl ExpandedKey {
    pub fn scalar(&self) -> &Scalar {
        &self.scalar
    }

    pub fn nonce_prefix(&self) -> &[u8; 32] {
        &self.nonce_prefix
    }

    /// Public point a·B
    pub fn public_point(&self) -> EdwardsPoint {
        EdwardsPoint::mul_base(&self.scalar)
    }
}

/// Seed, expanded key and public key held together
#[derive(Clone)]
pub struct KeyPair {
    secret: SecretKey,
    expanded: ExpandedKey,
    public: PublicKey,
}

impl KeyPair {
    pub fn from_secret(secret: SecretKey) -> Self {
        let expanded = expand(&secret);
        let public = PublicKey::from_point(&expanded.public_point());
        Self {
            secret,
            expanded,
            public,
        }
    }

    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self::from_secret(SecretKey::generate(rng))
    }

    pub fn secret(&self) -> &SecretKey {
        &self.secret
    }

    pub fn expanded(&self) -> &ExpandedKey {
        &self.expanded
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}
