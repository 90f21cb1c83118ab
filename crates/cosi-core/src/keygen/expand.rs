//! Seed expansion and public key derivation

use super::ExpandedKey;
use crate::curve::Scalar;
use crate::hash::sha512;
use crate::{PublicKey, SecretKey};
use zeroize::Zeroize;

/// Expand a seed: `h = SHA-512(seed)`, `a = clamp(h[..32])`, `prefix = h[32..]`.
pub fn expand(secret: &SecretKey) -> ExpandedKey {
    let mut digest = sha512(&[secret.as_bytes()]);

    let mut scalar_bytes = [0u8; 32];
    scalar_bytes.copy_from_slice(&digest[..32]);
    let mut nonce_prefix = [0u8; 32];
    nonce_prefix.copy_from_slice(&digest[32..]);

    let expanded = ExpandedKey {
        scalar: Scalar::from_clamped(scalar_bytes),
        nonce_prefix,
    };

    digest.zeroize();
    scalar_bytes.zeroize();
    nonce_prefix.zeroize();
    expanded
}

/// Compressed public key `a·B` for a seed.
pub fn derive_public(secret: &SecretKey) -> PublicKey {
    PublicKey::from_point(&expand(secret).public_point())
}
