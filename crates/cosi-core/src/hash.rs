//! SHA-512 helpers shared by key expansion, signing and cosigning

use crate::curve::Scalar;
use sha2::{Digest, Sha512};

/// SHA-512 over the concatenation of `parts`.
pub fn sha512(parts: &[&[u8]]) -> [u8; 64] {
    let mut hasher = Sha512::new();
    for part in parts {
        hasher.update(part);
    }
    let digest = hasher.finalize();

    let mut out = [0u8; 64];
    out.copy_from_slice(&digest);
    out
}

/// SHA-512 over `parts`, reduced modulo the group order.
pub fn hash_to_scalar(parts: &[&[u8]]) -> Scalar {
    Scalar::from_bytes_mod_order_wide(&sha512(parts))
}

/// EdDSA challenge `H(R || A || M) mod q`.
///
/// Single signatures and aggregate signatures use the same convention, with
/// `A` being the signer's key or the full aggregate key respectively.
pub fn challenge(r: &[u8; 32], public_key: &[u8; 32], message: &[u8]) -> Scalar {
    hash_to_scalar(&[r, public_key, message])
}
