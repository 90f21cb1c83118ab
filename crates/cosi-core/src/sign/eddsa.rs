//! EdDSA sign and verify

use crate::curve::{EdwardsPoint, Scalar};
use crate::hash::{challenge, hash_to_scalar};
use crate::keygen::{expand, ExpandedKey, KeyPair};
use crate::{Error, PublicKey, Result, SecretKey, Signature};
use tracing::debug;

/// Sign `message` with a seed.
pub fn sign(secret: &SecretKey, message: &[u8]) -> Signature {
    let expanded = expand(secret);
    let public = PublicKey::from_point(&expanded.public_point());
    sign_expanded(&expanded, &public, message)
}

/// Sign with an already expanded key and its public key.
///
/// `r = H(prefix || M)`, `R = r·B`, `s = r + H(R || A || M)·a`.
pub fn sign_expanded(expanded: &ExpandedKey, public: &PublicKey, message: &[u8]) -> Signature {
    let r = hash_to_scalar(&[&expanded.nonce_prefix, message]);
    let big_r = EdwardsPoint::mul_base(&r).compress();
    let c = challenge(&big_r, public.as_bytes(), message);
    let s = c.mul_add(&expanded.scalar, &r);
    Signature::new(big_r, s.to_bytes())
}

impl KeyPair {
    pub fn sign(&self, message: &[u8]) -> Signature {
        sign_expanded(self.expanded(), self.public_key(), message)
    }
}

/// Verify a signature over `message`.
///
/// Malformed keys or signatures of any kind yield `false`; this function is
/// safe to call on untrusted bytes.
pub fn verify(public_key: &[u8], message: &[u8], signature: &[u8]) -> bool {
    match check(public_key, message, signature) {
        Ok(()) => true,
        Err(e) => {
            debug!(error = %e, "Signature rejected");
            false
        }
    }
}

fn check(public_key: &[u8], message: &[u8], signature: &[u8]) -> Result<()> {
    let a = EdwardsPoint::decompress(public_key)?;
    let sig = Signature::from_bytes(signature)?;
    let r = EdwardsPoint::decompress(&sig.r)?;
    let s = Scalar::from_canonical_bytes(sig.s)?;

    let mut encoded_key = [0u8; 32];
    encoded_key.copy_from_slice(public_key);
    let c = challenge(&sig.r, &encoded_key, message);

    if EdwardsPoint::mul_base(&s) != &r + &(&a * &c) {
        return Err(Error::VerificationFailed("group equation mismatch".into()));
    }
    Ok(())
}

/// One entry of a verification batch
#[derive(Debug, Clone, Copy)]
pub struct VerificationItem<'a> {
    pub public_key: &'a [u8],
    pub message: &'a [u8],
    pub signature: &'a [u8],
}

/// Verify independent signatures, one result per item.
pub fn verify_batch(items: &[VerificationItem<'_>]) -> Vec<bool> {
    #[cfg(feature = "multi-thread")]
    {
        use rayon::prelude::*;
        items
            .par_iter()
            .map(|item| verify(item.public_key, item.message, item.signature))
            .collect()
    }

    #[cfg(not(feature = "multi-thread"))]
    {
        items
            .iter()
            .map(|item| verify(item.public_key, item.message, item.signature))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keygen::derive_public;
    use ed25519_dalek::{Signer, SigningKey};
    use rand_chacha::ChaCha20Rng;
    use rand_core::{RngCore, SeedableRng};

    const RFC8032_VECTORS: [(&str, &str, &str, &str); 2] = [
        (
            "9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60",
            "d75a980182b10ab7d54bfed3c964073a0ee172f3daa62325af021a68f707511a",
            "",
            "e5564300c360ac729086e2cc806e828a84877f1eb8e5d974d873e06522490155\
             5fb8821590a33bacc61e39701cf9b46bd25bf5f0595bbe24655141438e7a100b",
        ),
        (
            "4ccd089b28ff96da9db6c346ec114e0f5b8a319f35aba624da8cf6ed4fb8a6fb",
            "3d4017c3e843895a92b70aa74d1b7ebc9c982ccf2ec4968cc0cd55f12af4660c",
            "72",
            "92a009a9f0d4cab8720e820b5f642540a2b27b5416503f8fb3762223ebdb69da\
             085ac1e43e15996e458f3613d0f11d8c387b2eaeb4302aeeb00d291612bb0c00",
        ),
    ];

    fn secret_from_hex(s: &str) -> SecretKey {
        SecretKey::from_bytes(&hex::decode(s).unwrap()).unwrap()
    }

    #[test]
    fn test_rfc8032_vectors() {
        for (seed, public, message, expected) in RFC8032_VECTORS {
            let secret = secret_from_hex(seed);
            let message = hex::decode(message).unwrap();
            let signature = sign(&secret, &message);

            assert_eq!(hex::encode(signature.to_bytes()), expected);
            let public = hex::decode(public).unwrap();
            assert!(verify(&public, &message, &signature.to_bytes()));
        }
    }

    #[test]
    fn test_matches_ed25519_dalek() {
        let mut rng = ChaCha20Rng::from_seed([42u8; 32]);
        for len in [0usize, 1, 5, 64, 200] {
            let mut seed = [0u8; 32];
            rng.fill_bytes(&mut seed);
            let mut message = vec![0u8; len];
            rng.fill_bytes(&mut message);

            let reference = SigningKey::from_bytes(&seed);
            let secret = SecretKey::from_bytes(&seed).unwrap();

            assert_eq!(
                derive_public(&secret).to_bytes(),
                reference.verifying_key().to_bytes()
            );
            assert_eq!(
                sign(&secret, &message).to_bytes(),
                reference.sign(&message).to_bytes()
            );
        }
    }

    #[test]
    fn test_sign_verify_roundtrip() {
        let mut rng = ChaCha20Rng::from_seed([1u8; 32]);
        for i in 0..8 {
            let pair = KeyPair::generate(&mut rng);
            let message = format!("message number {}", i);
            let signature = pair.sign(message.as_bytes());
            assert_eq!(signature, sign(pair.secret(), message.as_bytes()));
            assert!(verify(
                pair.public_key().as_bytes(),
                message.as_bytes(),
                &signature.to_bytes()
            ));
        }
    }

    #[test]
    fn test_bit_flips_invalidate() {
        let secret = secret_from_hex(RFC8032_VECTORS[0].0);
        let public = derive_public(&secret);
        let message = b"Hello";
        let signature = sign(&secret, message).to_bytes();

        for bit in (0..512).step_by(7) {
            let mut mutated = signature;
            mutated[bit / 8] ^= 1 << (bit % 8);
            assert!(
                !verify(public.as_bytes(), message, &mutated),
                "flipping bit {} still verified",
                bit
            );
        }

        assert!(!verify(public.as_bytes(), b"Hellp", &signature));
    }

    #[test]
    fn test_wrong_key_rejected() {
        let secret = secret_from_hex(RFC8032_VECTORS[0].0);
        let other = derive_public(&secret_from_hex(RFC8032_VECTORS[1].0));
        let signature = sign(&secret, b"Hello").to_bytes();
        assert!(!verify(other.as_bytes(), b"Hello", &signature));
    }

    #[test]
    fn test_malformed_input_returns_false() {
        let secret = secret_from_hex(RFC8032_VECTORS[0].0);
        let public = derive_public(&secret);
        let signature = sign(&secret, b"Hello").to_bytes();

        assert!(!verify(&public.as_bytes()[..31], b"Hello", &signature));
        assert!(!verify(public.as_bytes(), b"Hello", &signature[..63]));
        assert!(!verify(public.as_bytes(), b"Hello", &[0u8; 65]));

        let mut off_curve = [0u8; 32];
        off_curve[0] = 2;
        assert!(!verify(&off_curve, b"Hello", &signature));

        let mut bad_r = signature;
        bad_r[..32].copy_from_slice(&off_curve);
        assert!(!verify(public.as_bytes(), b"Hello", &bad_r));
    }

    #[test]
    fn test_non_canonical_s_rejected() {
        let secret = secret_from_hex(RFC8032_VECTORS[0].0);
        let public = derive_public(&secret);
        let signature = sign(&secret, b"Hello").to_bytes();

        // s + q encodes the same residue but must be refused
        let q: [u8; 32] = {
            let mut bytes = [0u8; 32];
            bytes[..16].copy_from_slice(&hex::decode("edd3f55c1a631258d69cf7a2def9de14").unwrap());
            bytes[31] = 0x10;
            bytes
        };
        let mut mutated = signature;
        let mut carry = 0u16;
        for i in 0..32 {
            let sum = mutated[32 + i] as u16 + q[i] as u16 + carry;
            mutated[32 + i] = sum as u8;
            carry = sum >> 8;
        }
        assert_eq!(carry, 0);
        assert!(!verify(public.as_bytes(), b"Hello", &mutated));
    }

    #[test]
    fn test_verify_batch() {
        let mut rng = ChaCha20Rng::from_seed([9u8; 32]);
        let pairs: Vec<KeyPair> = (0..4).map(|_| KeyPair::generate(&mut rng)).collect();
        let signatures: Vec<[u8; 64]> = pairs
            .iter()
            .map(|pair| pair.sign(b"batch").to_bytes())
            .collect();

        let mut items: Vec<VerificationItem<'_>> = pairs
            .iter()
            .zip(signatures.iter())
            .map(|(pair, signature)| VerificationItem {
                public_key: pair.public_key().as_bytes(),
                message: b"batch",
                signature,
            })
            .collect();
        items[2].message = b"tampered";

        assert_eq!(verify_batch(&items), vec![true, true, false, true]);
    }
}
