//! Participant side of a cosigning round

use super::{NonceCommitment, PartialShare};
use crate::curve::{EdwardsPoint, Scalar};
use crate::{Error, KeyPair, PartyId, PublicKey, Result, SessionConfig};
use rand_core::{CryptoRng, RngCore};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Secret nonce r_i for one round.
///
/// Not `Clone`: [`Cosigner::respond`] consumes it, so a nonce cannot sign
/// two challenges.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct NonceSecret {
    r: Scalar,
}

impl std::fmt::Debug for NonceSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("NonceSecret(..)")
    }
}

/// Draw a nonce scalar from 64 random bytes reduced mod q.
///
/// Values 0 and 1 are redrawn, up to `max_attempts` draws in total.
pub fn draw_nonce<R: RngCore + CryptoRng>(rng: &mut R, max_attempts: usize) -> Result<Scalar> {
    let mut wide = [0u8; 64];
    for _ in 0..max_attempts {
        rng.fill_bytes(&mut wide);
        let r = Scalar::from_bytes_mod_order_wide(&wide);
        if !r.is_zero() && !r.is_one() {
            wide.zeroize();
            return Ok(r);
        }
    }
    wide.zeroize();
    Err(Error::NonceDegenerate {
        attempts: max_attempts,
    })
}

/// A participant holding its own key pair
#[derive(Debug, Clone)]
pub struct Cosigner {
    party_id: PartyId,
    keypair: KeyPair,
}

impl Cosigner {
    pub fn new(party_id: PartyId, keypair: KeyPair) -> Self {
        Self { party_id, keypair }
    }

    pub fn party_id(&self) -> PartyId {
        self.party_id
    }

    pub fn public_key(&self) -> &PublicKey {
        self.keypair.public_key()
    }

    /// Round 1: draw r_i and publish R_i = r_i·B.
    pub fn commit<R: RngCore + CryptoRng>(
        &self,
        config: &SessionConfig,
        rng: &mut R,
    ) -> Result<(NonceSecret, NonceCommitment)> {
        let r = draw_nonce(rng, config.max_nonce_attempts)?;
        let commitment = NonceCommitment {
            party_id: self.party_id,
            commitment: EdwardsPoint::mul_base(&r).compress(),
        };
        Ok((NonceSecret { r }, commitment))
    }

    /// Round 2: s_i = r_i + c·a_i.
    pub fn respond(&self, nonce: NonceSecret, challenge: &Scalar) -> PartialShare {
        let share = challenge.mul_add(self.keypair.expanded().scalar(), &nonce.r);
        PartialShare {
            party_id: self.party_id,
            share: share.to_bytes(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;

    /// Source that only ever yields zero bytes
    struct ZeroRng;

    impl RngCore for ZeroRng {
        fn next_u32(&mut self) -> u32 {
            0
        }

        fn next_u64(&mut self) -> u64 {
            0
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(0);
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> std::result::Result<(), rand_core::Error> {
            self.fill_bytes(dest);
            Ok(())
        }
    }

    impl CryptoRng for ZeroRng {}

    /// Yields one wide value of 1, then defers to a real generator
    struct OneThenRng {
        used: bool,
        inner: ChaCha20Rng,
    }

    impl RngCore for OneThenRng {
        fn next_u32(&mut self) -> u32 {
            self.inner.next_u32()
        }

        fn next_u64(&mut self) -> u64 {
            self.inner.next_u64()
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            if self.used {
                self.inner.fill_bytes(dest);
            } else {
                self.used = true;
                dest.fill(0);
                dest[0] = 1;
            }
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> std::result::Result<(), rand_core::Error> {
            self.fill_bytes(dest);
            Ok(())
        }
    }

    impl CryptoRng for OneThenRng {}

    #[test]
    fn test_degenerate_source_fails() {
        assert_eq!(
            draw_nonce(&mut ZeroRng, 16).err(),
            Some(Error::NonceDegenerate { attempts: 16 })
        );
    }

    #[test]
    fn test_degenerate_draw_is_retried() {
        let mut rng = OneThenRng {
            used: false,
            inner: ChaCha20Rng::from_seed([8u8; 32]),
        };
        let r = draw_nonce(&mut rng, 2).unwrap();
        assert!(rng.used);
        assert!(!r.is_zero() && !r.is_one());

        let mut rng = OneThenRng {
            used: false,
            inner: ChaCha20Rng::from_seed([8u8; 32]),
        };
        assert!(matches!(
            draw_nonce(&mut rng, 1),
            Err(Error::NonceDegenerate { attempts: 1 })
        ));
    }

    #[test]
    fn test_commit_uses_config_bound() {
        let mut rng = ChaCha20Rng::from_seed([2u8; 32]);
        let signer = Cosigner::new(0, KeyPair::generate(&mut rng));
        let config = SessionConfig::new(1, 1)
            .unwrap()
            .with_max_nonce_attempts(3)
            .unwrap();

        assert_eq!(
            signer.commit(&config, &mut ZeroRng).err(),
            Some(Error::NonceDegenerate { attempts: 3 })
        );
    }

    #[test]
    fn test_single_signer_share_is_schnorr() {
        let mut rng = ChaCha20Rng::from_seed([3u8; 32]);
        let signer = Cosigner::new(0, KeyPair::generate(&mut rng));
        let config = SessionConfig::new(1, 1).unwrap();

        let (nonce, commitment) = signer.commit(&config, &mut rng).unwrap();
        let challenge = Scalar::from(12345u64);
        let share = signer.respond(nonce, &challenge);

        let s = Scalar::from_canonical_bytes(share.share).unwrap();
        let r = EdwardsPoint::decompress(&commitment.commitment).unwrap();
        let a = signer.public_key().to_point().unwrap();
        assert_eq!(EdwardsPoint::mul_base(&s), &r + &(&a * &challenge));
        assert_eq!(share.party_id, 0);
    }
}
