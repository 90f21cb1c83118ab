//! Cosigning message types

use super::AbsenteeBitmask;
use crate::{Error, PartyId, Result, Signature, SIGNATURE_LENGTH};
use serde::{Deserialize, Serialize};

/// Round 1 message: nonce commitment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonceCommitment {
    /// Sender party ID
    pub party_id: PartyId,
    /// Compressed R_i = r_i·B
    pub commitment: [u8; 32],
}

/// Round 2 message: partial share of the response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialShare {
    /// Sender party ID
    pub party_id: PartyId,
    /// s_i = r_i + c·a_i, little-endian
    pub share: [u8; 32],
}

/// Collective signature `R || s || Z`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateSignature {
    /// Compressed aggregate commitment R
    pub r: [u8; 32],
    /// Combined response s
    pub s: [u8; 32],
    /// Participants that did not sign
    pub bitmask: AbsenteeBitmask,
}

impl AggregateSignature {
    /// Encoded length for a set of `n_parties`
    pub fn encoded_len(n_parties: usize) -> usize {
        SIGNATURE_LENGTH + AbsenteeBitmask::byte_len(n_parties)
    }

    /// The `R || s` half, an ordinary EdDSA signature when nobody is absent
    pub fn signature(&self) -> Signature {
        Signature::new(self.r, self.s)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(SIGNATURE_LENGTH + self.bitmask.as_bytes().len());
        bytes.extend_from_slice(&self.r);
        bytes.extend_from_slice(&self.s);
        bytes.extend_from_slice(self.bitmask.as_bytes());
        bytes
    }

    /// Parse a signature produced for `n_parties` participants.
    pub fn from_bytes(bytes: &[u8], n_parties: usize) -> Result<Self> {
        let expected = Self::encoded_len(n_parties);
        if bytes.len() != expected {
            return Err(Error::InvalidLength {
                expected,
                actual: bytes.len(),
            });
        }

        let signature = Signature::from_bytes(&bytes[..SIGNATURE_LENGTH])?;
        Ok(Self {
            r: signature.r,
            s: signature.s,
            bitmask: AbsenteeBitmask::from_bytes(&bytes[SIGNATURE_LENGTH..], n_parties)?,
        })
    }
}
