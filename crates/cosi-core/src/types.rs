//! Core types for Ed25519 signing and cosigning sessions

use crate::curve::EdwardsPoint;
use crate::{Error, Result};
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Index of a participant in the ordered participant set
pub type PartyId = usize;

/// Unique identifier for a session
pub type SessionId = [u8; 32];

/// Length of a secret key, public key, or either half of a signature
pub const KEY_LENGTH: usize = 32;

/// Length of a single-signer signature
pub const SIGNATURE_LENGTH: usize = 64;

fn to_array(bytes: &[u8]) -> Result<[u8; KEY_LENGTH]> {
    bytes.try_into().map_err(|_| Error::InvalidLength {
        expected: KEY_LENGTH,
        actual: bytes.len(),
    })
}

/// 32-byte secret seed. Never used directly in arithmetic.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey([u8; KEY_LENGTH]);

impl SecretKey {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(Self(to_array(bytes)?))
    }

    /// Draw a fresh seed from a cryptographically secure source.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut seed = [0u8; KEY_LENGTH];
        rng.fill_bytes(&mut seed);
        Self(seed)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.0
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(..)")
    }
}

/// Compressed curve point used as a verification key
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "[u8; KEY_LENGTH]", into = "[u8; KEY_LENGTH]")]
pub struct PublicKey([u8; KEY_LENGTH]);

impl PublicKey {
    /// Parse and validate a compressed point.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let encoded = to_array(bytes)?;
        EdwardsPoint::decompress(&encoded)?;
        Ok(Self(encoded))
    }

    pub fn from_point(point: &EdwardsPoint) -> Self {
        Self(point.compress())
    }

    pub fn to_bytes(&self) -> [u8; KEY_LENGTH] {
        self.0
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.0
    }

    /// Decompress into a curve point.
    pub fn to_point(&self) -> Result<EdwardsPoint> {
        EdwardsPoint::decompress(&self.0)
    }
}

impl TryFrom<[u8; KEY_LENGTH]> for PublicKey {
    type Error = Error;

    fn try_from(bytes: [u8; KEY_LENGTH]) -> Result<Self> {
        Self::from_bytes(&bytes)
    }
}

impl From<PublicKey> for [u8; KEY_LENGTH] {
    fn from(key: PublicKey) -> Self {
        key.0
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", hex::encode(self.0))
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// EdDSA signature (R, s)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    /// Compressed commitment point R
    pub r: [u8; 32],
    /// Response scalar s, little-endian
    pub s: [u8; 32],
}

impl Signature {
    pub fn new(r: [u8; 32], s: [u8; 32]) -> Self {
        Self { r, s }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != SIGNATURE_LENGTH {
            return Err(Error::InvalidLength {
                expected: SIGNATURE_LENGTH,
                actual: bytes.len(),
            });
        }
        Ok(Self {
            r: to_array(&bytes[..32])?,
            s: to_array(&bytes[32..])?,
        })
    }

    /// Convert to bytes (R || s)
    pub fn to_bytes(&self) -> [u8; SIGNATURE_LENGTH] {
        let mut bytes = [0u8; SIGNATURE_LENGTH];
        bytes[..32].copy_from_slice(&self.r);
        bytes[32..].copy_from_slice(&self.s);
        bytes
    }
}

/// Configuration for a cosigning session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawSessionConfig")]
pub struct SessionConfig {
    /// Session identifier, used to correlate log output
    pub session_id: SessionId,

    /// Minimum number of participants that must contribute
    pub threshold: usize,

    /// Nonce draws allowed before giving up on a degenerate source
    pub max_nonce_attempts: usize,
}

impl SessionConfig {
    /// Create a new session configuration for `n_parties` participants
    pub fn new(n_parties: usize, threshold: usize) -> Result<Self> {
        if n_parties == 0 {
            return Err(Error::InvalidConfig(
                "Participant set cannot be empty".into(),
            ));
        }
        if threshold == 0 {
            return Err(Error::InvalidConfig(
                "Threshold must be at least 1".into(),
            ));
        }
        if threshold > n_parties {
            return Err(Error::InvalidConfig(
                "Threshold cannot exceed number of parties".into(),
            ));
        }

        Ok(Self {
            session_id: rand::random(),
            threshold,
            max_nonce_attempts: crate::MAX_NONCE_ATTEMPTS,
        })
    }

    /// Override the nonce retry bound
    pub fn with_max_nonce_attempts(mut self, attempts: usize) -> Result<Self> {
        if attempts == 0 {
            return Err(Error::InvalidConfig(
                "At least one nonce attempt is required".into(),
            ));
        }
        self.max_nonce_attempts = attempts;
        Ok(self)
    }
}

#[derive(Deserialize)]
struct RawSessionConfig {
    session_id: SessionId,
    threshold: usize,
    max_nonce_attempts: usize,
}

impl TryFrom<RawSessionConfig> for SessionConfig {
    type Error = Error;

    fn try_from(raw: RawSessionConfig) -> Result<Self> {
        if raw.threshold == 0 {
            return Err(Error::InvalidConfig(
                "Threshold must be at least 1".into(),
            ));
        }
        Self {
            session_id: raw.session_id,
            threshold: raw.threshold,
            max_nonce_attempts: crate::MAX_NONCE_ATTEMPTS,
        }
        .with_max_nonce_attempts(raw.max_nonce_attempts)
    }
}
