//! Error types for Ed25519 and collective signing operations

use crate::PartyId;
use thiserror::Error;

/// Result type alias for cosigning operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during key handling, arithmetic or a signing session
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Wrong byte count for a key, point or signature
    #[error("Invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// Encoded field element or scalar is out of range
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(&'static str),

    /// Decompression found no valid x-coordinate
    #[error("Point is not on the curve")]
    PointNotOnCurve,

    /// Field inverse of zero requested
    #[error("Division by zero")]
    DivisionByZero,

    /// Participant index outside the participant set
    #[error("Unknown participant: {0}")]
    UnknownParticipant(PartyId),

    /// Nonce regeneration exhausted its retries
    #[error("Nonce degenerate after {attempts} attempts")]
    NonceDegenerate { attempts: usize },

    /// Invalid session configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Threshold requirements not met
    #[error("Threshold not met: required {required}, got {actual}")]
    ThresholdNotMet { required: usize, actual: usize },

    /// Participant contributed twice to the same round
    #[error("Duplicate contribution from participant {0}")]
    DuplicateParticipant(PartyId),

    /// Partial share from a participant that did not commit a nonce
    #[error("Participant {0} is not part of the signing quorum")]
    NotInQuorum(PartyId),

    /// Quorum member whose partial share never arrived
    #[error("Missing partial share from participant {0}")]
    MissingShare(PartyId),

    /// Partial share failed its consistency check
    #[error("Invalid partial share from participant {0}")]
    InvalidShare(PartyId),

    /// Session operation attempted out of order
    #[error("Invalid session state: expected {expected}, got {actual}")]
    InvalidState {
        expected: &'static str,
        actual: &'static str,
    },

    /// Session already failed and cannot be resumed
    #[error("Session abandoned")]
    SessionAbandoned,

    /// Self-check of the emitted signature failed
    #[error("Verification failed: {0}")]
    VerificationFailed(String),
}
