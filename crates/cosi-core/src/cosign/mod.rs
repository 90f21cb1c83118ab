//! Collective signing module
//!
//! Implements the two-round cosigning protocol: quorum members commit nonce
//! points, then answer the shared challenge with partial shares. The emitted
//! signature carries a bitmask of absent participants whose keys verifiers
//! subtract from the aggregate key.

mod bitmask;
mod messages;
mod participants;
mod session;
mod signer;
mod verify;

pub use bitmask::AbsenteeBitmask;
pub use messages::*;
pub use participants::ParticipantSet;
pub use session::{run_cosign, CosignSession};
pub use signer::{draw_nonce, Cosigner, NonceSecret};
pub use verify::{reduced_key, verify_aggregate, verify_full_key};

/// Aggregator session lifecycle
///
/// States advance strictly in declaration order. `Abandoned` is reachable
/// from any state. `Emitted` and `Abandoned` are terminal: a session in
/// either rejects every further operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Initialized,
    KeysAggregated,
    NonceCommitted,
    CommitmentAggregated,
    ChallengeComputed,
    PartialSharesComputed,
    Combined,
    BitmaskSet,
    ReducedKeyComputed,
    Emitted,
    Abandoned,
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Initialized => "Initialized",
            SessionState::KeysAggregated => "KeysAggregated",
            SessionState::NonceCommitted => "NonceCommitted",
            SessionState::CommitmentAggregated => "CommitmentAggregated",
            SessionState::ChallengeComputed => "ChallengeComputed",
            SessionState::PartialSharesComputed => "PartialSharesComputed",
            SessionState::Combined => "Combined",
            SessionState::BitmaskSet => "BitmaskSet",
            SessionState::ReducedKeyComputed => "ReducedKeyComputed",
            SessionState::Emitted => "Emitted",
            SessionState::Abandoned => "Abandoned",
        }
    }

    /// Whether no further operation may run
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Emitted | SessionState::Abandoned)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
