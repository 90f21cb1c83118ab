//! Aggregator session and the in-process cosigning driver

use super::verify::cofactored_equation;
use super::{
    AbsenteeBitmask, AggregateSignature, Cosigner, NonceCommitment, NonceSecret, ParticipantSet,
    PartialShare, SessionState,
};
use crate::curve::{EdwardsPoint, Scalar};
use crate::hash::challenge;
use crate::{Error, PartyId, PublicKey, Result, SessionConfig};
use rand_core::{CryptoRng, RngCore};
use std::collections::BTreeMap;
use tracing::{debug, info, instrument, warn};

/// Collects commitments and partial shares for one message and emits the
/// collective signature.
///
/// Holds public data only. Each operation is valid in exactly the state the
/// previous one left behind; any failure abandons the session for good.
#[derive(Debug)]
pub struct CosignSession {
    config: SessionConfig,
    participants: ParticipantSet,
    message: Vec<u8>,
    state: SessionState,
    aggregate: EdwardsPoint,
    aggregate_bytes: [u8; 32],
    commitments: BTreeMap<PartyId, EdwardsPoint>,
    commitment: EdwardsPoint,
    commitment_bytes: [u8; 32],
    challenge: Scalar,
    shares: BTreeMap<PartyId, Scalar>,
    response: Scalar,
    bitmask: AbsenteeBitmask,
    reduced: EdwardsPoint,
}

impl CosignSession {
    pub fn new(config: SessionConfig, participants: ParticipantSet, message: &[u8]) -> Result<Self> {
        if config.threshold == 0 || config.threshold > participants.len() {
            return Err(Error::InvalidConfig(
                "Threshold must be between 1 and the number of participants".into(),
            ));
        }

        debug!(
            session = %hex::encode(config.session_id),
            participants = participants.len(),
            threshold = config.threshold,
            "Session initialized"
        );

        let n = participants.len();
        Ok(Self {
            config,
            participants,
            message: message.to_vec(),
            state: SessionState::Initialized,
            aggregate: EdwardsPoint::IDENTITY,
            aggregate_bytes: [0u8; 32],
            commitments: BTreeMap::new(),
            commitment: EdwardsPoint::IDENTITY,
            commitment_bytes: [0u8; 32],
            challenge: Scalar::ZERO,
            shares: BTreeMap::new(),
            response: Scalar::ZERO,
            bitmask: AbsenteeBitmask::new(n),
            reduced: EdwardsPoint::IDENTITY,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn participants(&self) -> &ParticipantSet {
        &self.participants
    }

    /// Participants that committed a nonce, ascending
    pub fn quorum(&self) -> Vec<PartyId> {
        self.commitments.keys().copied().collect()
    }

    /// Drop the session; later calls fail with `SessionAbandoned`.
    pub fn abandon(&mut self) {
        if self.state != SessionState::Abandoned {
            warn!(
                session = %hex::encode(self.config.session_id),
                state = self.state.name(),
                "Session abandoned"
            );
            self.state = SessionState::Abandoned;
        }
    }

    /// Run `op` if the session is in one of `allowed`, abandoning on failure.
    ///
    /// Terminal sessions reject every operation and keep their state.
    fn step<T>(
        &mut self,
        allowed: &[SessionState],
        op: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        if self.state.is_terminal() {
            return Err(match self.state {
                SessionState::Abandoned => Error::SessionAbandoned,
                _ => Error::InvalidState {
                    expected: allowed[0].name(),
                    actual: self.state.name(),
                },
            });
        }
        if !allowed.contains(&self.state) {
            let err = Error::InvalidState {
                expected: allowed[0].name(),
                actual: self.state.name(),
            };
            self.abandon();
            return Err(err);
        }

        match op(self) {
            Ok(value) => Ok(value),
            Err(e) => {
                debug!(error = %e, "Session step failed");
                self.abandon();
                Err(e)
            }
        }
    }

    fn advance(&mut self, next: SessionState) {
        debug!(from = self.state.name(), to = next.name(), "Session transition");
        self.state = next;
    }

    /// A = Σ A_i over the full participant set.
    pub fn aggregate_keys(&mut self) -> Result<PublicKey> {
        self.step(&[SessionState::Initialized], |s| {
            s.aggregate = s.participants.aggregate_point();
            s.aggregate_bytes = s.aggregate.compress();
            s.advance(SessionState::KeysAggregated);
            Ok(PublicKey::from_point(&s.aggregate))
        })
    }

    /// Record one participant's nonce commitment R_i.
    pub fn add_commitment(&mut self, message: &NonceCommitment) -> Result<()> {
        self.step(
            &[SessionState::KeysAggregated, SessionState::NonceCommitted],
            |s| {
                s.participants.point(message.party_id)?;
                if s.commitments.contains_key(&message.party_id) {
                    return Err(Error::DuplicateParticipant(message.party_id));
                }
                let point = EdwardsPoint::decompress(&message.commitment)?;
                s.commitments.insert(message.party_id, point);
                if s.state != SessionState::NonceCommitted {
                    s.advance(SessionState::NonceCommitted);
                }
                Ok(())
            },
        )
    }

    /// R = Σ R_i once at least `threshold` participants committed.
    pub fn aggregate_commitments(&mut self) -> Result<[u8; 32]> {
        self.step(&[SessionState::NonceCommitted], |s| {
            if s.commitments.len() < s.config.threshold {
                return Err(Error::ThresholdNotMet {
                    required: s.config.threshold,
                    actual: s.commitments.len(),
                });
            }
            s.commitment = s.commitments.values().sum();
            s.commitment_bytes = s.commitment.compress();
            s.advance(SessionState::CommitmentAggregated);
            Ok(s.commitment_bytes)
        })
    }

    /// c = H(R || A || M) mod q
    pub fn compute_challenge(&mut self) -> Result<Scalar> {
        self.step(&[SessionState::CommitmentAggregated], |s| {
            s.challenge = challenge(&s.commitment_bytes, &s.aggregate_bytes, &s.message);
            s.advance(SessionState::ChallengeComputed);
            Ok(s.challenge)
        })
    }

    /// Record a partial share after checking s_i·B == R_i + c·A_i.
    pub fn add_partial_share(&mut self, message: &PartialShare) -> Result<()> {
        self.step(
            &[
                SessionState::ChallengeComputed,
                SessionState::PartialSharesComputed,
            ],
            |s| {
                let party_id = message.party_id;
                let r_i = *s
                    .commitments
                    .get(&party_id)
                    .ok_or(Error::NotInQuorum(party_id))?;
                if s.shares.contains_key(&party_id) {
                    return Err(Error::DuplicateParticipant(party_id));
                }

                let share = Scalar::from_canonical_bytes(message.share)
                    .map_err(|_| Error::InvalidShare(party_id))?;
                let a_i = s.participants.point(party_id)?;
                if EdwardsPoint::mul_base(&share) != &r_i + &(a_i * &s.challenge) {
                    return Err(Error::InvalidShare(party_id));
                }

                s.shares.insert(party_id, share);
                if s.state != SessionState::PartialSharesComputed {
                    s.advance(SessionState::PartialSharesComputed);
                }
                Ok(())
            },
        )
    }

    /// s = Σ s_i mod q, requiring a share from every committed participant.
    pub fn combine(&mut self) -> Result<Scalar> {
        self.step(&[SessionState::PartialSharesComputed], |s| {
            if let Some(missing) = s.commitments.keys().find(|id| !s.shares.contains_key(*id)) {
                return Err(Error::MissingShare(*missing));
            }
            s.response = s.shares.values().copied().sum();
            s.advance(SessionState::Combined);
            Ok(s.response)
        })
    }

    /// Z: mark every participant outside the quorum absent.
    pub fn set_bitmask(&mut self) -> Result<AbsenteeBitmask> {
        self.step(&[SessionState::Combined], |s| {
            let quorum = s.quorum();
            s.bitmask = AbsenteeBitmask::from_quorum(s.participants.len(), &quorum)?;
            s.advance(SessionState::BitmaskSet);
            Ok(s.bitmask.clone())
        })
    }

    /// A' = A − Σ_{Z_i=1} A_i
    pub fn reduce_key(&mut self) -> Result<PublicKey> {
        self.step(&[SessionState::BitmaskSet], |s| {
            s.reduced = s.participants.reduced_point(&s.bitmask)?;
            s.advance(SessionState::ReducedKeyComputed);
            Ok(PublicKey::from_point(&s.reduced))
        })
    }

    /// Emit `R || s || Z` after checking it against the reduced key.
    pub fn emit(&mut self) -> Result<AggregateSignature> {
        self.step(&[SessionState::ReducedKeyComputed], |s| {
            if !cofactored_equation(&s.response, &s.commitment, &s.challenge, &s.reduced) {
                return Err(Error::VerificationFailed(
                    "collective signature does not verify under the reduced key".into(),
                ));
            }
            s.advance(SessionState::Emitted);
            Ok(AggregateSignature {
                r: s.commitment_bytes,
                s: s.response.to_bytes(),
                bitmask: s.bitmask.clone(),
            })
        })
    }
}

/// Run a full cosigning session for local `signers` over `message`.
///
/// Signers not listed are recorded as absent. Nonces are drawn in order from
/// `rng`; partial shares are computed in parallel with the `multi-thread`
/// feature.
#[instrument(skip_all, fields(session = %hex::encode(config.session_id)))]
pub fn run_cosign<R: RngCore + CryptoRng>(
    config: &SessionConfig,
    participants: &ParticipantSet,
    signers: &[Cosigner],
    message: &[u8],
    rng: &mut R,
) -> Result<AggregateSignature> {
    let quorum: Vec<PartyId> = signers.iter().map(Cosigner::party_id).collect();
    info!(
        participants = participants.len(),
        quorum = ?quorum,
        "Starting cosign"
    );

    let mut session = CosignSession::new(config.clone(), participants.clone(), message)?;
    let aggregate = session.aggregate_keys()?;

    // Round 1: nonce commitments
    debug!("Cosign Round 1: nonce commitments");
    let mut nonces: Vec<NonceSecret> = Vec::with_capacity(signers.len());
    for signer in signers {
        let (nonce, commitment) = match signer.commit(config, rng) {
            Ok(pair) => pair,
            Err(e) => {
                session.abandon();
                return Err(e);
            }
        };
        session.add_commitment(&commitment)?;
        nonces.push(nonce);
    }
    session.aggregate_commitments()?;
    let challenge = session.compute_challenge()?;

    // Round 2: partial shares
    debug!("Cosign Round 2: partial shares");
    let shares = respond_all(signers, nonces, &challenge);
    for share in &shares {
        session.add_partial_share(share)?;
    }

    session.combine()?;
    let bitmask = session.set_bitmask()?;
    session.reduce_key()?;
    let signature = session.emit()?;

    info!(
        aggregate_key = %aggregate,
        r = hex::encode(signature.r),
        absent = ?bitmask.absentees().collect::<Vec<_>>(),
        "Cosign completed successfully"
    );

    Ok(signature)
}

fn respond_all(signers: &[Cosigner], nonces: Vec<NonceSecret>, challenge: &Scalar) -> Vec<PartialShare> {
    #[cfg(feature = "multi-thread")]
    {
        use rayon::prelude::*;
        signers
            .par_iter()
            .zip(nonces.into_par_iter())
            .map(|(signer, nonce)| signer.respond(nonce, challenge))
            .collect()
    }

    #[cfg(not(feature = "multi-thread"))]
    {
        signers
            .iter()
            .zip(nonces)
            .map(|(signer, nonce)| signer.respond(nonce, challenge))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cosign::verify_aggregate;
    use crate::KeyPair;
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;

    fn setup(n: usize, seed: u8) -> (ParticipantSet, Vec<Cosigner>, ChaCha20Rng) {
        let mut rng = ChaCha20Rng::from_seed([seed; 32]);
        let signers: Vec<Cosigner> = (0..n)
            .map(|i| Cosigner::new(i, KeyPair::generate(&mut rng)))
            .collect();
        let participants =
            ParticipantSet::new(signers.iter().map(|s| *s.public_key()).collect()).unwrap();
        (participants, signers, rng)
    }

    #[test]
    fn test_manual_rounds() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("cosi_core=debug")
            .with_test_writer()
            .try_init();

        let (participants, signers, mut rng) = setup(4, 1);
        let config = SessionConfig::new(4, 3).unwrap();
        let mut session = CosignSession::new(config.clone(), participants.clone(), b"rounds").unwrap();
        assert_eq!(session.state(), SessionState::Initialized);

        let aggregate = session.aggregate_keys().unwrap();
        assert_eq!(aggregate, participants.aggregate_key());

        let quorum = [&signers[3], &signers[0], &signers[2]];
        let mut nonces = Vec::new();
        for signer in quorum {
            let (nonce, commitment) = signer.commit(&config, &mut rng).unwrap();
            session.add_commitment(&commitment).unwrap();
            nonces.push(nonce);
        }
        assert_eq!(session.state(), SessionState::NonceCommitted);
        assert_eq!(session.quorum(), vec![0, 2, 3]);

        session.aggregate_commitments().unwrap();
        let challenge = session.compute_challenge().unwrap();
        for (signer, nonce) in quorum.into_iter().zip(nonces) {
            session.add_partial_share(&signer.respond(nonce, &challenge)).unwrap();
        }
        session.combine().unwrap();
        let bitmask = session.set_bitmask().unwrap();
        assert_eq!(bitmask.absentees().collect::<Vec<_>>(), vec![1]);

        let reduced = session.reduce_key().unwrap();
        let expected = *participants.point(0).unwrap()
            + *participants.point(2).unwrap()
            + *participants.point(3).unwrap();
        assert_eq!(reduced, PublicKey::from_point(&expected));

        let signature = session.emit().unwrap();
        assert_eq!(session.state(), SessionState::Emitted);
        assert!(verify_aggregate(
            &participants,
            aggregate.as_bytes(),
            b"rounds",
            &signature.to_bytes()
        ));
    }

    #[test]
    fn test_emitted_session_stays_emitted() {
        let (participants, signers, mut rng) = setup(3, 9);
        let config = SessionConfig::new(3, 3).unwrap();
        let mut session = CosignSession::new(config.clone(), participants, b"once").unwrap();
        session.aggregate_keys().unwrap();

        let mut nonces = Vec::new();
        for signer in &signers {
            let (nonce, commitment) = signer.commit(&config, &mut rng).unwrap();
            session.add_commitment(&commitment).unwrap();
            nonces.push(nonce);
        }
        session.aggregate_commitments().unwrap();
        let challenge = session.compute_challenge().unwrap();
        for (signer, nonce) in signers.iter().zip(nonces) {
            session.add_partial_share(&signer.respond(nonce, &challenge)).unwrap();
        }
        session.combine().unwrap();
        session.set_bitmask().unwrap();
        session.reduce_key().unwrap();
        session.emit().unwrap();

        assert_eq!(
            session.emit().err(),
            Some(Error::InvalidState {
                expected: "ReducedKeyComputed",
                actual: "Emitted"
            })
        );
        assert!(session.aggregate_keys().is_err());
        assert_eq!(session.state(), SessionState::Emitted);
    }

    #[test]
    fn test_threshold_not_met() {
        let (participants, signers, mut rng) = setup(3, 2);
        let config = SessionConfig::new(3, 2).unwrap();

        let result = run_cosign(&config, &participants, &signers[..1], b"m", &mut rng);
        assert_eq!(
            result.err(),
            Some(Error::ThresholdNotMet {
                required: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn test_out_of_order_abandons() {
        let (participants, _, _) = setup(3, 3);
        let config = SessionConfig::new(3, 2).unwrap();
        let mut session = CosignSession::new(config, participants, b"m").unwrap();

        assert_eq!(
            session.compute_challenge().err(),
            Some(Error::InvalidState {
                expected: "CommitmentAggregated",
                actual: "Initialized"
            })
        );
        assert_eq!(session.state(), SessionState::Abandoned);
        assert_eq!(session.aggregate_keys().err(), Some(Error::SessionAbandoned));
    }

    #[test]
    fn test_duplicate_and_unknown_commitments() {
        let (participants, signers, mut rng) = setup(3, 4);
        let config = SessionConfig::new(3, 2).unwrap();

        let mut session = CosignSession::new(config.clone(), participants.clone(), b"m").unwrap();
        session.aggregate_keys().unwrap();
        let (_, commitment) = signers[0].commit(&config, &mut rng).unwrap();
        session.add_commitment(&commitment).unwrap();
        assert_eq!(
            session.add_commitment(&commitment).err(),
            Some(Error::DuplicateParticipant(0))
        );
        assert_eq!(session.state(), SessionState::Abandoned);

        let mut session = CosignSession::new(config, participants, b"m").unwrap();
        session.aggregate_keys().unwrap();
        let unknown = NonceCommitment {
            party_id: 7,
            commitment: commitment.commitment,
        };
        assert_eq!(
            session.add_commitment(&unknown).err(),
            Some(Error::UnknownParticipant(7))
        );
    }

    #[test]
    fn test_invalid_share_names_participant() {
        let (participants, signers, mut rng) = setup(3, 5);
        let config = SessionConfig::new(3, 2).unwrap();
        let mut session = CosignSession::new(config.clone(), participants, b"m").unwrap();
        session.aggregate_keys().unwrap();

        let (nonce0, c0) = signers[0].commit(&config, &mut rng).unwrap();
        let (nonce1, c1) = signers[1].commit(&config, &mut rng).unwrap();
        session.add_commitment(&c0).unwrap();
        session.add_commitment(&c1).unwrap();
        session.aggregate_commitments().unwrap();
        let challenge = session.compute_challenge().unwrap();

        session.add_partial_share(&signers[0].respond(nonce0, &challenge)).unwrap();
        let mut forged = signers[1].respond(nonce1, &challenge);
        forged.share[0] ^= 1;
        assert_eq!(
            session.add_partial_share(&forged).err(),
            Some(Error::InvalidShare(1))
        );
        assert_eq!(session.combine().err(), Some(Error::SessionAbandoned));
    }

    #[test]
    fn test_share_outside_quorum_and_missing_share() {
        let (participants, signers, mut rng) = setup(3, 6);
        let config = SessionConfig::new(3, 2).unwrap();

        let prepare = |rng: &mut ChaCha20Rng| {
            let mut session =
                CosignSession::new(config.clone(), participants.clone(), b"m").unwrap();
            session.aggregate_keys().unwrap();
            let (n0, c0) = signers[0].commit(&config, &mut *rng).unwrap();
            let (n1, c1) = signers[1].commit(&config, &mut *rng).unwrap();
            session.add_commitment(&c0).unwrap();
            session.add_commitment(&c1).unwrap();
            session.aggregate_commitments().unwrap();
            let challenge = session.compute_challenge().unwrap();
            (session, challenge, n0, n1)
        };

        let (mut session, challenge, n0, _) = prepare(&mut rng);
        let (outsider, _) = signers[2].commit(&config, &mut rng).unwrap();
        assert_eq!(
            session
                .add_partial_share(&signers[2].respond(outsider, &challenge))
                .err(),
            Some(Error::NotInQuorum(2))
        );
        drop(n0);

        let (mut session, challenge, n0, _) = prepare(&mut rng);
        session.add_partial_share(&signers[0].respond(n0, &challenge)).unwrap();
        assert_eq!(session.combine().err(), Some(Error::MissingShare(1)));
    }

    #[test]
    fn test_mismatched_signer_key_is_rejected() {
        let (participants, mut signers, mut rng) = setup(3, 7);
        signers[1] = Cosigner::new(1, KeyPair::generate(&mut rng));
        let config = SessionConfig::new(3, 2).unwrap();

        let result = run_cosign(&config, &participants, &signers[..2], b"m", &mut rng);
        assert_eq!(result.err(), Some(Error::InvalidShare(1)));
    }

    #[test]
    fn test_threshold_above_participants_rejected() {
        let (participants, _, _) = setup(2, 8);
        let mut config = SessionConfig::new(2, 2).unwrap();
        config.threshold = 3;
        assert!(matches!(
            CosignSession::new(config, participants, b"m"),
            Err(Error::InvalidConfig(_))
        ));
    }
}
