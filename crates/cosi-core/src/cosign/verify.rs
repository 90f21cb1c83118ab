//! Collective signature verification

use super::{AbsenteeBitmask, AggregateSignature, ParticipantSet};
use crate::curve::{EdwardsPoint, Scalar};
use crate::hash::challenge;
use crate::{sign, Error, Result, KEY_LENGTH};
use tracing::debug;

/// `8·s·B == 8·R + 8·c·A'`
pub(crate) fn cofactored_equation(
    s: &Scalar,
    r: &EdwardsPoint,
    c: &Scalar,
    reduced_key: &EdwardsPoint,
) -> bool {
    let lhs = EdwardsPoint::mul_base(s).mul_by_cofactor();
    let rhs = (r + &(reduced_key * c)).mul_by_cofactor();
    lhs == rhs
}

/// Key the quorum signed with: A' = A − Σ_{Z_i=1} A_i.
pub fn reduced_key(participants: &ParticipantSet, bitmask: &AbsenteeBitmask) -> Result<EdwardsPoint> {
    participants.reduced_point(bitmask)
}

/// Verify `R || s || Z` over `message` for the given participant set.
///
/// `aggregate_key` must equal the sum of all participants' keys. The
/// challenge is taken over that full key, the equation is checked against the
/// reduced key with the cofactor cleared. Any malformed input yields `false`.
pub fn verify_aggregate(
    participants: &ParticipantSet,
    aggregate_key: &[u8],
    message: &[u8],
    signature: &[u8],
) -> bool {
    match check_aggregate(participants, aggregate_key, message, signature) {
        Ok(()) => true,
        Err(e) => {
            debug!(error = %e, "Aggregate signature rejected");
            false
        }
    }
}

fn check_aggregate(
    participants: &ParticipantSet,
    aggregate_key: &[u8],
    message: &[u8],
    signature: &[u8],
) -> Result<()> {
    let a = EdwardsPoint::decompress(aggregate_key)?;
    if a != participants.aggregate_point() {
        return Err(Error::VerificationFailed(
            "aggregate key does not match participant set".into(),
        ));
    }

    let sig = AggregateSignature::from_bytes(signature, participants.len())?;
    let r = EdwardsPoint::decompress(&sig.r)?;
    let s = Scalar::from_canonical_bytes(sig.s)?;
    let a_reduced = reduced_key(participants, &sig.bitmask)?;

    let mut encoded_key = [0u8; KEY_LENGTH];
    encoded_key.copy_from_slice(aggregate_key);
    let c = challenge(&sig.r, &encoded_key, message);

    if !cofactored_equation(&s, &r, &c, &a_reduced) {
        return Err(Error::VerificationFailed("group equation mismatch".into()));
    }
    Ok(())
}

/// Verify a collective signature nobody was absent from.
///
/// The signature must be exactly `64 + ⌈n/8⌉` bytes with an all-zero
/// bitmask; `R || s` is then checked as an ordinary EdDSA signature under the
/// aggregate key.
pub fn verify_full_key(
    participants: &ParticipantSet,
    aggregate_key: &[u8],
    message: &[u8],
    signature: &[u8],
) -> bool {
    match check_full_key(participants, aggregate_key, signature) {
        Ok(rs) => sign::verify(aggregate_key, message, &rs.to_bytes()),
        Err(e) => {
            debug!(error = %e, "Full-key signature rejected");
            false
        }
    }
}

fn check_full_key(
    participants: &ParticipantSet,
    aggregate_key: &[u8],
    signature: &[u8],
) -> Result<crate::Signature> {
    let a = EdwardsPoint::decompress(aggregate_key)?;
    if a != participants.aggregate_point() {
        return Err(Error::VerificationFailed(
            "aggregate key does not match participant set".into(),
        ));
    }

    let sig = AggregateSignature::from_bytes(signature, participants.len())?;
    if !sig.bitmask.is_empty() {
        return Err(Error::VerificationFailed(
            "full-key verification requires an empty bitmask".into(),
        ));
    }
    Ok(sig.signature())
}
