//! Ordered participant set and key aggregation

use super::AbsenteeBitmask;
use crate::curve::EdwardsPoint;
use crate::{Error, PartyId, PublicKey, Result};

/// Participants with known public keys, in list order.
///
/// Index `i` in this list is the participant's `PartyId` and its bit
/// position in an absentee bitmask.
#[derive(Debug, Clone)]
pub struct ParticipantSet {
    keys: Vec<PublicKey>,
    points: Vec<EdwardsPoint>,
}

impl ParticipantSet {
    pub fn new(keys: Vec<PublicKey>) -> Result<Self> {
        if keys.is_empty() {
            return Err(Error::InvalidConfig(
                "Participant set cannot be empty".into(),
            ));
        }
        let points = keys
            .iter()
            .map(PublicKey::to_point)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { keys, points })
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[PublicKey] {
        &self.keys
    }

    pub fn public_key(&self, party_id: PartyId) -> Result<&PublicKey> {
        self.keys
            .get(party_id)
            .ok_or(Error::UnknownParticipant(party_id))
    }

    pub fn point(&self, party_id: PartyId) -> Result<&EdwardsPoint> {
        self.points
            .get(party_id)
            .ok_or(Error::UnknownParticipant(party_id))
    }

    /// Position of `key` in the set, if present
    pub fn position(&self, key: &PublicKey) -> Option<PartyId> {
        self.keys.iter().position(|k| k == key)
    }

    /// A = Σ A_i over every participant
    pub fn aggregate_point(&self) -> EdwardsPoint {
        self.points.iter().sum()
    }

    pub fn aggregate_key(&self) -> PublicKey {
        PublicKey::from_point(&self.aggregate_point())
    }

    /// T = Σ A_i over the participants marked absent
    pub fn absent_sum(&self, bitmask: &AbsenteeBitmask) -> Result<EdwardsPoint> {
        if bitmask.n_parties() != self.len() {
            return Err(Error::InvalidLength {
                expected: AbsenteeBitmask::byte_len(self.len()),
                actual: bitmask.as_bytes().len(),
            });
        }
        Ok(bitmask.absentees().map(|i| self.points[i]).sum())
    }

    /// A' = A − T, the key the quorum actually signed with
    pub fn reduced_point(&self, bitmask: &AbsenteeBitmask) -> Result<EdwardsPoint> {
        Ok(self.aggregate_point() - self.absent_sum(bitmask)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KeyPair;
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;

    fn keys(count: usize, seed: u8) -> Vec<PublicKey> {
        let mut rng = ChaCha20Rng::from_seed([seed; 32]);
        (0..count)
            .map(|_| *KeyPair::generate(&mut rng).public_key())
            .collect()
    }

    #[test]
    fn test_aggregate_is_order_independent() {
        let keys = keys(5, 4);
        let forward = ParticipantSet::new(keys.clone()).unwrap();
        let mut reversed = keys.clone();
        reversed.reverse();
        let backward = ParticipantSet::new(reversed).unwrap();
        let mut rotated = keys;
        rotated.rotate_left(2);
        let rotated = ParticipantSet::new(rotated).unwrap();

        assert_eq!(forward.aggregate_key(), backward.aggregate_key());
        assert_eq!(forward.aggregate_key(), rotated.aggregate_key());
    }

    #[test]
    fn test_aggregate_is_additive() {
        let keys = keys(4, 5);
        let all = ParticipantSet::new(keys.clone()).unwrap();
        let left = ParticipantSet::new(keys[..2].to_vec()).unwrap();
        let right = ParticipantSet::new(keys[2..].to_vec()).unwrap();

        assert_eq!(
            all.aggregate_point(),
            left.aggregate_point() + right.aggregate_point()
        );
    }

    #[test]
    fn test_reduced_point_drops_absentees() {
        let keys = keys(3, 6);
        let set = ParticipantSet::new(keys).unwrap();
        let mask = AbsenteeBitmask::from_absent(3, &[1]).unwrap();

        let expected = set.point(0).unwrap() + set.point(2).unwrap();
        assert_eq!(set.reduced_point(&mask).unwrap(), expected);
        assert_eq!(
            set.reduced_point(&AbsenteeBitmask::new(3)).unwrap(),
            set.aggregate_point()
        );
        assert!(set.reduced_point(&AbsenteeBitmask::new(9)).is_err());
    }

    #[test]
    fn test_lookup() {
        let keys = keys(2, 7);
        let set = ParticipantSet::new(keys.clone()).unwrap();
        assert_eq!(set.public_key(1).unwrap(), &keys[1]);
        assert_eq!(set.position(&keys[1]), Some(1));
        assert_eq!(set.point(2).err(), Some(Error::UnknownParticipant(2)));
        assert!(ParticipantSet::new(Vec::new()).is_err());
    }
}
