//! Absentee bitmask

use crate::{Error, PartyId, Result};
use serde::{Deserialize, Serialize};

/// One bit per participant, set for participants that did not sign.
///
/// Bit `i` lives in byte `i / 8` at position `i % 8` (least significant bit
/// first), so with three participants `0b0000_0100` marks the third absent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawBitmask")]
pub struct AbsenteeBitmask {
    n_parties: usize,
    bytes: Vec<u8>,
}

/// Serialized form, checked by [`AbsenteeBitmask::from_bytes`] on the way in.
#[derive(Deserialize)]
struct RawBitmask {
    n_parties: usize,
    bytes: Vec<u8>,
}

impl TryFrom<RawBitmask> for AbsenteeBitmask {
    type Error = Error;

    fn try_from(raw: RawBitmask) -> Result<Self> {
        Self::from_bytes(&raw.bytes, raw.n_parties)
    }
}

impl AbsenteeBitmask {
    /// Encoded size for `n_parties` participants, ⌈n/8⌉
    pub fn byte_len(n_parties: usize) -> usize {
        (n_parties + 7) / 8
    }

    /// Bitmask with every participant present.
    pub fn new(n_parties: usize) -> Self {
        Self {
            n_parties,
            bytes: vec![0u8; Self::byte_len(n_parties)],
        }
    }

    pub fn from_absent(n_parties: usize, absent: &[PartyId]) -> Result<Self> {
        let mut mask = Self::new(n_parties);
        for &party_id in absent {
            mask.set_absent(party_id)?;
        }
        Ok(mask)
    }

    /// Bitmask for the complement of `quorum`.
    pub fn from_quorum(n_parties: usize, quorum: &[PartyId]) -> Result<Self> {
        let mut present = vec![false; n_parties];
        for &party_id in quorum {
            if party_id >= n_parties {
                return Err(Error::UnknownParticipant(party_id));
            }
            present[party_id] = true;
        }

        let mut mask = Self::new(n_parties);
        for (party_id, _) in present.iter().enumerate().filter(|(_, p)| !**p) {
            mask.set_absent(party_id)?;
        }
        Ok(mask)
    }

    /// Decode a bitmask for a set of `n_parties`.
    ///
    /// Fails with `InvalidLength` when the byte count is not ⌈n/8⌉ and with
    /// `UnknownParticipant` when a padding bit names an index ≥ n.
    pub fn from_bytes(bytes: &[u8], n_parties: usize) -> Result<Self> {
        let expected = Self::byte_len(n_parties);
        if bytes.len() != expected {
            return Err(Error::InvalidLength {
                expected,
                actual: bytes.len(),
            });
        }

        let mask = Self {
            n_parties,
            bytes: bytes.to_vec(),
        };
        if let Some(stray) = (n_parties..expected * 8).find(|&i| mask.bit(i)) {
            return Err(Error::UnknownParticipant(stray));
        }
        Ok(mask)
    }

    pub fn set_absent(&mut self, party_id: PartyId) -> Result<()> {
        if party_id >= self.n_parties {
            return Err(Error::UnknownParticipant(party_id));
        }
        self.bytes[party_id / 8] |= 1 << (party_id % 8);
        Ok(())
    }

    pub fn is_absent(&self, party_id: PartyId) -> bool {
        party_id < self.n_parties && self.bit(party_id)
    }

    fn bit(&self, i: usize) -> bool {
        (self.bytes[i / 8] >> (i % 8)) & 1 == 1
    }

    /// Indices of absent participants, ascending
    pub fn absentees(&self) -> impl Iterator<Item = PartyId> + '_ {
        (0..self.n_parties).filter(move |&i| self.bit(i))
    }

    /// Indices of participants that signed, ascending
    pub fn signers(&self) -> impl Iterator<Item = PartyId> + '_ {
        (0..self.n_parties).filter(move |&i| !self.bit(i))
    }

    pub fn count_absent(&self) -> usize {
        self.absentees().count()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.iter().all(|b| *b == 0)
    }

    pub fn n_parties(&self) -> usize {
        self.n_parties
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}
