//! Arithmetic modulo the prime group order
//!
//! q = 2^252 + 27742317777372353535851937790883648493
//!
//! Scalars are stored as 32 little-endian bytes. Reduction works on 64
//! signed radix-2^8 limbs, which is enough headroom for a 512-bit digest or
//! the schoolbook product of two 256-bit values plus a third.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Neg, Sub};
use zeroize::Zeroize;

/// Group order q, little-endian
const L: [u8; 32] = [
    0xed, 0xd3, 0xf5, 0x5c, 0x1a, 0x63, 0x12, 0x58, 0xd6, 0x9c, 0xf7, 0xa2, 0xde, 0xf9, 0xde, 0x14,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x10,
];

/// q - 1, little-endian
const L_MINUS_ONE: [u8; 32] = [
    0xec, 0xd3, 0xf5, 0x5c, 0x1a, 0x63, 0x12, 0x58, 0xd6, 0x9c, 0xf7, 0xa2, 0xde, 0xf9, 0xde, 0x14,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x10,
];

/// Integer modulo q.
///
/// Every arithmetic result is fully reduced into `[0, q)`. The one exception
/// is [`Scalar::from_clamped`], which keeps a clamped secret exactly as
/// derived so that point multiplication sees the clamped bit pattern.
///
/// Equality and hashing compare residues, so a clamped scalar equals its
/// reduced form even though the stored bytes differ.
#[derive(Clone, Copy, Debug, Eq, Serialize, Deserialize, Zeroize)]
pub struct Scalar(pub(crate) [u8; 32]);

/// Reduce 64 radix-2^8 limbs modulo q.
fn mod_l(x: &mut [i64; 64]) -> [u8; 32] {
    for i in (32..64).rev() {
        let mut carry = 0i64;
        let mut j = i - 32;
        while j < i - 12 {
            x[j] += carry - 16 * x[i] * L[j - (i - 32)] as i64;
            carry = (x[j] + 128) >> 8;
            x[j] -= carry << 8;
            j += 1;
        }
        x[j] += carry;
        x[i] = 0;
    }

    let top = x[31] >> 4;
    let mut carry = 0i64;
    for j in 0..32 {
        x[j] += carry - top * L[j] as i64;
        carry = x[j] >> 8;
        x[j] &= 255;
    }
    for j in 0..32 {
        x[j] -= carry * L[j] as i64;
    }

    let mut out = [0u8; 32];
    for i in 0..32 {
        x[i + 1] += x[i] >> 8;
        out[i] = (x[i] & 255) as u8;
    }
    x.zeroize();
    out
}

/// `a·b + c (mod q)`
fn mul_add(a: &[u8; 32], b: &[u8; 32], c: &[u8; 32]) -> Scalar {
    let mut x = [0i64; 64];
    for (limb, byte) in x.iter_mut().zip(c.iter()) {
        *limb = *byte as i64;
    }
    for i in 0..32 {
        for j in 0..32 {
            x[i + j] += a[i] as i64 * b[j] as i64;
        }
    }
    Scalar(mod_l(&mut x))
}

impl Scalar {
    pub const ZERO: Self = Scalar([0u8; 32]);
    pub const ONE: Self = {
        let mut bytes = [0u8; 32];
        bytes[0] = 1;
        Scalar(bytes)
    };

    /// Interpret 32 little-endian bytes and reduce modulo q.
    pub fn from_bytes_mod_order(bytes: [u8; 32]) -> Self {
        let mut x = [0i64; 64];
        for (limb, byte) in x.iter_mut().zip(bytes.iter()) {
            *limb = *byte as i64;
        }
        Scalar(mod_l(&mut x))
    }

    /// Interpret a 64-byte little-endian buffer (typically a SHA-512 digest)
    /// and reduce modulo q.
    pub fn from_bytes_mod_order_wide(bytes: &[u8; 64]) -> Self {
        let mut x = [0i64; 64];
        for (limb, byte) in x.iter_mut().zip(bytes.iter()) {
            *limb = *byte as i64;
        }
        Scalar(mod_l(&mut x))
    }

    /// Accept only encodings strictly below q.
    pub fn from_canonical_bytes(bytes: [u8; 32]) -> Result<Self> {
        if !is_canonical(&bytes) {
            return Err(Error::InvalidEncoding("scalar not below group order"));
        }
        Ok(Scalar(bytes))
    }

    /// Clear the low 3 bits and bit 255, set bit 254, keep the result unreduced.
    pub fn from_clamped(mut bytes: [u8; 32]) -> Self {
        bytes[0] &= 248;
        bytes[31] &= 127;
        bytes[31] |= 64;
        Scalar(bytes)
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.0
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Bit `i` of the little-endian representation.
    pub(crate) fn bit(&self, i: usize) -> u8 {
        (self.0[i >> 3] >> (i & 7)) & 1
    }

    /// Fully reduced copy (a no-op for everything but clamped scalars).
    pub fn reduce(&self) -> Self {
        Self::from_bytes_mod_order(self.0)
    }

    pub fn is_zero(&self) -> bool {
        self.reduce().0 == Self::ZERO.0
    }

    pub fn is_one(&self) -> bool {
        self.reduce().0 == Self::ONE.0
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        self.reduce().0 == other.reduce().0
    }
}

impl std::hash::Hash for Scalar {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.reduce().0.hash(state);
    }
}

/// Whether a little-endian encoding lies in `[0, q)`.
pub fn is_canonical(bytes: &[u8; 32]) -> bool {
    for i in (0..32).rev() {
        if bytes[i] < L[i] {
            return true;
        }
        if bytes[i] > L[i] {
            return false;
        }
    }
    false
}

impl From<u64> for Scalar {
    fn from(value: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[..8].copy_from_slice(&value.to_le_bytes());
        Scalar::from_bytes_mod_order(bytes)
    }
}

impl Add for Scalar {
    type Output = Scalar;

    fn add(self, rhs: Scalar) -> Scalar {
        let mut x = [0i64; 64];
        for i in 0..32 {
            x[i] = self.0[i] as i64 + rhs.0[i] as i64;
        }
        Scalar(mod_l(&mut x))
    }
}

impl Sub for Scalar {
    type Output = Scalar;

    fn sub(self, rhs: Scalar) -> Scalar {
        // a - b = a + (q - 1)·b
        mul_add(&rhs.0, &L_MINUS_ONE, &self.0)
    }
}

impl Mul for Scalar {
    type Output = Scalar;

    fn mul(self, rhs: Scalar) -> Scalar {
        mul_add(&self.0, &rhs.0, &Scalar::ZERO.0)
    }
}

impl Neg for Scalar {
    type Output = Scalar;

    fn neg(self) -> Scalar {
        Scalar::ZERO - self
    }
}

impl Scalar {
    /// `self·b + c`, the EdDSA response in one reduction.
    pub fn mul_add(&self, b: &Scalar, c: &Scalar) -> Scalar {
        mul_add(&self.0, &b.0, &c.0)
    }
}

impl std::iter::Sum for Scalar {
    fn sum<I: Iterator<Item = Scalar>>(iter: I) -> Scalar {
        iter.fold(Scalar::ZERO, |acc, s| acc + s)
    }
}
