//! Arithmetic in the base field GF(p), p = 2^255 - 19
//!
//! Elements are held as five unsigned 51-bit limbs. Limbs may temporarily
//! exceed 51 bits between operations; every operation carries them back
//! below 2^52, and [`FieldElement::to_bytes`] always produces the canonical
//! encoding in `[0, p)`.

use crate::{Error, Result};
use std::ops::{Add, Mul, Neg, Sub};
use subtle::{Choice, ConditionallySelectable, ConstantTimeEq};

const LOW_51_BIT_MASK: u64 = (1u64 << 51) - 1;

/// 16·p, added before subtraction so limbs never underflow
const SIXTEEN_P: [u64; 5] = [
    36028797018963664,
    36028797018963952,
    36028797018963952,
    36028797018963952,
    36028797018963952,
];

/// Element of GF(2^255 - 19)
#[derive(Clone, Copy, Debug)]
pub struct FieldElement(pub(crate) [u64; 5]);

/// Curve constant d = -121665 / 121666
pub const EDWARDS_D: FieldElement = FieldElement::from_bytes(&[
    0xa3, 0x78, 0x59, 0x13, 0xca, 0x4d, 0xeb, 0x75, 0xab, 0xd8, 0x41, 0x41, 0x4d, 0x0a, 0x70, 0x00,
    0x98, 0xe8, 0x79, 0x77, 0x79, 0x40, 0xc7, 0x8c, 0x73, 0xfe, 0x6f, 0x2b, 0xee, 0x6c, 0x03, 0x52,
]);

/// 2·d, limbs left unreduced
pub const EDWARDS_D2: FieldElement = FieldElement([
    EDWARDS_D.0[0] * 2,
    EDWARDS_D.0[1] * 2,
    EDWARDS_D.0[2] * 2,
    EDWARDS_D.0[3] * 2,
    EDWARDS_D.0[4] * 2,
]);

/// Primitive fourth root of unity, 2^((p-1)/4)
pub const SQRT_M1: FieldElement = FieldElement::from_bytes(&[
    0xb0, 0xa0, 0x0e, 0x4a, 0x27, 0x1b, 0xee, 0xc4, 0x78, 0xe4, 0x2f, 0xad, 0x06, 0x18, 0x43, 0x2f,
    0xa7, 0xd7, 0xfb, 0x3d, 0x99, 0x00, 0x4d, 0x2b, 0x0b, 0xdf, 0xc1, 0x4f, 0x80, 0x24, 0x83, 0x2b,
]);

#[inline(always)]
fn m(x: u64, y: u64) -> u128 {
    (x as u128) * (y as u128)
}

impl FieldElement {
    pub const ZERO: Self = Self([0, 0, 0, 0, 0]);
    pub const ONE: Self = Self([1, 0, 0, 0, 0]);

    /// Load a little-endian encoding, ignoring bit 255.
    ///
    /// Values in `[p, 2^255)` are accepted and reduced; use
    /// [`FieldElement::from_canonical_bytes`] to reject them.
    pub const fn from_bytes(bytes: &[u8; 32]) -> Self {
        let mut limbs = [0u64; 5];
        let mut i = 0;
        while i < 5 {
            let bit = i * 51;
            let start = bit / 8;
            let mut word = 0u64;
            let mut j = 0;
            while j < 8 && start + j < 32 {
                word |= (bytes[start + j] as u64) << (8 * j);
                j += 1;
            }
            limbs[i] = (word >> (bit % 8)) & LOW_51_BIT_MASK;
            i += 1;
        }
        FieldElement(limbs)
    }

    /// Load a little-endian encoding that must be strictly below p.
    pub fn from_canonical_bytes(bytes: &[u8; 32]) -> Result<Self> {
        if bytes[31] & 0x80 != 0 {
            return Err(Error::InvalidEncoding("field element exceeds 255 bits"));
        }
        let element = Self::from_bytes(bytes);
        if element.to_bytes() != *bytes {
            return Err(Error::InvalidEncoding("field element not below p"));
        }
        Ok(element)
    }

    pub const fn from_u64(value: u64) -> Self {
        FieldElement([value & LOW_51_BIT_MASK, value >> 51, 0, 0, 0])
    }

    /// Carry every limb into the next, folding the top carry back with 19.
    fn reduce(mut limbs: [u64; 5]) -> Self {
        let c0 = limbs[0] >> 51;
        let c1 = limbs[1] >> 51;
        let c2 = limbs[2] >> 51;
        let c3 = limbs[3] >> 51;
        let c4 = limbs[4] >> 51;

        limbs[0] &= LOW_51_BIT_MASK;
        limbs[1] &= LOW_51_BIT_MASK;
        limbs[2] &= LOW_51_BIT_MASK;
        limbs[3] &= LOW_51_BIT_MASK;
        limbs[4] &= LOW_51_BIT_MASK;

        limbs[0] += c4 * 19;
        limbs[1] += c0;
        limbs[2] += c1;
        limbs[3] += c2;
        limbs[4] += c3;

        FieldElement(limbs)
    }

    /// Canonical little-endian encoding in `[0, p)`.
    pub fn to_bytes(&self) -> [u8; 32] {
        let mut limbs = Self::reduce(self.0).0;

        // q = 1 iff the value is >= p; adding 19q and dropping bit 255
        // subtracts p exactly once.
        let mut q = (limbs[0] + 19) >> 51;
        q = (limbs[1] + q) >> 51;
        q = (limbs[2] + q) >> 51;
        q = (limbs[3] + q) >> 51;
        q = (limbs[4] + q) >> 51;

        limbs[0] += 19 * q;

        limbs[1] += limbs[0] >> 51;
        limbs[0] &= LOW_51_BIT_MASK;
        limbs[2] += limbs[1] >> 51;
        limbs[1] &= LOW_51_BIT_MASK;
        limbs[3] += limbs[2] >> 51;
        limbs[2] &= LOW_51_BIT_MASK;
        limbs[4] += limbs[3] >> 51;
        limbs[3] &= LOW_51_BIT_MASK;
        limbs[4] &= LOW_51_BIT_MASK;

        let mut out = [0u8; 32];
        let mut acc: u128 = 0;
        let mut acc_bits = 0u32;
        let mut i = 0usize;
        for limb in limbs {
            acc |= (limb as u128) << acc_bits;
            acc_bits += 51;
            while acc_bits >= 8 {
                out[i] = acc as u8;
                acc >>= 8;
                acc_bits -= 8;
                i += 1;
            }
        }
        out[i] = acc as u8;
        out
    }

    pub fn square(&self) -> Self {
        self * self
    }

    /// Square `k` times in a row.
    pub fn pow2k(&self, k: u32) -> Self {
        let mut out = *self;
        for _ in 0..k {
            out = out.square();
        }
        out
    }

    /// Returns `(self^(2^250 - 1), self^11)`, the shared prefix of the
    /// inversion and square-root exponent chains.
    fn pow22501(&self) -> (Self, Self) {
        let t0 = self.square(); // 2
        let t1 = t0.pow2k(2); // 8
        let t2 = self * &t1; // 9
        let t3 = &t0 * &t2; // 11
        let t4 = t3.square(); // 22
        let t5 = &t2 * &t4; // 2^5 - 1
        let t6 = t5.pow2k(5);
        let t7 = &t6 * &t5; // 2^10 - 1
        let t8 = t7.pow2k(10);
        let t9 = &t8 * &t7; // 2^20 - 1
        let t10 = t9.pow2k(20);
        let t11 = &t10 * &t9; // 2^40 - 1
        let t12 = t11.pow2k(10);
        let t13 = &t12 * &t7; // 2^50 - 1
        let t14 = t13.pow2k(50);
        let t15 = &t14 * &t13; // 2^100 - 1
        let t16 = t15.pow2k(100);
        let t17 = &t16 * &t15; // 2^200 - 1
        let t18 = t17.pow2k(50);
        let t19 = &t18 * &t13; // 2^250 - 1
        (t19, t3)
    }

    /// Multiplicative inverse, `self^(p - 2)`.
    pub fn invert(&self) -> Result<Self> {
        if self.is_zero() {
            return Err(Error::DivisionByZero);
        }
        Ok(self.pow_p_minus_2())
    }

    /// `self^(p - 2)` without the zero check; maps zero to zero.
    pub(crate) fn pow_p_minus_2(&self) -> Self {
        let (t19, t3) = self.pow22501();
        // 2^255 - 2^5 + 11 = p - 2
        &t19.pow2k(5) * &t3
    }

    /// Square root candidate via the exponent (p + 3) / 8.
    ///
    /// Returns `None` when `self` is not a quadratic residue.
    pub fn sqrt(&self) -> Option<Self> {
        let (t19, _) = self.pow22501();
        // (2^250 - 1)·4 + 2 = (p + 3) / 8
        let candidate = &t19.pow2k(2) * &self.square();
        if candidate.square() == *self {
            return Some(candidate);
        }
        let adjusted = &candidate * &SQRT_M1;
        if adjusted.square() == *self {
            return Some(adjusted);
        }
        None
    }

    pub fn is_zero(&self) -> bool {
        bool::from(self.ct_eq(&Self::ZERO))
    }

    /// Low bit of the canonical encoding.
    pub fn is_odd(&self) -> bool {
        self.to_bytes()[0] & 1 == 1
    }
}

impl ConstantTimeEq for FieldElement {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.to_bytes().ct_eq(&other.to_bytes())
    }
}

impl PartialEq for FieldElement {
    fn eq(&self, other: &Self) -> bool {
        bool::from(self.ct_eq(other))
    }
}

impl Eq for FieldElement {}

impl ConditionallySelectable for FieldElement {
    fn conditional_select(a: &Self, b: &Self, choice: Choice) -> Self {
        FieldElement([
            u64::conditional_select(&a.0[0], &b.0[0], choice),
            u64::conditional_select(&a.0[1], &b.0[1], choice),
            u64::conditional_select(&a.0[2], &b.0[2], choice),
            u64::conditional_select(&a.0[3], &b.0[3], choice),
            u64::conditional_select(&a.0[4], &b.0[4], choice),
        ])
    }
}

impl<'a, 'b> Add<&'b FieldElement> for &'a FieldElement {
    type Output = FieldElement;

    fn add(self, rhs: &'b FieldElement) -> FieldElement {
        let (a, b) = (&self.0, &rhs.0);
        FieldElement::reduce([a[0] + b[0], a[1] + b[1], a[2] + b[2], a[3] + b[3], a[4] + b[4]])
    }
}

impl<'a, 'b> Sub<&'b FieldElement> for &'a FieldElement {
    type Output = FieldElement;

    fn sub(self, rhs: &'b FieldElement) -> FieldElement {
        let (a, b) = (&self.0, &rhs.0);
        FieldElement::reduce([
            (a[0] + SIXTEEN_P[0]) - b[0],
            (a[1] + SIXTEEN_P[1]) - b[1],
            (a[2] + SIXTEEN_P[2]) - b[2],
            (a[3] + SIXTEEN_P[3]) - b[3],
            (a[4] + SIXTEEN_P[4]) - b[4],
        ])
    }
}

impl<'a, 'b> Mul<&'b FieldElement> for &'a FieldElement {
    type Output = FieldElement;

    fn mul(self, rhs: &'b FieldElement) -> FieldElement {
        let (a, b) = (&self.0, &rhs.0);

        // 2^255 = 19 (mod p), so products that wrap past limb 4 fold back times 19
        let b1_19 = b[1] * 19;
        let b2_19 = b[2] * 19;
        let b3_19 = b[3] * 19;
        let b4_19 = b[4] * 19;

        let c0 = m(a[0], b[0]) + m(a[4], b1_19) + m(a[3], b2_19) + m(a[2], b3_19) + m(a[1], b4_19);
        let mut c1 =
            m(a[1], b[0]) + m(a[0], b[1]) + m(a[4], b2_19) + m(a[3], b3_19) + m(a[2], b4_19);
        let mut c2 =
            m(a[2], b[0]) + m(a[1], b[1]) + m(a[0], b[2]) + m(a[4], b3_19) + m(a[3], b4_19);
        let mut c3 =
            m(a[3], b[0]) + m(a[2], b[1]) + m(a[1], b[2]) + m(a[0], b[3]) + m(a[4], b4_19);
        let mut c4 = m(a[4], b[0]) + m(a[3], b[1]) + m(a[2], b[2]) + m(a[1], b[3]) + m(a[0], b[4]);

        let mut out = [0u64; 5];

        c1 += c0 >> 51;
        out[0] = (c0 as u64) & LOW_51_BIT_MASK;

        c2 += c1 >> 51;
        out[1] = (c1 as u64) & LOW_51_BIT_MASK;

        c3 += c2 >> 51;
        out[2] = (c2 as u64) & LOW_51_BIT_MASK;

        c4 += c3 >> 51;
        out[3] = (c3 as u64) & LOW_51_BIT_MASK;

        let carry = (c4 >> 51) as u64;
        out[4] = (c4 as u64) & LOW_51_BIT_MASK;

        out[0] += carry * 19;
        out[1] += out[0] >> 51;
        out[0] &= LOW_51_BIT_MASK;

        FieldElement(out)
    }
}

impl<'a> Neg for &'a FieldElement {
    type Output = FieldElement;

    fn neg(self) -> FieldElement {
        &FieldElement::ZERO - self
    }
}

macro_rules! forward_by_value {
    ($trait:ident, $method:ident) => {
        impl $trait<FieldElement> for FieldElement {
            type Output = FieldElement;

            fn $method(self, rhs: FieldElement) -> FieldElement {
                (&self).$method(&rhs)
            }
        }
    };
}

forward_by_value!(Add, add);
forward_by_value!(Sub, sub);
forward_by_value!(Mul, mul);

impl Neg for FieldElement {
    type Output = FieldElement;

    fn neg(self) -> FieldElement {
        -&self
    }
}
