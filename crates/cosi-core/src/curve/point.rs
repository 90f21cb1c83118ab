//! Points on the twisted Edwards curve -x^2 + y^2 = 1 + d·x^2·y^2
//!
//! Points use extended coordinates (X, Y, Z, T) with x = X/Z, y = Y/Z and
//! x·y = T/Z. The addition law is complete for this curve, so doubling is
//! addition of a point to itself.

use super::field::{FieldElement, EDWARDS_D, EDWARDS_D2};
use super::scalar::Scalar;
use crate::{Error, Result};
use std::ops::{Add, Mul, Neg, Sub};
use subtle::{Choice, ConditionallySelectable, ConstantTimeEq};

/// Compressed encoding of the base point, y = 4/5 with even x
pub const BASEPOINT_COMPRESSED: [u8; 32] = [
    0x58, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66,
    0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66,
];

const BASEPOINT_X: [u8; 32] = [
    0x1a, 0xd5, 0x25, 0x8f, 0x60, 0x2d, 0x56, 0xc9, 0xb2, 0xa7, 0x25, 0x95, 0x60, 0xc7, 0x2c, 0x69,
    0x5c, 0xdc, 0xd6, 0xfd, 0x31, 0xe2, 0xa4, 0xc0, 0xfe, 0x53, 0x6e, 0xcd, 0xd3, 0x36, 0x69, 0x21,
];

const BASEPOINT_XY: [u8; 32] = [
    0xa3, 0xdd, 0xb7, 0xa5, 0xb3, 0x8a, 0xde, 0x6d, 0xf5, 0x52, 0x51, 0x77, 0x80, 0x9f, 0xf0, 0x20,
    0x7d, 0xe3, 0xab, 0x64, 0x8e, 0x4e, 0xea, 0x66, 0x65, 0x76, 0x8b, 0xd7, 0x0f, 0x5f, 0x87, 0x67,
];

/// Curve point in extended twisted Edwards coordinates
#[derive(Clone, Copy, Debug)]
pub struct EdwardsPoint {
    pub(crate) x: FieldElement,
    pub(crate) y: FieldElement,
    pub(crate) z: FieldElement,
    pub(crate) t: FieldElement,
}

impl EdwardsPoint {
    /// Neutral element (0, 1)
    pub const IDENTITY: Self = EdwardsPoint {
        x: FieldElement::ZERO,
        y: FieldElement::ONE,
        z: FieldElement::ONE,
        t: FieldElement::ZERO,
    };

    /// Base point B generating the prime-order subgroup
    pub const GENERATOR: Self = EdwardsPoint {
        x: FieldElement::from_bytes(&BASEPOINT_X),
        y: FieldElement::from_bytes(&BASEPOINT_COMPRESSED),
        z: FieldElement::ONE,
        t: FieldElement::from_bytes(&BASEPOINT_XY),
    };

    /// Multiply the base point by `scalar`.
    pub fn mul_base(scalar: &Scalar) -> Self {
        Self::GENERATOR.scalar_mul(scalar)
    }

    pub fn double(&self) -> Self {
        self + self
    }

    /// Double-and-add from the least significant bit upwards.
    ///
    /// All 256 bits are processed and the running sum is updated through a
    /// conditional select, so the sequence of field operations does not
    /// depend on the scalar. Clamped, unreduced scalars are accepted.
    pub fn scalar_mul(&self, scalar: &Scalar) -> Self {
        let mut acc = Self::IDENTITY;
        let mut addend = *self;
        for i in 0..256 {
            let sum = &acc + &addend;
            acc = Self::conditional_select(&acc, &sum, Choice::from(scalar.bit(i)));
            addend = addend.double();
        }
        acc
    }

    /// Multiply by the cofactor 8.
    pub fn mul_by_cofactor(&self) -> Self {
        self.double().double().double()
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Whether the point lies in the 8-torsion subgroup.
    pub fn is_small_order(&self) -> bool {
        self.mul_by_cofactor().is_identity()
    }

    /// Encode as 255-bit little-endian y with the parity of x in bit 255.
    pub fn compress(&self) -> [u8; 32] {
        // Z is nonzero for every point on the curve
        let z_inv = self.z.pow_p_minus_2();
        let x = &self.x * &z_inv;
        let y = &self.y * &z_inv;
        let mut out = y.to_bytes();
        out[31] |= (x.is_odd() as u8) << 7;
        out
    }

    /// Decode a compressed point.
    ///
    /// Fails with `InvalidLength` unless exactly 32 bytes are given,
    /// `InvalidEncoding` if y is not below p, and `PointNotOnCurve` if no x
    /// with the requested parity exists.
    pub fn decompress(bytes: &[u8]) -> Result<Self> {
        let mut encoded: [u8; 32] = bytes.try_into().map_err(|_| Error::InvalidLength {
            expected: 32,
            actual: bytes.len(),
        })?;

        let sign = encoded[31] >> 7;
        encoded[31] &= 0x7f;
        let y = FieldElement::from_canonical_bytes(&encoded)?;
        let x = recover_x(&y, sign)?;

        Ok(EdwardsPoint {
            x,
            y,
            z: FieldElement::ONE,
            t: &x * &y,
        })
    }
}

/// Solve the curve equation for x given y and the parity bit of x.
///
/// x^2 = (y^2 - 1) / (d·y^2 + 1)
pub(crate) fn recover_x(y: &FieldElement, sign: u8) -> Result<FieldElement> {
    let yy = y.square();
    let u = &yy - &FieldElement::ONE;
    let v = &(&yy * &EDWARDS_D) + &FieldElement::ONE;
    let v_inv = v.invert().map_err(|_| Error::PointNotOnCurve)?;
    let xx = &u * &v_inv;

    if xx.is_zero() {
        // x = 0 has no odd representative
        return if sign == 1 {
            Err(Error::PointNotOnCurve)
        } else {
            Ok(FieldElement::ZERO)
        };
    }

    let x = xx.sqrt().ok_or(Error::PointNotOnCurve)?;
    if x.is_odd() != (sign == 1) {
        return Ok(-x);
    }
    Ok(x)
}

impl ConstantTimeEq for EdwardsPoint {
    /// Affine equality by cross-multiplication: x1·z2 = x2·z1 and y1·z2 = y2·z1.
    fn ct_eq(&self, other: &Self) -> Choice {
        let x1z2 = &self.x * &other.z;
        let x2z1 = &other.x * &self.z;
        let y1z2 = &self.y * &other.z;
        let y2z1 = &other.y * &self.z;
        x1z2.ct_eq(&x2z1) & y1z2.ct_eq(&y2z1)
    }
}

impl PartialEq for EdwardsPoint {
    fn eq(&self, other: &Self) -> bool {
        bool::from(self.ct_eq(other))
    }
}

impl Eq for EdwardsPoint {}

impl ConditionallySelectable for EdwardsPoint {
    fn conditional_select(a: &Self, b: &Self, choice: Choice) -> Self {
        EdwardsPoint {
            x: FieldElement::conditional_select(&a.x, &b.x, choice),
            y: FieldElement::conditional_select(&a.y, &b.y, choice),
            z: FieldElement::conditional_select(&a.z, &b.z, choice),
            t: FieldElement::conditional_select(&a.t, &b.t, choice),
        }
    }
}

impl<'a, 'b> Add<&'b EdwardsPoint> for &'a EdwardsPoint {
    type Output = EdwardsPoint;

    fn add(self, other: &'b EdwardsPoint) -> EdwardsPoint {
        let a = &(&self.y - &self.x) * &(&other.y - &other.x);
        let b = &(&self.y + &self.x) * &(&other.y + &other.x);
        let c = &(&self.t * &EDWARDS_D2) * &other.t;
        let z1z2 = &self.z * &other.z;
        let d = &z1z2 + &z1z2;

        let e = &b - &a;
        let f = &d - &c;
        let g = &d + &c;
        let h = &b + &a;

        EdwardsPoint {
            x: &e * &f,
            y: &g * &h,
            z: &f * &g,
            t: &e * &h,
        }
    }
}

impl<'a> Neg for &'a EdwardsPoint {
    type Output = EdwardsPoint;

    fn neg(self) -> EdwardsPoint {
        EdwardsPoint {
            x: -&self.x,
            y: self.y,
            z: self.z,
            t: -&self.t,
        }
    }
}

impl<'a, 'b> Sub<&'b EdwardsPoint> for &'a EdwardsPoint {
    type Output = EdwardsPoint;

    fn sub(self, other: &'b EdwardsPoint) -> EdwardsPoint {
        self + &(-other)
    }
}

impl<'a, 'b> Mul<&'b Scalar> for &'a EdwardsPoint {
    type Output = EdwardsPoint;

    fn mul(self, scalar: &'b Scalar) -> EdwardsPoint {
        self.scalar_mul(scalar)
    }
}

impl Add for EdwardsPoint {
    type Output = EdwardsPoint;

    fn add(self, other: EdwardsPoint) -> EdwardsPoint {
        &self + &other
    }
}

impl Sub for EdwardsPoint {
    type Output = EdwardsPoint;

    fn sub(self, other: EdwardsPoint) -> EdwardsPoint {
        &self - &other
    }
}

impl Neg for EdwardsPoint {
    type Output = EdwardsPoint;

    fn neg(self) -> EdwardsPoint {
        -&self
    }
}

impl Mul<Scalar> for EdwardsPoint {
    type Output = EdwardsPoint;

    fn mul(self, scalar: Scalar) -> EdwardsPoint {
        self.scalar_mul(&scalar)
    }
}

impl std::iter::Sum for EdwardsPoint {
    fn sum<I: Iterator<Item = EdwardsPoint>>(iter: I) -> EdwardsPoint {
        iter.fold(EdwardsPoint::IDENTITY, |acc, p| &acc + &p)
    }
}

impl<'a> std::iter::Sum<&'a EdwardsPoint> for EdwardsPoint {
    fn sum<I: Iterator<Item = &'a EdwardsPoint>>(iter: I) -> EdwardsPoint {
        iter.fold(EdwardsPoint::IDENTITY, |acc, p| &acc + p)
    }
}
