//! Curve25519 arithmetic in the twisted Edwards form used by Ed25519
//!
//! - [`FieldElement`]: integers modulo p = 2^255 - 19
//! - [`Scalar`]: integers modulo the prime subgroup order q
//! - [`EdwardsPoint`]: extended-coordinate points with compression
//!
//! Nothing in this module logs, allocates or touches global state.

pub mod field;
pub mod point;
pub mod scalar;

pub use field::FieldElement;
pub use point::{EdwardsPoint, BASEPOINT_COMPRESSED};
pub use scalar::Scalar;
