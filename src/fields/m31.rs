use core::fmt;
use core::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Rem, RemAssign, Sub, SubAssign};

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::fields::{ComplexConjugate, FieldExpOps};
use crate::impl_field;

/// The Mersenne-31 prime: `2^31 - 1`.
pub const P: u32 = 0x7fffffff;
pub const P2: u64 = (P as u64) * (P as u64);

/// An element of the Mersenne-31 field `F31 = Z / (2^31 - 1)`.
///
/// The inner value is always held reduced, i.e. in `[0, P)`; the two
/// representations of zero (`0` and `P`) never appear after reduction, so
/// equality is plain `u32` equality.
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Pod, Zeroable, Deserialize, Serialize)]
#[repr(transparent)]
pub struct M31(u32);
pub type BaseField = M31;

/// Branch-free reduction of a 64-bit accumulator modulo `2^31 - 1`.
const fn reduce(val: u64) -> u32 {
    (((((val >> MODULUS_BITS) + val + 1) >> MODULUS_BITS) + val) & (P as u64)) as u32
}

const MODULUS_BITS: u32 = 31;

impl M31 {
    pub const fn from_u32_unchecked(arg: u32) -> Self {
        Self(arg)
    }

    pub const fn reduce(val: u64) -> Self {
        Self(reduce(val))
    }

    pub const fn to_bytes(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }

    pub const fn inner(self) -> u32 {
        self.0
    }
}

impl fmt::Display for M31 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for M31 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add for M31 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::reduce(self.0 as u64 + rhs.0 as u64)
    }
}

impl Sub for M31 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::reduce(self.0 as u64 + P as u64 - rhs.0 as u64)
    }
}

impl Mul for M31 {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        Self::reduce(self.0 as u64 * rhs.0 as u64)
    }
}

impl Neg for M31 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::reduce(P as u64 - self.0 as u64)
    }
}

impl num_traits::Zero for M31 {
    fn zero() -> Self {
        Self(0)
    }
    fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl num_traits::One for M31 {
    fn one() -> Self {
        Self(1)
    }
}

impl From<u32> for M31 {
    fn from(value: u32) -> Self {
        Self::reduce(value as u64)
    }
}

impl From<usize> for M31 {
    fn from(value: usize) -> Self {
        Self::from(value as u32)
    }
}

impl From<i32> for M31 {
    fn from(value: i32) -> Self {
        Self::reduce(value.rem_euclid(P as i32) as u64)
    }
}

impl ComplexConjugate for M31 {
    fn complex_conjugate(&self) -> Self {
        *self
    }
}

impl FieldExpOps for M31 {
    fn inverse(&self) -> Self {
        assert!(!num_traits::Zero::is_zero(self), "0 has no inverse");
        self.pow(P - 2)
    }
}

impl_field!(M31, P);
