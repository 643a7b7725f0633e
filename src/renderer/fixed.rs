//! 20.12 fixed-point numbers for rasterizer parameters.
//!
//! The portal renderer works in `f32` and converts once per column or span;
//! the inner pixel loops of a [`Rasterizer`](super::Rasterizer) only add and
//! shift.

use std::ops::{Add, AddAssign, Mul, Neg, Sub};

pub const FRACBITS: u32 = 12;
pub const FRACUNIT: i32 = 1 << FRACBITS;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fixed(pub i32);

impl Fixed {
    pub const ZERO: Fixed = Fixed(0);
    pub const ONE: Fixed = Fixed(FRACUNIT);

    /// Saturates at the `i32` range.
    #[inline]
    pub fn from_f32(f: f32) -> Self {
        Fixed((f * FRACUNIT as f32) as i32)
    }

    #[inline]
    pub const fn from_int(i: i32) -> Self {
        Fixed(i << FRACBITS)
    }

    #[inline]
    pub fn to_f32(self) -> f32 {
        self.0 as f32 / FRACUNIT as f32
    }

    /// Integer part, rounded towards negative infinity.
    #[inline]
    pub fn floor(self) -> i32 {
        self.0 >> FRACBITS
    }

    /// Integer part wrapped into a power-of-two `size`.
    #[inline]
    pub fn wrap(self, size: u32) -> usize {
        (self.floor() & (size as i32 - 1)) as usize
    }
}

impl Add for Fixed {
    type Output = Self;
    #[inline]
    fn add(self, o: Self) -> Self {
        Fixed(self.0.wrapping_add(o.0))
    }
}

impl AddAssign for Fixed {
    #[inline]
    fn add_assign(&mut self, o: Self) {
        self.0 = self.0.wrapping_add(o.0);
    }
}

impl Sub for Fixed {
    type Output = Self;
    #[inline]
    fn sub(self, o: Self) -> Self {
        Fixed(self.0.wrapping_sub(o.0))
    }
}

impl Neg for Fixed {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Fixed(self.0.wrapping_neg())
    }
}

/// Fixed × fixed, with a 64-bit intermediate.
impl Mul for Fixed {
    type Output = Self;
    #[inline]
    fn mul(self, o: Self) -> Self {
        Fixed(((self.0 as i64 * o.0 as i64) >> FRACBITS) as i32)
    }
}

/// Fixed × integer.
impl Mul<i32> for Fixed {
    type Output = Self;
    #[inline]
    fn mul(self, o: i32) -> Self {
        Fixed(self.0.wrapping_mul(o))
    }
}
