//! Value types, monoids and semirings driving every sparse kernel.
//!
//! An entry that is not stored always stands for the identity of the monoid
//! in use (`false`, `0`, or `+inf` under min). Kernels never materialize that
//! identity as a stored value.

use std::fmt::Debug;

use num_rational::Ratio;
use num_traits::{CheckedAdd, CheckedMul};

/// Exact non-negative fraction. Path lengths built from reciprocal weights
/// come out identical whatever order their terms are added in.
pub type Rational = Ratio<u64>;

pub trait Scalar: Copy + PartialEq + Debug + 'static {
    const ZERO: Self;
    const ONE: Self;

    fn plus(self, other: Self) -> Self;
    fn times(self, other: Self) -> Self;
}

/// Scalars with a total order usable by min/max monoids. `MAX` doubles as
/// the +inf identity of min-plus.
pub trait Ordered: Scalar + PartialOrd {
    const MAX: Self;
    const MIN: Self;
}

macro_rules! int_scalar {
    ($($ty:ty),*) => {
        $(
            impl Scalar for $ty {
                const ZERO: Self = 0;
                const ONE: Self = 1;

                fn plus(self, other: Self) -> Self {
                    self.saturating_add(other)
                }

                fn times(self, other: Self) -> Self {
                    self.saturating_mul(other)
                }
            }

            impl Ordered for $ty {
                const MAX: Self = <$ty>::MAX;
                const MIN: Self = <$ty>::MIN;
            }
        )*
    };
}

macro_rules! float_scalar {
    ($($ty:ty),*) => {
        $(
            impl Scalar for $ty {
                const ZERO: Self = 0.0;
                const ONE: Self = 1.0;

                fn plus(self, other: Self) -> Self {
                    self + other
                }

                fn times(self, other: Self) -> Self {
                    self * other
                }
            }

            impl Ordered for $ty {
                const MAX: Self = <$ty>::INFINITY;
                const MIN: Self = <$ty>::NEG_INFINITY;
            }
        )*
    };
}

int_scalar!(i32, i64, u32, u64, usize);
float_scalar!(f32, f64);

impl Scalar for bool {
    const ZERO: Self = false;
    const ONE: Self = true;

    fn plus(self, other: Self) -> Self {
        self || other
    }

    fn times(self, other: Self) -> Self {
        self && other
    }
}

impl Ordered for bool {
    const MAX: Self = true;
    const MIN: Self = false;
}

// Overflow saturates to `MAX`, the min-plus infinity, like the integer types.
impl Scalar for Rational {
    const ZERO: Self = Ratio::new_raw(0, 1);
    const ONE: Self = Ratio::new_raw(1, 1);

    fn plus(self, other: Self) -> Self {
        self.checked_add(&other).unwrap_or(Self::MAX)
    }

    fn times(self, other: Self) -> Self {
        self.checked_mul(&other).unwrap_or(Self::MAX)
    }
}

impl Ordered for Rational {
    const MAX: Self = Ratio::new_raw(u64::MAX, 1);
    const MIN: Self = Ratio::new_raw(0, 1);
}

/// `1 / count`, or `None` for a zero count.
pub fn reciprocal(count: u64) -> Option<Rational> {
    (count > 0).then(|| Ratio::new_raw(1, count))
}

pub trait Monoid<T> {
    fn identity(&self) -> T;
    fn combine(&self, a: T, b: T) -> T;
}

pub trait Semiring<T> {
    /// Identity of the aggregate operation; the value every absent entry stands for.
    fn zero(&self) -> T;
    fn add(&self, a: T, b: T) -> T;
    fn multiply(&self, a: T, b: T) -> T;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Plus;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Times;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Min;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Max;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Lor;

impl<T: Scalar> Monoid<T> for Plus {
    fn identity(&self) -> T {
        T::ZERO
    }

    fn combine(&self, a: T, b: T) -> T {
        a.plus(b)
    }
}

impl<T: Scalar> Monoid<T> for Times {
    fn identity(&self) -> T {
        T::ONE
    }

    fn combine(&self, a: T, b: T) -> T {
        a.times(b)
    }
}

impl<T: Ordered> Monoid<T> for Min {
    fn identity(&self) -> T {
        T::MAX
    }

    fn combine(&self, a: T, b: T) -> T {
        if b < a { b } else { a }
    }
}

impl<T: Ordered> Monoid<T> for Max {
    fn identity(&self) -> T {
        T::MIN
    }

    fn combine(&self, a: T, b: T) -> T {
        if b > a { b } else { a }
    }
}

impl Monoid<bool> for Lor {
    fn identity(&self) -> bool {
        false
    }

    fn combine(&self, a: bool, b: bool) -> bool {
        a || b
    }
}

/// Reachability: `AND` to combine, `OR` to aggregate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LorLand;

/// Path counting: `*` to combine, `+` to aggregate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlusTimes;

/// Shortest paths: `+` to combine, `min` to aggregate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MinPlus;

impl Semiring<bool> for LorLand {
    fn zero(&self) -> bool {
        false
    }

    fn add(&self, a: bool, b: bool) -> bool {
        a || b
    }

    fn multiply(&self, a: bool, b: bool) -> bool {
        a && b
    }
}

impl<T: Scalar> Semiring<T> for PlusTimes {
    fn zero(&self) -> T {
        T::ZERO
    }

    fn add(&self, a: T, b: T) -> T {
        a.plus(b)
    }

    fn multiply(&self, a: T, b: T) -> T {
        a.times(b)
    }
}

impl<T: Ordered> Semiring<T> for MinPlus {
    fn zero(&self) -> T {
        T::MAX
    }

    fn add(&self, a: T, b: T) -> T {
        Min.combine(a, b)
    }

    fn multiply(&self, a: T, b: T) -> T {
        a.plus(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_plus_treats_max_as_infinity() {
        assert_eq!(Semiring::<f64>::zero(&MinPlus), f64::INFINITY);
        assert_eq!(MinPlus.add(3.0_f64, f64::INFINITY), 3.0);
        assert_eq!(MinPlus.multiply(0.5_f64, 0.25), 0.75);
    }

    #[test]
    fn integer_plus_saturates() {
        assert_eq!(Plus.combine(u32::MAX, 1), u32::MAX);
        assert_eq!(Monoid::<i64>::identity(&Plus), 0);
    }

    #[test]
    fn rational_sums_are_exact() {
        let third = reciprocal(3).expect("third");
        let seventh = reciprocal(7).expect("seventh");
        assert_eq!(MinPlus.multiply(third, seventh), Rational::new(10, 21));
        assert_eq!(
            MinPlus.multiply(MinPlus.multiply(third, seventh), third),
            MinPlus.multiply(third, MinPlus.multiply(third, seventh))
        );
        assert_eq!(MinPlus.add(Rational::MAX, third), third);
        assert_eq!(Plus.combine(Rational::MAX, Rational::ONE), Rational::MAX);
        assert_eq!(reciprocal(0), None);
    }

    #[test]
    fn boolean_semiring_is_reachability() {
        assert!(LorLand.multiply(true, true));
        assert!(!LorLand.multiply(true, false));
        assert!(LorLand.add(false, true));
        assert!(Lor.combine(true, false));
    }
}
