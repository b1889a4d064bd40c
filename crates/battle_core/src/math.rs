//! Fixed-point vector math for the battle simulation.
//!
//! Every spatial quantity in the simulation (positions, ranges, speeds,
//! timers) is a [`Fixed`] so that two runs with the same seed produce
//! bit-identical battles. Square roots are computed on the raw bits with
//! an integer Newton iteration, never through `f64`.

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

/// Fixed-point number type for all simulation math.
///
/// 32 integer bits, 32 fractional bits.
pub type Fixed = I32F32;

const FRAC_BITS: u32 = 32;

/// Build a [`Fixed`] from an integer in a `const` context.
#[must_use]
pub const fn fixed_int(n: i64) -> Fixed {
    Fixed::from_bits(n << FRAC_BITS)
}

/// Build a [`Fixed`] from `num / den` in a `const` context.
///
/// Rounds to the nearest last fractional bit, so that `den` steps of
/// `fixed_ratio(1, den)` never fall short of one.
#[must_use]
pub const fn fixed_ratio(num: i64, den: i64) -> Fixed {
    let scaled = num << FRAC_BITS;
    let half = den.abs() / 2;
    let rounded = if scaled >= 0 { scaled + half } else { scaled - half };
    Fixed::from_bits(rounded / den)
}

/// Fixed-point 2D vector.
///
/// Plain value type; every operation returns a new vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vec2Fixed {
    /// X coordinate.
    #[serde(with = "fixed_serde")]
    pub x: Fixed,
    /// Y coordinate.
    #[serde(with = "fixed_serde")]
    pub y: Fixed,
}

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

/// Serde support for human-authored decimal values.
///
/// Data files carry plain decimals like `1.5`; they are converted to
/// [`Fixed`] once at load time.
pub mod fixed_decimal {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialize a fixed-point number as a decimal.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(value.to_num::<f64>())
    }

    /// Deserialize a decimal into a fixed-point number.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = f64::deserialize(deserializer)?;
        Fixed::checked_from_num(value)
            .ok_or_else(|| serde::de::Error::custom(format!("value {value} out of range")))
    }
}

impl Vec2Fixed {
    /// Create a new fixed-point vector.
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Zero vector.
    pub const ZERO: Self = Self {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
    };

    /// Convenience constructor from integer coordinates.
    #[must_use]
    pub fn from_ints(x: i32, y: i32) -> Self {
        Self::new(Fixed::from_num(x), Fixed::from_num(y))
    }

    /// Convenience constructor from `f32` coordinates (setup and tests only).
    #[must_use]
    pub fn from_f32(x: f32, y: f32) -> Self {
        Self::new(Fixed::from_num(x), Fixed::from_num(y))
    }

    /// Lossy conversion for the presentation layer.
    #[must_use]
    pub fn to_f32(self) -> (f32, f32) {
        (self.x.to_num::<f32>(), self.y.to_num::<f32>())
    }

    /// Calculate squared distance (avoids sqrt for comparisons).
    ///
    /// Saturates at [`Fixed::MAX`] for points more than about 46341 apart.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> Fixed {
        let dx = self.x.saturating_sub(other.x);
        let dy = self.y.saturating_sub(other.y);
        dx.saturating_mul(dx).saturating_add(dy.saturating_mul(dy))
    }

    /// Euclidean distance between two points.
    ///
    /// Computed on the raw bits in 128-bit integers, so it is exact for any
    /// pair of points.
    #[must_use]
    pub fn distance(self, other: Self) -> Fixed {
        hypot_bits(
            i128::from(self.x.to_bits()) - i128::from(other.x.to_bits()),
            i128::from(self.y.to_bits()) - i128::from(other.y.to_bits()),
        )
    }

    /// Dot product of two vectors. Saturating.
    #[must_use]
    pub fn dot(self, other: Self) -> Fixed {
        self.x
            .saturating_mul(other.x)
            .saturating_add(self.y.saturating_mul(other.y))
    }

    /// Length of the vector.
    #[must_use]
    pub fn length(self) -> Fixed {
        hypot_bits(i128::from(self.x.to_bits()), i128::from(self.y.to_bits()))
    }

    /// Multiply both components by a scalar.
    #[must_use]
    pub fn scale(self, factor: Fixed) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// Unit vector in the same direction.
    ///
    /// The zero vector normalizes to the zero vector.
    #[must_use]
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len == Fixed::ZERO {
            return Self::ZERO;
        }

        Self::new(self.x / len, self.y / len)
    }

    /// Clamp each component into `[min, max]`.
    #[must_use]
    pub fn clamp(self, min: Self, max: Self) -> Self {
        Self::new(self.x.clamp(min.x, max.x), self.y.clamp(min.y, max.y))
    }
}

/// Square root of a fixed-point number.
///
/// Exact to the last fractional bit (floor of the true root). Negative
/// inputs return zero.
#[must_use]
pub fn fixed_sqrt(value: Fixed) -> Fixed {
    if value <= Fixed::ZERO {
        return Fixed::ZERO;
    }

    // sqrt(v / 2^32) * 2^32 == sqrt(v * 2^32)
    let scaled = (value.to_bits() as u128) << FRAC_BITS;
    Fixed::from_bits(isqrt(scaled) as i64)
}

/// `sqrt(dx² + dy²)` for raw fixed-point bit differences.
fn hypot_bits(dx: i128, dy: i128) -> Fixed {
    let dx = dx.unsigned_abs();
    let dy = dy.unsigned_abs();
    let sum = dx.saturating_mul(dx).saturating_add(dy.saturating_mul(dy));
    // Bits of both squares carry 64 fractional bits; the root carries 32.
    let root = isqrt(sum).min(i64::MAX as u128);
    Fixed::from_bits(root as i64)
}

fn isqrt(n: u128) -> u128 {
    if n < 2 {
        return n;
    }

    let bits = 128 - n.leading_zeros();
    let mut x: u128 = 1 << ((bits + 1) / 2);
    loop {
        let y = (x + n / x) / 2;
        if y >= x {
            return x;
        }
        x = y;
    }
}

impl std::ops::Add for Vec2Fixed {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl std::ops::Sub for Vec2Fixed {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl std::ops::Mul<Fixed> for Vec2Fixed {
    type Output = Self;

    fn mul(self, rhs: Fixed) -> Self::Output {
        self.scale(rhs)
    }
}

impl std::ops::Neg for Vec2Fixed {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self::new(-self.x, -self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec2_distance_squared() {
        let a = Vec2Fixed::from_ints(3, 0);
        let b = Vec2Fixed::from_ints(0, 4);
        // 3² + 4² = 25
        assert_eq!(a.distance_squared(b), Fixed::from_num(25));
    }

    #[test]
    fn test_vec2_distance_exact_for_perfect_squares() {
        let a = Vec2Fixed::from_ints(3, 0);
        let b = Vec2Fixed::from_ints(0, 4);
        assert_eq!(a.distance(b), Fixed::from_num(5));
        assert_eq!(b.distance(a), Fixed::from_num(5));
    }

    #[test]
    fn test_distance_between_far_points_is_exact() {
        let origin = Vec2Fixed::from_ints(0, 0);
        assert_eq!(origin.distance(Vec2Fixed::from_ints(50_000, 0)), Fixed::from_num(50_000));
        assert_eq!(
            Vec2Fixed::from_ints(-300_000, 0).distance(Vec2Fixed::from_ints(0, 400_000)),
            Fixed::from_num(500_000)
        );

        let corner = Vec2Fixed::new(Fixed::MAX, Fixed::MAX);
        let far = Vec2Fixed::new(Fixed::MIN, Fixed::MIN);
        assert_eq!(corner.distance(far), Fixed::MAX);
    }

    #[test]
    fn test_squared_distance_and_dot_saturate() {
        let far = Vec2Fixed::from_ints(60_000, 0);
        assert_eq!(Vec2Fixed::ZERO.distance_squared(far), Fixed::MAX);
        assert_eq!(far.dot(far), Fixed::MAX);
        assert_eq!(far.length(), Fixed::from_num(60_000));
        assert_eq!(far.normalize(), Vec2Fixed::from_ints(1, 0));
    }

    #[test]
    fn test_sqrt_edge_cases() {
        assert_eq!(fixed_sqrt(Fixed::ZERO), Fixed::ZERO);
        assert_eq!(fixed_sqrt(Fixed::from_num(-4)), Fixed::ZERO);
        assert_eq!(fixed_sqrt(Fixed::ONE), Fixed::ONE);
        assert_eq!(fixed_sqrt(Fixed::from_num(1_000_000)), Fixed::from_num(1000));

        let root_two = fixed_sqrt(Fixed::from_num(2)).to_num::<f64>();
        assert!((root_two - std::f64::consts::SQRT_2).abs() < 1e-8);
    }

    #[test]
    fn test_const_constructors() {
        assert_eq!(fixed_int(7), Fixed::from_num(7));
        assert_eq!(fixed_int(-3), Fixed::from_num(-3));
        assert_eq!(fixed_ratio(3, 2), Fixed::from_num(1.5));
        assert!((fixed_ratio(1, 10).to_num::<f64>() - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_normalize_zero_vector_is_zero() {
        assert_eq!(Vec2Fixed::ZERO.normalize(), Vec2Fixed::ZERO);

        let p = Vec2Fixed::from_ints(12, -7);
        assert_eq!((p - p).normalize(), Vec2Fixed::ZERO);
    }

    #[test]
    fn test_vec2_normalize() {
        let norm = Vec2Fixed::from_ints(3, 4).normalize();

        let epsilon = Fixed::ONE / Fixed::from_num(10000);
        assert!((norm.length() - Fixed::ONE).abs() < epsilon);

        // x/y ratio matches the original 3/4
        let ratio_diff = (norm.x * Fixed::from_num(4)) - (norm.y * Fixed::from_num(3));
        assert!(ratio_diff.abs() < epsilon, "direction not preserved: {ratio_diff:?}");
    }

    #[test]
    fn test_vec2_operators() {
        let a = Vec2Fixed::from_ints(2, 3);
        let b = Vec2Fixed::from_ints(4, -1);
        assert_eq!(a + b, Vec2Fixed::from_ints(6, 2));
        assert_eq!(a - b, Vec2Fixed::from_ints(-2, 4));
        assert_eq!(a * Fixed::from_num(2), Vec2Fixed::from_ints(4, 6));
        assert_eq!(-a, Vec2Fixed::from_ints(-2, -3));
        assert_eq!(a.dot(b), Fixed::from_num(5));
    }

    #[test]
    fn test_vec2_clamp() {
        let p = Vec2Fixed::from_ints(-10, 900);
        let clamped = p.clamp(Vec2Fixed::from_ints(50, 100), Vec2Fixed::from_ints(974, 700));
        assert_eq!(clamped, Vec2Fixed::from_ints(50, 700));
    }
}
