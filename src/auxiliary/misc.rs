#[cfg(test)]
use std::collections::hash_map::DefaultHasher;
#[cfg(test)]
use std::hash::{Hash, Hasher};

use nalgebra::Vector3;

#[cfg(test)]
#[path = "misc_tests.rs"]
mod misc_tests;

/// The factor used to discretise floating-point components before they are hashed or compared.
/// All orientations and displacements are snapped onto a grid of spacing `1 / HASH_ROUNDING_FACTOR`.
pub(crate) const HASH_ROUNDING_FACTOR: f64 = 1.0e6;

/// A three-component vector whose components have been snapped onto the hashing grid and decoded
/// into their mantissa-exponent-sign triplets.
pub(crate) type RoundedVector3 = [(u64, i16, i8); 3];

pub trait HashableFloat {
    /// Returns a float rounded after being multiplied by a factor.
    ///
    /// Let $x$ be a float, $k$ a factor, and $[\cdot]$ denote the
    /// rounding-to-integer operation. This function yields $[x \times k] / k$.
    /// Negative zero is mapped onto positive zero so that the two share a hash.
    ///
    /// # Arguments
    ///
    /// * factor - The factor $k$ used in the rounding of the float.
    ///
    /// # Returns
    ///
    /// The rounded float.
    fn round_factor(self, factor: Self) -> Self;

    /// Returns the mantissa-exponent-sign triplet for a float.
    ///
    /// Reference: <https://stackoverflow.com/questions/39638363/how-can-i-use-a-hashmap-with-f64-as-key-in-rust>
    ///
    /// # Returns
    ///
    /// The corresponding mantissa-exponent-sign triplet.
    fn integer_decode(self) -> (u64, i16, i8);
}

impl HashableFloat for f64 {
    fn round_factor(self, factor: f64) -> Self {
        (self * factor).round() / factor + 0.0
    }

    fn integer_decode(self) -> (u64, i16, i8) {
        let bits: u64 = self.to_bits();
        let sign: i8 = if bits >> 63 == 0 { 1 } else { -1 };
        let mut exponent: i16 = ((bits >> 52) & 0x7ff) as i16;
        let mantissa = if exponent == 0 {
            (bits & 0xfffffffffffff) << 1
        } else {
            (bits & 0xfffffffffffff) | 0x10000000000000
        };

        exponent -= 1023 + 52;
        (mantissa, exponent, sign)
    }
}

/// Snaps a vector onto the hashing grid.
///
/// # Arguments
///
/// * `vec` - The vector to be discretised.
///
/// # Returns
///
/// The decoded components of the rounded vector.
pub(crate) fn round_vector(vec: &Vector3<f64>) -> RoundedVector3 {
    [
        vec[0].round_factor(HASH_ROUNDING_FACTOR).integer_decode(),
        vec[1].round_factor(HASH_ROUNDING_FACTOR).integer_decode(),
        vec[2].round_factor(HASH_ROUNDING_FACTOR).integer_decode(),
    ]
}

/// Returns the hash value of a hashable struct.
///
/// # Arguments
///
/// * t - A struct of a hashable type.
///
/// # Returns
///
/// The hash value.
#[cfg(test)]
pub(crate) fn calculate_hash<T: Hash>(t: &T) -> u64 {
    let mut s = DefaultHasher::new();
    t.hash(&mut s);
    s.finish()
}
