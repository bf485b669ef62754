//! Deterministic random number generation utilities.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// A seed for deterministic random number generation.
///
/// Using the same seed will produce the same sequence of random numbers,
/// so window shuffling is reproducible across runs.
///
/// # Example
///
/// ```rust
/// use tsreg_core::Seed;
/// use rand::Rng;
///
/// let mut rng = Seed::new(42).to_rng();
/// let mut rng2 = Seed::new(42).to_rng();
///
/// let val1: f32 = rng.gen();
/// let val2: f32 = rng2.gen();
/// assert_eq!(val1, val2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Seed(u64);

impl Seed {
    /// Create a new seed with the given value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the underlying seed value.
    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }

    /// Create a new random number generator from this seed.
    #[must_use]
    pub fn to_rng(&self) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.0)
    }

    /// Derive a new seed from this seed using a key.
    ///
    /// The loaders use this to get an independent shuffle stream per epoch
    /// from a single master seed.
    ///
    /// Keys are mixed with std's `DefaultHasher`, whose output may change
    /// between Rust releases. Derived seeds are stable for one toolchain only.
    ///
    /// # Example
    ///
    /// ```rust
    /// use tsreg_core::Seed;
    ///
    /// let master = Seed::new(42);
    /// assert_ne!(master.derive("epoch-0"), master.derive("epoch-1"));
    /// assert_eq!(master.derive("epoch-0"), master.derive("epoch-0"));
    /// ```
    #[must_use]
    pub fn derive(&self, key: &str) -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        self.0.hash(&mut hasher);
        key.hash(&mut hasher);
        Self(hasher.finish())
    }
}

impl Default for Seed {
    fn default() -> Self {
        Self::new(0)
    }
}

impl From<u64> for Seed {
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}

impl From<Seed> for u64 {
    fn from(seed: Seed) -> Self {
        seed.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_seed_reproducibility() {
        let mut rng1 = Seed::new(7).to_rng();
        let mut rng2 = Seed::new(7).to_rng();

        for _ in 0..100 {
            let a: u32 = rng1.gen();
            let b: u32 = rng2.gen();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_seed_derive() {
        let master = Seed::new(42);
        let e0 = master.derive("epoch-0");
        let e1 = master.derive("epoch-1");

        assert_ne!(e0.value(), e1.value());
        assert_eq!(e0, master.derive("epoch-0"));
    }

    #[test]
    fn test_seed_serialization() {
        let seed = Seed::new(12345);
        let json = serde_json::to_string(&seed).unwrap();
        assert_eq!(json, "12345");
        let restored: Seed = serde_json::from_str(&json).unwrap();
        assert_eq!(seed, restored);
    }
}
