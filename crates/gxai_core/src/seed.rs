//! Deterministic random number generation for explainers and model init.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// A seed for deterministic random number generation.
///
/// Random explanations and model weight initialization draw from streams
/// derived from one seed, so a run can be repeated exactly.
///
/// # Example
///
/// ```rust
/// use gxai_core::Seed;
/// use rand::Rng;
///
/// let mut rng = Seed::new(42).to_rng();
/// let mut rng2 = Seed::new(42).to_rng();
///
/// let val1: f32 = rng.gen();
/// let val2: f32 = rng2.gen();
/// assert_eq!(val1, val2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
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

    /// Create a ChaCha8 generator from this seed.
    #[must_use]
    pub fn to_rng(&self) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.0)
    }

    /// Derive an independent stream for `key` from this seed.
    ///
    /// Uses FNV-1a so derived values are stable across platforms and releases.
    #[must_use]
    pub fn derive(&self, key: &str) -> Self {
        const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
        const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

        let mut hash = FNV_OFFSET;
        for byte in self.0.to_le_bytes().iter().chain(key.as_bytes()) {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(FNV_PRIME);
        }
        Self(hash)
    }
}

impl From<u64> for Seed {
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}
