//! Reproducible fallback selection.

use std::time::{SystemTime, UNIX_EPOCH};

use creative_core::types::{CreativeDimensionValue, Dimension};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn fnv1a(mut hash: u64, bytes: &[u8]) -> u64 {
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Derives per-call seeds from `(campaign_id, request_index, attempt)`.
///
/// Without clock salting the same triple always yields the same seed, which
/// keeps tests and replays reproducible.
#[derive(Debug, Clone, Copy)]
pub struct SeedDeriver {
    salt_with_clock: bool,
    salt: u64,
}

impl SeedDeriver {
    pub fn new(salt_with_clock: bool) -> Self {
        Self {
            salt_with_clock,
            salt: 0,
        }
    }

    /// Deterministic deriver with a fixed salt.
    pub fn fixed(salt: u64) -> Self {
        Self {
            salt_with_clock: false,
            salt,
        }
    }

    pub fn derive(&self, campaign_id: &str, request_index: u64, attempt: u32) -> u64 {
        let mut hash = fnv1a(FNV_OFFSET, campaign_id.as_bytes());
        hash = fnv1a(hash, &request_index.to_le_bytes());
        hash = fnv1a(hash, &attempt.to_le_bytes());
        hash = fnv1a(hash, &self.salt.to_le_bytes());
        if self.salt_with_clock {
            let nanos = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or_default();
            hash = fnv1a(hash, &nanos.to_le_bytes());
        }
        hash
    }

    /// Split a call seed into an independent seed per dimension.
    pub fn for_dimension(seed: u64, dimension: Dimension) -> u64 {
        fnv1a(fnv1a(FNV_OFFSET, &seed.to_le_bytes()), dimension.as_str().as_bytes())
    }
}

impl Default for SeedDeriver {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Uniform choice driven by an explicit seed. Never fails on a non-empty slice.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeededRandomPicker;

impl SeededRandomPicker {
    pub fn pick<'a>(
        &self,
        candidates: &'a [CreativeDimensionValue],
        seed: u64,
    ) -> Option<&'a CreativeDimensionValue> {
        let mut rng = StdRng::seed_from_u64(seed);
        candidates.choose(&mut rng)
    }
}
