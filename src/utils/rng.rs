//! Per-lane seeding.
//!
//! One root seed is expanded into a seed per lane with SplitMix64, and each lane then
//! draws from its own ChaCha8 stream.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Type alias for the per-lane RNG used by the reference cores.
pub type RngStream = ChaCha8Rng;

const GOLDEN_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;

/// SplitMix64 generator: a Weyl sequence passed through a bijective finalizer, so the
/// first 2^64 outputs of one sequence never repeat.
#[derive(Clone, Debug)]
pub struct SeedSequence {
    counter: u64,
}

impl SeedSequence {
    pub fn new(seed: u64) -> Self { Self { counter: seed } }

    pub fn next_subseed(&mut self) -> u64 {
        self.counter = self.counter.wrapping_add(GOLDEN_GAMMA);
        finalize(self.counter)
    }

    /// The next `n` sub-seeds.
    pub fn split_n(&mut self, n: usize) -> Vec<u64> {
        (0..n).map(|_| self.next_subseed()).collect()
    }
}

/// SplitMix64 output function (Stafford variant 13).
fn finalize(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// One seed per lane, derived from `seed`.
pub fn lane_seeds(seed: u64, lanes: usize) -> Vec<u64> {
    SeedSequence::new(seed).split_n(lanes)
}

pub fn rng_from_seed(seed: u64) -> RngStream {
    RngStream::seed_from_u64(seed)
}
