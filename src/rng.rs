//! Deterministic random number generation.
//!
//! Every system draws from its own ChaCha8 stream, reseeded per tick from
//! the master seed, so adding or reordering draws in one system never
//! perturbs another.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

#[derive(Debug, Clone)]
pub struct RngManager {
    master_seed: u64,
}

impl RngManager {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    /// A fresh generator for `(stream name, tick)`.
    pub fn stream(&self, name: &str, tick: u64) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.derive_seed(name, tick))
    }

    fn derive_seed(&self, name: &str, tick: u64) -> u64 {
        let mut seed = self.master_seed;
        seed = seed
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        for byte in name.bytes() {
            seed ^= byte as u64;
            seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
        }
        seed = seed
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        seed ^= tick.wrapping_mul(69069);
        seed
    }
}

impl Default for RngManager {
    fn default() -> Self {
        Self::new(42)
    }
}
