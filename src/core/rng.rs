//! Deterministic random number generation for script effects.
//!
//! Audio actions pick clips and pitch variation from this RNG, so a scene
//! run from the same seed with the same stimuli makes the same choices.
//!
//! ```
//! use rust_triggers::core::ScriptRng;
//!
//! let mut a = ScriptRng::new(7);
//! let mut b = ScriptRng::new(7);
//! assert_eq!(a.choose_index(10), b.choose_index(10));
//! ```

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Seeded ChaCha8 RNG owned by the world.
#[derive(Clone, Debug)]
pub struct ScriptRng {
    inner: ChaCha8Rng,
    seed: u64,
}

impl ScriptRng {
    /// Create a new RNG with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// The seed this RNG was created with.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Pick an index in `0..len`. Returns `None` for an empty range.
    pub fn choose_index(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            None
        } else {
            Some(self.inner.gen_range(0..len))
        }
    }

    /// A symmetric jitter in `[-amount, amount]`; zero for non-positive amounts.
    pub fn jitter(&mut self, amount: f32) -> f32 {
        if amount > 0.0 {
            self.inner.gen_range(-amount..=amount)
        } else {
            0.0
        }
    }

    /// Restart the sequence from the original seed.
    pub fn reseed(&mut self) {
        self.inner = ChaCha8Rng::seed_from_u64(self.seed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_determinism() {
        let mut rng1 = ScriptRng::new(42);
        let mut rng2 = ScriptRng::new(42);

        for _ in 0..100 {
            assert_eq!(rng1.choose_index(1000), rng2.choose_index(1000));
        }
    }

    #[test]
    fn test_different_seeds() {
        let mut rng1 = ScriptRng::new(1);
        let mut rng2 = ScriptRng::new(2);

        let seq1: Vec<_> = (0..10).map(|_| rng1.choose_index(1000)).collect();
        let seq2: Vec<_> = (0..10).map(|_| rng2.choose_index(1000)).collect();

        assert_ne!(seq1, seq2);
    }

    #[test]
    fn test_choose_index_empty() {
        let mut rng = ScriptRng::new(42);
        assert_eq!(rng.choose_index(0), None);
        assert_eq!(rng.choose_index(1), Some(0));
    }

    #[test]
    fn test_jitter_bounds() {
        let mut rng = ScriptRng::new(42);
        for _ in 0..100 {
            let j = rng.jitter(0.25);
            assert!((-0.25..=0.25).contains(&j));
        }
        assert_eq!(rng.jitter(0.0), 0.0);
    }

    #[test]
    fn test_reseed_replays_sequence() {
        let mut rng = ScriptRng::new(9);
        let first: Vec<_> = (0..5).map(|_| rng.choose_index(100)).collect();
        rng.reseed();
        let second: Vec<_> = (0..5).map(|_| rng.choose_index(100)).collect();
        assert_eq!(first, second);
    }
}
