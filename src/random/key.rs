//! Splittable random key

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

/// ChaCha stream reserved for deriving sub-keys.
const SPLIT_STREAM: u64 = 0x5eed;

/// A deterministic, splittable random key
///
/// A key is a plain value: copying it and sampling twice yields the same
/// numbers. Use [`PrngKey::split`] to derive independent sub-keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrngKey {
    seed: u64,
}

impl PrngKey {
    /// Create a key from a seed
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// The raw seed of this key
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Derive `n` independent sub-keys
    pub fn split(&self, n: usize) -> Vec<PrngKey> {
        let mut stream = self.split_stream();
        (0..n).map(|_| PrngKey::new(stream.next_u64())).collect()
    }

    /// Derive a fixed number of independent sub-keys
    pub fn split_n<const N: usize>(&self) -> [PrngKey; N] {
        let mut stream = self.split_stream();
        std::array::from_fn(|_| PrngKey::new(stream.next_u64()))
    }

    /// Generator for the samples owned by this key
    pub fn rng(&self) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.seed)
    }

    /// A single uniform draw in `[0, 1)`
    pub fn uniform(&self) -> f64 {
        self.rng().gen::<f64>()
    }

    /// `n` uniform draws in `[low, high)`; returns `low` everywhere when the range is empty
    pub fn uniform_vec(&self, n: usize, low: f64, high: f64) -> Vec<f64> {
        let mut rng = self.rng();
        (0..n)
            .map(|_| low + (high - low) * rng.gen::<f64>())
            .collect()
    }

    /// `n` standard normal draws
    pub fn normal_vec(&self, n: usize) -> Vec<f64> {
        let mut rng = self.rng();
        (0..n).map(|_| rng.sample(StandardNormal)).collect()
    }

    /// A `rows x cols` matrix of standard normal draws, row-major
    pub fn normal_matrix(&self, rows: usize, cols: usize) -> Vec<Vec<f64>> {
        let mut rng = self.rng();
        (0..rows)
            .map(|_| (0..cols).map(|_| rng.sample(StandardNormal)).collect())
            .collect()
    }

    fn split_stream(&self) -> ChaCha8Rng {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        rng.set_stream(SPLIT_STREAM);
        rng
    }
}

impl From<u64> for PrngKey {
    fn from(seed: u64) -> Self {
        Self::new(seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_key_same_samples() {
        let key = PrngKey::new(42);
        assert_eq!(key.normal_vec(8), key.normal_vec(8));
        assert_eq!(key.uniform(), key.uniform());
    }

    #[test]
    fn test_split_is_deterministic_and_distinct() {
        let key = PrngKey::new(7);
        let a = key.split(4);
        let b = key.split(4);
        assert_eq!(a, b);

        let mut seeds: Vec<u64> = a.iter().map(PrngKey::seed).collect();
        seeds.push(key.seed());
        seeds.sort_unstable();
        seeds.dedup();
        assert_eq!(seeds.len(), 5);
    }

    #[test]
    fn test_split_n_matches_split() {
        let key = PrngKey::new(3);
        let arr: [PrngKey; 3] = key.split_n();
        assert_eq!(arr.to_vec(), key.split(3));
    }

    #[test]
    fn test_uniform_vec_range() {
        let key = PrngKey::new(11);
        for x in key.uniform_vec(100, -2.0, 3.0) {
            assert!((-2.0..3.0).contains(&x));
        }
        assert!(key.uniform_vec(5, 0.0, 0.0).iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_normal_matrix_shape() {
        let m = PrngKey::new(1).normal_matrix(3, 5);
        assert_eq!(m.len(), 3);
        assert!(m.iter().all(|row| row.len() == 5));
    }
}
