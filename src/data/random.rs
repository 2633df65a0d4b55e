use rand::prelude::*;
use rand::rngs::StdRng;

/// Uniform integer source used for shuffling and epoch sampling.
///
/// Owned by whoever needs it (a `Network` carries its own) and passed by
/// `&mut` elsewhere, so a fixed seed reproduces every draw.
#[derive(Debug, Clone)]
pub struct RandomInteger {
    rng: StdRng,
}

impl RandomInteger {
    pub fn new() -> RandomInteger {
        RandomInteger { rng: StdRng::from_entropy() }
    }

    pub fn with_seed(seed: u64) -> RandomInteger {
        RandomInteger { rng: StdRng::seed_from_u64(seed) }
    }

    /// Draws `count` integers uniformly from `[0, max)`, with replacement.
    /// Returns an empty vector when `max` is zero.
    pub fn draw(&mut self, max: usize, count: usize) -> Vec<usize> {
        if max == 0 {
            return Vec::new();
        }
        (0..count).map(|_| self.rng.gen_range(0..max)).collect()
    }

    /// A uniformly random permutation of `0..n`.
    pub fn permutation(&mut self, n: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..n).collect();
        indices.shuffle(&mut self.rng);
        indices
    }

    /// A real number drawn uniformly from `[low, high)`.
    pub fn uniform(&mut self, low: f64, high: f64) -> f64 {
        low + self.rng.gen::<f64>() * (high - low)
    }
}

impl Default for RandomInteger {
    fn default() -> Self {
        RandomInteger::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draw_stays_in_range() {
        let mut rnd = RandomInteger::with_seed(7);
        let v = rnd.draw(5, 1000);
        assert_eq!(v.len(), 1000);
        assert!(v.iter().all(|&i| i < 5));
        assert!(rnd.draw(0, 3).is_empty());
    }

    #[test]
    fn seeded_sources_agree() {
        let mut a = RandomInteger::with_seed(42);
        let mut b = RandomInteger::with_seed(42);
        assert_eq!(a.draw(100, 20), b.draw(100, 20));
        assert_eq!(a.permutation(30), b.permutation(30));
    }

    #[test]
    fn permutation_is_a_bijection() {
        let mut rnd = RandomInteger::with_seed(3);
        let mut p = rnd.permutation(50);
        p.sort_unstable();
        assert_eq!(p, (0..50).collect::<Vec<_>>());
    }
}
