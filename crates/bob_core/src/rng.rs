//! Seeded random numbers for the few decisions that are allowed to be random.
//!
//! The core never touches system randomness. A match that should pick an
//! opening at random gets its seed from configuration, so replays of the
//! same seed pick the same opening.

/// Simple deterministic RNG (64-bit LCG).
#[derive(Debug, Clone)]
pub struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    /// Create a generator from a seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            state: seed.wrapping_add(0x9E37_79B9_7F4A_7C15),
        }
    }

    /// Next raw value. The low bits of an LCG are weak, so only the upper
    /// 48 bits are handed out.
    pub fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(0x5851_F42D_4C95_7F2D)
            .wrapping_add(0x1405_7B7E_F767_814F);
        self.state >> 16
    }

    /// Uniform index in `0..len`. Returns `None` for an empty range.
    pub fn next_index(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        Some((self.next_u64() % len as u64) as usize)
    }

    /// Uniform value in `[0, 1)`.
    pub fn next_unit(&mut self) -> f64 {
        (self.next_u64() % 1_000_000) as f64 / 1_000_000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = DeterministicRng::new(42);
        let mut b = DeterministicRng::new(42);
        for _ in 0..100 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn test_next_index_bounds() {
        let mut rng = DeterministicRng::new(7);
        assert_eq!(rng.next_index(0), None);
        for _ in 0..1000 {
            let i = rng.next_index(5).unwrap();
            assert!(i < 5);
        }
    }

    #[test]
    fn test_next_index_covers_range() {
        let mut rng = DeterministicRng::new(3);
        let mut seen = [false; 4];
        for _ in 0..200 {
            seen[rng.next_index(4).unwrap()] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn test_next_unit_range() {
        let mut rng = DeterministicRng::new(11);
        for _ in 0..1000 {
            let v = rng.next_unit();
            assert!((0.0..1.0).contains(&v));
        }
    }
}
