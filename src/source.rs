use rand_chacha::{rand_core::SeedableRng, ChaCha8Rng};
use rand_core::RngCore;

/// Deterministic pseudorandom number generator based on ChaCha8.
///
/// Given the same 32-byte seed, the output sequence is identical across
/// platforms. Used for Miller-Rabin witness sampling, where
/// reproducibility matters and seed secrecy does not.
///
/// **Not suitable for cryptographic key generation.**
pub struct Source {
    source: ChaCha8Rng,
}

impl Source {
    /// Creates a new `Source` from a 32-byte seed.
    pub fn new(seed: [u8; 32]) -> Source {
        Source {
            source: ChaCha8Rng::from_seed(seed),
        }
    }

    #[inline(always)]
    pub fn next_u64(&mut self) -> u64 {
        self.source.next_u64()
    }

    /// Returns a uniformly distributed `u64` in `[0, max)` using rejection
    /// sampling with bitmask `mask`.
    ///
    /// `mask` should be `max.next_power_of_two() - 1` (or wider). Each
    /// iteration draws one `u64` and masks it; values `>= max` are rejected.
    #[inline(always)]
    pub fn next_u64n(&mut self, max: u64, mask: u64) -> u64 {
        let mut x: u64 = self.next_u64() & mask;
        while x >= max {
            x = self.next_u64() & mask;
        }
        x
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let seed: [u8; 32] = [17; 32];
        let mut a = Source::new(seed);
        let mut b = Source::new(seed);
        for _ in 0..64 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn bounded_draws_stay_in_range() {
        let mut s = Source::new([0; 32]);
        let max: u64 = 1000;
        let mask: u64 = max.next_power_of_two() - 1;
        for _ in 0..1000 {
            assert!(s.next_u64n(max, mask) < max);
        }
    }
}
