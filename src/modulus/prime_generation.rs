//! Generation of NTT-friendly primes of a prescribed bit-length bucket.

use crate::context::Platform;
use crate::error::{Error, Result};
use crate::modulus::primality::is_prime;
use crate::source::Source;

/// Miller-Rabin rounds used on every candidate (error probability 2^-120).
pub const PRIMALITY_REPS: u32 = 60;

const WITNESS_SEED: [u8; 32] = [0u8; 32];

/// Stateful generator of primes `p = 2^k * t * m + 1` with `t` odd and
/// `k` maximal, in the window `(3/4) * 2^len <= p < 2^len`.
///
/// The `(p - 1)`-divisibility by `2^k * m` is what makes the m-th
/// cyclotomic NTT well-defined modulo `p`. Successive calls to
/// [`next`](Self::next) scan `t` upward within each `k` and `k` strictly
/// downward, so a single generator never emits the same prime twice.
pub struct PrimeGenerator {
    len: u64,
    m: u64,
    k: u64,
    t: u64,
    source: Source,
}

impl PrimeGenerator {
    /// Creates a generator for primes of bit-length `len` compatible
    /// with the `m`-th cyclotomic ring.
    pub fn new(len: u64, m: u64, platform: &Platform) -> Result<Self> {
        if len < 2 || len > platform.sp_nbits() {
            return Err(Error::BadParameter(format!(
                "prime bit-length {len} outside [2, {}]",
                platform.sp_nbits()
            )));
        }
        if m == 0 || m >= platform.sp_bound() {
            return Err(Error::BadParameter(format!(
                "m = {m} outside (0, 2^{})",
                platform.sp_nbits()
            )));
        }

        // smallest k with 2^k * m > 2^{len-2}
        let mut k: u64 = 0;
        while (m << k) <= (1u64 << (len - 2)) {
            k += 1;
        }

        // with this k the t-window lies below 4, so t = 8 forces the
        // first call to next() to move to a fresh k-value
        Ok(Self {
            len,
            m,
            k,
            t: 8,
            source: Source::new(WITNESS_SEED),
        })
    }

    /// Returns the next prime of the prescribed shape, or
    /// [`Error::Exhausted`] once every `(k, t)` pair in range has been
    /// scanned.
    pub fn next(&mut self) -> Result<u64> {
        // Candidates are 2^k * t * m + 1 for odd t in [tlb, tub), where
        // tlb = ceil((3 * 2^{len-2} - 1) / (2^k * m)) and
        // tub = ceil((2^len - 1) / (2^k * m)); for 2^k * m <= 2^{len-2}
        // this interval is non-empty.
        let mut tub = ((1u64 << self.len) - 1).div_ceil(self.m << self.k);

        loop {
            self.t += 1;

            if self.t >= tub {
                // move to a smaller k, reset t and tub; k runs down to 0
                // for even m and down to 1 for odd m
                let klb = u64::from(self.m % 2 != 0);
                if self.k <= klb {
                    return Err(Error::Exhausted {
                        len: self.len,
                        m: self.m,
                    });
                }
                self.k -= 1;
                self.t = (3 * (1u64 << (self.len - 2)) - 1).div_ceil(self.m << self.k);
                tub = ((1u64 << self.len) - 1).div_ceil(self.m << self.k);
            }

            if self.t % 2 == 0 {
                continue;
            }

            let cand = ((self.t * self.m) << self.k) + 1;
            debug_assert!(
                cand >= 3 * (1u64 << (self.len - 2)) && cand < (1u64 << self.len),
                "candidate {cand} outside its window"
            );

            if is_prime(cand, PRIMALITY_REPS, &mut self.source) {
                return Ok(cand);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(len: u64, m: u64, count: usize) -> Vec<u64> {
        let platform = Platform::default();
        let mut generator = PrimeGenerator::new(len, m, &platform).unwrap();
        (0..count).map(|_| generator.next().unwrap()).collect()
    }

    #[test]
    fn primes_have_the_prescribed_shape() {
        let (len, m) = (30u64, 1u64 << 10);
        for q in collect(len, m, 8) {
            assert!(q >= 3 * (1u64 << (len - 2)) && q < (1u64 << len));
            assert_eq!((q - 1) % m, 0);
            assert!(is_prime(q, 40, &mut Source::new([1; 32])));
        }
    }

    #[test]
    fn t_is_odd_and_k_never_increases() {
        let (len, m) = (35u64, 1u64 << 12);
        let mut prev_k = u64::MAX;
        for q in collect(len, m, 6) {
            let k = ((q - 1) / m).trailing_zeros() as u64;
            let t = (q - 1) >> (k + m.trailing_zeros() as u64);
            assert_eq!(t % 2, 1);
            assert!(k <= prev_k);
            prev_k = k;
        }
    }

    #[test]
    fn no_duplicates() {
        let mut primes = collect(25, 1 << 8, 16);
        let n = primes.len();
        primes.sort_unstable();
        primes.dedup();
        assert_eq!(primes.len(), n);
    }

    #[test]
    fn odd_m_keeps_one_factor_of_two() {
        for q in collect(24, 45, 4) {
            assert_eq!((q - 1) % (2 * 45), 0);
        }
    }

    #[test]
    fn bad_arguments_are_rejected() {
        let platform = Platform::default();
        assert!(PrimeGenerator::new(1, 16, &platform).is_err());
        assert!(PrimeGenerator::new(63, 16, &platform).is_err());
        assert!(PrimeGenerator::new(30, 0, &platform).is_err());
        assert!(PrimeGenerator::new(30, 1 << 60, &platform).is_err());
    }

    #[test]
    fn tiny_window_exhausts() {
        let platform = Platform::default();
        // m so close to 2^len that no candidate window remains
        let mut generator = PrimeGenerator::new(30, (1 << 29) - 1, &platform).unwrap();
        assert!(matches!(
            generator.next(),
            Err(Error::Exhausted { .. })
        ));
    }
}
