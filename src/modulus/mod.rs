//! Per-prime modulus records and the machinery that produces them.

pub mod primality;
pub mod prime_generation;

use prime_factorization::Factorization;

use crate::modulus::primality::pow_mod;

/// A registered prime of the chain together with the data an NTT over
/// the m-th cyclotomic ring would be seeded with: the modulus `q`, the
/// ring order `m`, and a primitive m-th root of unity mod `q`.
#[derive(Clone, Debug, PartialEq)]
pub struct Cmodulus {
    q: u64,
    m: u64,
    log_q: f64,
    root: u64,
}

impl Cmodulus {
    /// Builds the record for a prime `q` with `q = 1 (mod m)`.
    pub fn new(m: u64, q: u64) -> Self {
        assert!(
            m > 0 && q > 2 && (q - 1) % m == 0,
            "Cmodulus: q = {q} is not 1 mod m = {m}"
        );
        Self {
            q,
            m,
            log_q: (q as f64).ln(),
            root: primitive_mth_root(m, q),
        }
    }

    #[inline(always)]
    pub fn q(&self) -> u64 {
        self.q
    }

    #[inline(always)]
    pub fn m(&self) -> u64 {
        self.m
    }

    /// Natural log of `q`.
    #[inline(always)]
    pub fn log_q(&self) -> f64 {
        self.log_q
    }

    /// A primitive m-th root of unity mod `q`.
    #[inline(always)]
    pub fn root(&self) -> u64 {
        self.root
    }
}

/// Returns g^((q-1)/m) mod q for the smallest generator g of `Z_q^*`.
///
/// The generator search tests g^((q-1)/f) != 1 against every distinct
/// prime factor f of q-1.
fn primitive_mth_root(m: u64, q: u64) -> u64 {
    let factors = Factorization::run(q - 1).prime_factor_repr();

    let mut g: u64 = 1;
    'search: loop {
        g += 1;
        for &(f, _) in &factors {
            if pow_mod(g, (q - 1) / f, q) == 1 {
                continue 'search;
            }
        }
        break;
    }

    let root = pow_mod(g, (q - 1) / m, q);
    debug_assert!(pow_mod(root, m, q) == 1, "root^m != 1 mod q");
    root
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_has_order_m() {
        // 786433 = 3 * 2^18 + 1
        let c = Cmodulus::new(1 << 14, 786433);
        let root = c.root();
        assert_eq!(pow_mod(root, 1 << 14, c.q()), 1);
        // order is exactly m, not a proper divisor
        assert_ne!(pow_mod(root, 1 << 13, c.q()), 1);
    }

    #[test]
    fn log_q_is_natural_log() {
        let c = Cmodulus::new(4, 65537);
        assert!((c.log_q() - (65537f64).ln()).abs() < 1e-12);
    }

    #[test]
    #[should_panic]
    fn incompatible_modulus_is_refused() {
        let _ = Cmodulus::new(16, 23);
    }
}
