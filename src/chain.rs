//! The three-pass chain builder: small primes for fine-grained size
//! targets, ctxt primes for the ciphertext modulus, and special primes
//! for the key-switching P factor.

use std::f64::consts::LN_2;

use crate::context::{Context, RecryptParams};
use crate::error::{Error, Result};
use crate::index_set::IndexSet;
use crate::modulus::prime_generation::PrimeGenerator;

/// Adds the family of small primes that lets subset products hit any
/// log-size to within `resolution` bits.
///
/// A `resolution` outside `[1, 10]` falls back to the default of 3.
pub fn add_small_primes(context: &mut Context, resolution: u64) -> Result<()> {
    let m = context.cyclotomic().m();
    if m == 0 || m > (1 << 20) {
        return Err(Error::BadParameter(format!(
            "m = {m} undefined or larger than 2^20"
        )));
    }

    let resolution = if (1..=10).contains(&resolution) {
        resolution
    } else {
        3
    };

    let sp_nbits = context.platform().sp_nbits();
    let mut sizes: Vec<u64> = if sp_nbits >= 60 {
        vec![40, 40]
    } else if sp_nbits >= 50 {
        vec![35, 35]
    } else if sp_nbits >= 30 {
        vec![22, 22, 22]
    } else {
        return Err(Error::BadParameter(format!(
            "sp_nbits = {sp_nbits} below 30"
        )));
    };
    let floor = sizes[0];

    // sizes sp_nbits - r, sp_nbits - 2r, sp_nbits - 4r, ... down to the
    // floor, so any resolution is expressible with few primes
    let mut delta = resolution;
    while sp_nbits > delta && sp_nbits - delta > floor {
        sizes.push(sp_nbits - delta);
        delta *= 2;
    }

    // sp_nbits - 3r helps express sizes the doubling sequence skips
    if sp_nbits > 3 * resolution && sp_nbits - 3 * resolution > floor {
        sizes.push(sp_nbits - 3 * resolution);
    }
    if resolution == 1 && sp_nbits - 11 > floor {
        sizes.push(sp_nbits - 11);
    }

    sizes.sort_unstable();

    let mut generator = PrimeGenerator::new(sizes[0], m, context.platform())?;
    let mut last_size = sizes[0];
    for &size in &sizes {
        if size != last_size {
            generator = PrimeGenerator::new(size, m, context.platform())?;
            last_size = size;
        }
        let q = generator.next()?;
        context.add_small_prime(q);
    }
    Ok(())
}

/// Adds full-width ctxt primes until their product reaches `n_bits` bits.
pub fn add_ctxt_primes(context: &mut Context, n_bits: u64) -> Result<()> {
    let m = context.cyclotomic().m();
    let mut generator =
        PrimeGenerator::new(context.platform().sp_nbits(), m, context.platform())?;

    let mut bitlen: f64 = 0.0;
    while bitlen < n_bits as f64 {
        let q = generator.next()?;
        context.add_ctxt_prime(q);
        bitlen += (q as f64).log2();
    }
    Ok(())
}

/// Partitions the ctxt primes into `n_dgts` key-switching digits of
/// roughly equal log-size, then adds special primes covering the P
/// factor mass that key-switching with those digits requires.
///
/// Passing a [`RecryptParams`] oracle enlarges the plaintext power from
/// `p^r` to `p^{r+e-e'}`, leaving room for bootstrapping.
pub fn add_special_primes(
    context: &mut Context,
    n_dgts: usize,
    recrypt: Option<&dyn RecryptParams>,
) -> Result<()> {
    let p = context.cyclotomic().p();
    let m = context.cyclotomic().m();

    // log of the effective plaintext power p^e
    let mut log_p2e = (context.cyclotomic().p_pow_r() as f64).ln();
    if let Some(recrypt) = recrypt {
        let (_alpha, e, e_prime) = recrypt.alpha_e(context);
        log_p2e += f64::from(e - e_prime) * (p as f64).ln();
    }

    let ctxt = context.ctxt_primes().clone();
    let mut n_dgts = n_dgts.min(ctxt.card()).max(1);

    let mut digits: Vec<IndexSet> = Vec::with_capacity(n_dgts);
    let mut max_digit_log: f64 = 0.0;

    if n_dgts > 1 {
        let dlog = context.log_of_product(&ctxt) / n_dgts as f64;

        let mut assigned = IndexSet::new();
        let mut log_so_far: f64 = 0.0;
        let mut target = dlog;
        let mut idx = ctxt.first();

        // all digits but the last: grow until the cumulative log passes
        // the running target
        for _ in 0..n_dgts - 1 {
            let mut s = IndexSet::new();
            while let Some(i) = idx {
                if !s.is_empty() && log_so_far >= target {
                    break;
                }
                s.insert(i);
                log_so_far += (context.ith_prime(i) as f64).ln();
                idx = ctxt.next(i);
            }
            assert!(!s.is_empty(), "ran out of ctxt primes mid-partition");
            max_digit_log = max_digit_log.max(context.log_of_product(&s));
            assigned.union_with(&s);
            digits.push(s);
            target += dlog;
        }

        // the ctxt primes that are left (if any) form the last digit
        let rest = &ctxt - &assigned;
        if !rest.is_empty() {
            max_digit_log = max_digit_log.max(context.log_of_product(&rest));
            digits.push(rest);
        } else {
            n_dgts -= 1;
        }
    } else {
        max_digit_log = context.log_of_product(&ctxt);
        digits.push(ctxt.clone());
    }
    context.set_digits(digits);

    // log-mass the special primes must cover for the key-switching P factor
    let log_of_special_primes =
        max_digit_log + (n_dgts as f64).ln() + (2.0 * context.stdev()).ln() + log_p2e;

    // size each special prime so the granularity does not overshoot the
    // mass by much
    let sp_nbits = context.platform().sp_nbits();
    let total_bits = log_of_special_primes / LN_2;
    let num_primes = (total_bits / sp_nbits as f64).ceil();
    let mut nbits = (total_bits / num_primes).ceil() as u64 + 1;
    if nbits > sp_nbits {
        nbits = sp_nbits;
    }

    let mut generator = PrimeGenerator::new(nbits, m, context.platform())?;
    let mut log_so_far: f64 = 0.0;
    while log_so_far < log_of_special_primes {
        let q = generator.next()?;

        // nbits may coincide with a bucket already used for small or
        // ctxt primes, so duplicates are possible here
        if context.in_chain(q) {
            continue;
        }
        context.add_special_prime(q);
        log_so_far += (q as f64).ln();
    }
    Ok(())
}

/// Builds the complete modulus chain: small primes at the requested
/// resolution, ctxt primes totalling `n_bits` bits, the digit partition
/// and special primes for `n_dgts` digits, and finally the
/// size-selection table.
pub fn build_mod_chain(
    context: &mut Context,
    n_bits: u64,
    n_dgts: usize,
    recrypt: Option<&dyn RecryptParams>,
    resolution: u64,
) -> Result<()> {
    add_small_primes(context, resolution)?;
    add_ctxt_primes(context, n_bits)?;
    add_special_primes(context, n_dgts, recrypt)?;
    context.build_mod_size_table();
    Ok(())
}
