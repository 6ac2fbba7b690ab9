//! The build-time context: platform capabilities, cyclotomic parameters,
//! the registered prime chain and its role sets.

use crate::error::{Error, Result};
use crate::index_set::IndexSet;
use crate::moduli_sizes::ModuliSizes;
use crate::modulus::Cmodulus;

/// Default standard deviation of the noise distribution, used when
/// sizing the key-switching special primes.
pub const DEFAULT_STDEV: f64 = 3.2;

/// Single-precision capability of the target platform: the widest
/// bit-length a chain prime may have.
///
/// An explicit value instead of a process-wide constant, so tests and
/// cross-compilation scenarios can parameterize it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Platform {
    sp_nbits: u64,
}

impl Platform {
    /// `sp_nbits` must lie in `[30, 62]`.
    pub fn new(sp_nbits: u64) -> Result<Self> {
        if !(30..=62).contains(&sp_nbits) {
            return Err(Error::BadParameter(format!(
                "sp_nbits = {sp_nbits} outside [30, 62]"
            )));
        }
        Ok(Self { sp_nbits })
    }

    #[inline(always)]
    pub fn sp_nbits(&self) -> u64 {
        self.sp_nbits
    }

    /// `2^sp_nbits`, the exclusive upper bound on single-precision values.
    #[inline(always)]
    pub fn sp_bound(&self) -> u64 {
        1 << self.sp_nbits
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self { sp_nbits: 60 }
    }
}

/// Cyclotomic parameters: ring order `m` and plaintext modulus `p^r`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cyclotomic {
    m: u64,
    p: u64,
    p_pow_r: u64,
}

impl Cyclotomic {
    pub fn new(m: u64, p: u64, r: u32) -> Result<Self> {
        if m == 0 {
            return Err(Error::BadParameter("m must be positive".into()));
        }
        if p < 2 || r == 0 {
            return Err(Error::BadParameter(format!(
                "plaintext modulus p^r = {p}^{r} is not a prime power"
            )));
        }
        let p_pow_r = p.checked_pow(r).ok_or_else(|| {
            Error::BadParameter(format!("p^r = {p}^{r} overflows a 64-bit word"))
        })?;
        Ok(Self { m, p, p_pow_r })
    }

    #[inline(always)]
    pub fn m(&self) -> u64 {
        self.m
    }

    #[inline(always)]
    pub fn p(&self) -> u64 {
        self.p
    }

    #[inline(always)]
    pub fn p_pow_r(&self) -> u64 {
        self.p_pow_r
    }
}

/// Bootstrapping parameter oracle: yields `(alpha, e, e')` for a context.
/// Implementations must return `e >= e'`.
pub trait RecryptParams {
    fn alpha_e(&self, context: &Context) -> (f64, u32, u32);
}

/// Owner of the modulus chain under construction: the registered primes
/// in index order, the three disjoint role sets, the key-switching digit
/// partition and, once built, the size-selection table.
///
/// Registration happens once, during the build phase; afterwards the
/// context is read-only and safe to share across reader threads.
pub struct Context {
    platform: Platform,
    cyclotomic: Cyclotomic,
    stdev: f64,
    moduli: Vec<Cmodulus>,
    small_primes: IndexSet,
    ctxt_primes: IndexSet,
    special_primes: IndexSet,
    digits: Vec<IndexSet>,
    mod_sizes: ModuliSizes,
}

impl Context {
    pub fn new(platform: Platform, cyclotomic: Cyclotomic) -> Self {
        Self {
            platform,
            cyclotomic,
            stdev: DEFAULT_STDEV,
            moduli: Vec::new(),
            small_primes: IndexSet::new(),
            ctxt_primes: IndexSet::new(),
            special_primes: IndexSet::new(),
            digits: Vec::new(),
            mod_sizes: ModuliSizes::default(),
        }
    }

    #[inline(always)]
    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    #[inline(always)]
    pub fn cyclotomic(&self) -> &Cyclotomic {
        &self.cyclotomic
    }

    #[inline(always)]
    pub fn stdev(&self) -> f64 {
        self.stdev
    }

    /// Overrides the noise standard deviation. Only meaningful before
    /// the special primes are added.
    pub fn set_stdev(&mut self, stdev: f64) {
        self.stdev = stdev;
    }

    /// Whether `q` is already registered under any role.
    pub fn in_chain(&self, q: u64) -> bool {
        self.moduli.iter().any(|c| c.q() == q)
    }

    fn register(&mut self, q: u64) -> usize {
        assert!(!self.in_chain(q), "prime {q} registered twice");
        let i = self.moduli.len();
        self.moduli.push(Cmodulus::new(self.cyclotomic.m(), q));
        i
    }

    pub fn add_small_prime(&mut self, q: u64) {
        let i = self.register(q);
        self.small_primes.insert(i);
    }

    pub fn add_ctxt_prime(&mut self, q: u64) {
        let i = self.register(q);
        self.ctxt_primes.insert(i);
    }

    pub fn add_special_prime(&mut self, q: u64) {
        let i = self.register(q);
        self.special_primes.insert(i);
    }

    /// The i-th registered prime.
    pub fn ith_prime(&self, i: usize) -> u64 {
        self.moduli[i].q()
    }

    /// Natural log of the product of the primes in `s`.
    pub fn log_of_product(&self, s: &IndexSet) -> f64 {
        s.iter().map(|i| self.moduli[i].log_q()).sum()
    }

    #[inline(always)]
    pub fn moduli(&self) -> &[Cmodulus] {
        &self.moduli
    }

    #[inline(always)]
    pub fn small_primes(&self) -> &IndexSet {
        &self.small_primes
    }

    #[inline(always)]
    pub fn ctxt_primes(&self) -> &IndexSet {
        &self.ctxt_primes
    }

    #[inline(always)]
    pub fn special_primes(&self) -> &IndexSet {
        &self.special_primes
    }

    /// The key-switching digit partition of the ctxt primes.
    #[inline(always)]
    pub fn digits(&self) -> &[IndexSet] {
        &self.digits
    }

    pub(crate) fn set_digits(&mut self, digits: Vec<IndexSet>) {
        self.digits = digits;
    }

    #[inline(always)]
    pub fn mod_sizes(&self) -> &ModuliSizes {
        &self.mod_sizes
    }

    /// Materializes the size-selection table from the finished chain.
    pub fn build_mod_size_table(&mut self) {
        self.mod_sizes = ModuliSizes::new(&self.moduli, &self.ctxt_primes, &self.small_primes);
    }
}
