//! Modulus-chain construction and prime-subset selection for RNS-based
//! homomorphic encryption.
//!
//! BGV/CKKS-style schemes represent ciphertexts modulo a product
//! `Q = q_0 * q_1 * ... * q_{L-1}` of coprime primes. This crate builds
//! that chain, splits it into functional roles, and answers the runtime
//! question "which subset of primes has a product of roughly this size"
//! that modulus-switching and key-switching keep asking.
//!
//! # Architecture
//!
//! Construction happens once, through [`build_mod_chain`]:
//!
//! 1. **small primes** -- a family of coarse bit-length buckets whose
//!    subset products can express any log-size to within the requested
//!    resolution;
//! 2. **ctxt primes** -- full-width primes whose product forms the
//!    initial ciphertext modulus, accumulated until a bit budget is met;
//! 3. **special primes** -- the key-switching P factor, sized from the
//!    largest key-switching digit, the noise deviation, and the
//!    plaintext power.
//!
//! All primes have the shape `p = 2^k * t * m + 1` (`t` odd, `k`
//! maximal), so the `m`-th cyclotomic ring admits an NTT modulo each of
//! them. After the build, a [`ModuliSizes`] table enumerates every
//! small-prime subset combined with every prefix interval of the ctxt
//! primes, sorted by log-size; queries are a binary search plus a short
//! scan and never mutate the table.
//!
//! # Module overview
//!
//! | Module | Responsibility |
//! |---|---|
//! | [`modulus`] | Prime records, primality testing, NTT-friendly prime generation |
//! | [`context`] | Platform capabilities, cyclotomic parameters, the chain and its role sets |
//! | [`chain`] | The three construction passes and their composition |
//! | [`moduli_sizes`] | The size-selection table, its queries and serialization |
//! | [`index_set`] | Ordered index sets backing roles, digits and table entries |
//! | [`serialization`] | Binary stream traits and ASCII framing |
//! | [`source`] | Deterministic seeded randomness for primality witnesses |
//! | [`error`] | Error kinds and the crate `Result` |

pub mod chain;
pub mod context;
pub mod error;
pub mod index_set;
pub mod moduli_sizes;
pub mod modulus;
pub mod serialization;
pub mod source;

pub use chain::{add_ctxt_primes, add_small_primes, add_special_primes, build_mod_chain};
pub use context::{Context, Cyclotomic, Platform, RecryptParams};
pub use error::{Error, Result};
pub use index_set::IndexSet;
pub use moduli_sizes::{ModuliSizes, SizeEntry};
pub use modulus::prime_generation::PrimeGenerator;
pub use modulus::Cmodulus;
pub use serialization::{ReaderFrom, WriterTo};
pub use source::Source;
