use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failure modes of chain construction, prime generation, subset
/// selection and (de)serialization.
///
/// Construction-phase errors abort the build; no partial chain is left
/// behind in a usable state. Query-time errors indicate a violated
/// precondition on the table and are fatal to the caller.
#[derive(Debug, Error)]
pub enum Error {
    #[error("bad parameter: {0}")]
    BadParameter(String),

    #[error("prime generator exhausted: no prime of the form 2^k*t*m+1 with m={m} left in [3*2^{len}/4, 2^{len})")]
    Exhausted { len: u64, m: u64 },

    #[error("no prime subset with log-size in [{low}, {high}], even with one bit of slack")]
    NoFeasibleSet { low: f64, high: f64 },

    #[error("malformed stream: {0}")]
    MalformedStream(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
