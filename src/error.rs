use thiserror_no_std::Error;

/// Errors surfaced by the polynomial/FRI core. Every fallible operation fails
/// with at most one of these (spec §7).
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("inverse of zero field element")]
    ZeroInverse,
    #[error("twiddle tree root coset does not double into the target domain's half coset")]
    TwiddleMismatch,
    #[error("length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("extend requested log size {requested} below current log size {current}")]
    LogSizeTooSmall { current: u32, requested: u32 },
    #[error("length {0} is not a power of two")]
    NonPowerOfTwo(usize),
    #[error("operation requires a canonic domain")]
    DomainNotCanonic,
    #[error("LineDomain::new invariant violated: coset x-coordinates are not unique")]
    CosetXNotUnique,
    #[error("sample batch point at index {0} coincides with a domain point")]
    QuotientPointOnDomain(usize),
    #[error("column {index} has length {actual}, shorter than the domain's {expected}")]
    ColumnSizeMismatch { index: usize, expected: usize, actual: usize },
    #[error("line domain of size {0} is too small to fold")]
    LineTooSmall(usize),
}

pub type CoreResult<T> = Result<T, CoreError>;
