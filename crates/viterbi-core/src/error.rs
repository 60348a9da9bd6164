use std::fmt;

/// Errors surfaced by [`crate::Viterbi`] construction and decoding.
#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    /// `K` (constraint length) exceeded [`crate::MAX_K`].
    ConstraintLengthTooLarge { k: usize },
    /// `K` was zero; a trellis needs at least one bit of state.
    ConstraintLengthTooSmall,
    /// The number of output polynomials `n` exceeded [`crate::MAX_N`].
    OutputCountTooLarge { n: usize },
    /// No output polynomials were given.
    EmptyPolynomialList,
    /// The `on_data` callback returned `false`, asking the decoder to stop.
    DecoderAborted,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ConstraintLengthTooLarge { k } => {
                write!(f, "constraint length {k} exceeds the maximum of {}", crate::MAX_K)
            }
            Error::ConstraintLengthTooSmall => write!(f, "constraint length must be at least 1"),
            Error::OutputCountTooLarge { n } => {
                write!(f, "output count {n} exceeds the maximum of {}", crate::MAX_N)
            }
            Error::EmptyPolynomialList => write!(f, "at least one output polynomial is required"),
            Error::DecoderAborted => write!(f, "decoder refused to continue"),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;
