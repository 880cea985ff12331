//! Error types for REW filter extraction

use thiserror::Error;

/// Errors raised by a line that matched the filter grammar but carries a
/// value that cannot be converted
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Filter number is zero or does not fit
    #[error("invalid filter number: {0}")]
    InvalidFilterNumber(String),

    /// Centre frequency is not a decimal number
    #[error("invalid frequency: {0}")]
    InvalidFrequency(String),

    /// Gain is not a signed decimal number
    #[error("invalid gain: {0}")]
    InvalidGain(String),

    /// Q is not a decimal number
    #[error("invalid Q: {0}")]
    InvalidQ(String),
}

/// A band list longer than a [`BandSet`](crate::BandSet) can hold
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("{count} bands exceed the limit of {}", crate::MAX_BANDS)]
pub struct TooManyBands {
    pub count: usize,
}

/// Errors that abort extraction from a line source
#[derive(Debug, Error)]
pub enum ExtractError {
    /// A filter line was malformed
    #[error("line {line}: {source}")]
    Line {
        /// 1-based line number within the source
        line: usize,
        #[source]
        source: ParseError,
    },

    /// Reading the source failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractError {
    /// The line-level parse error, if this is one
    pub fn parse_error(&self) -> Option<&ParseError> {
        match self {
            Self::Line { source, .. } => Some(source),
            Self::Io(_) => None,
        }
    }
}
