use base64::DecodeError;
use thiserror::Error;

use crate::Label;

/// Errors that can occur when locating or decoding a PEM block.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// No `-----BEGIN ...-----` line in the input
    #[error("missing a pre encapsulation boundary")]
    MissingPreEncapsulationBoundary,

    /// A block was opened but never closed
    #[error("missing a post encapsulation boundary")]
    MissingPostEncapsulationBoundary,

    /// Nothing between the boundary markers
    #[error("missing PEM data")]
    MissingData,

    /// BEGIN and END carry different labels
    #[error("label doesn't match: BEGIN {begin}, END {end}")]
    LabelMismatch { begin: Label, end: Label },

    #[error("invalid encapsulation boundary")]
    InvalidEncapsulationBoundary,

    /// A body line holds characters outside the base64 alphabet
    #[error("invalid base64 text at line {line}")]
    InvalidBase64Line { line: usize },

    #[error("base64 decode: {0}")]
    Base64Decode(DecodeError),

    /// The block is well formed but holds a different kind of object
    #[error("expected a {expected} block, found {actual}")]
    TypeMismatch { expected: Label, actual: Label },
}

impl Error {
    /// Returns `true` when the input was valid PEM of the wrong type.
    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, Error::TypeMismatch { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
