//! # Error Types
//!
//! Defines error types used across subsystems.

use thiserror::Error;

/// Errors produced by amount arithmetic and parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    /// Arithmetic left the representable range.
    #[error("Amount overflow")]
    Overflow,

    /// Value outside `[-MAX_MONEY, MAX_MONEY]`.
    #[error("Amount out of range: {0} base units")]
    OutOfRange(i64),

    /// More fractional digits than base units can represent.
    #[error("Amount has too many decimal places: {0}")]
    TooPrecise(String),

    /// Not a decimal number.
    #[error("Invalid amount: {0:?}")]
    Invalid(String),
}

/// Errors decoding hex identifiers (txids, block hashes, addresses).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    /// Input was not valid hex.
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    /// Decoded byte length did not match.
    #[error("Invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}
