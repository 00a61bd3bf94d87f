use crate::Position;
use thiserror::Error;

/// Errors reported by the opt-in strict entry points.
///
/// The default [`parse`](crate::parse) never fails; only the strict and
/// width-checking variants return these.
#[derive(Error, Debug, PartialEq)]
pub enum CsvError {
    #[error("Malformed field ({0:?}): {1}")]
    MalformedField(Position, &'static str),

    #[error("Invalid input ({0:?}): {1}")]
    Invalid(Position, &'static str),
    // Add more custom variants as needed
}

pub type Result<T> = std::result::Result<T, CsvError>;
