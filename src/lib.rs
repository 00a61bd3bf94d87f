mod csv;
mod errors;

pub use csv::{
    parse, parse_strict, parse_with_unescaped_delimiters, quirks, Quirk, Row, Span, Table,
};
pub use enumset::EnumSet;
pub use errors::{CsvError, Result};

/// Zero-based byte coordinates of a spot in the input text.
///
/// `line` counts physical lines separated by `\n`; `column` is the byte
/// offset within that line. Width-expectation errors are the exception:
/// they report the expected column count in `column`.
#[derive(Debug, PartialEq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}
