//! Opt-in strictness on top of the lenient tokenizer.
//!
//! [`parse`](crate::parse) always produces a table, reinterpreting
//! malformed quoting and stray carriage returns as it goes. The entry
//! points here are for callers that would rather hear about such input up
//! front: [`quirks`] reports every tolerated construct present, and
//! [`parse_strict`] turns the first one into an error. Width expectations
//! are a property of the caller's data rather than of the text, so they
//! are handled separately by [`parse_with_unescaped_delimiters`].

use enumset::{EnumSet, EnumSetType};
use memchr::{memchr, memchr_iter};

use super::lenient::parse;
use super::table::{Span, Table};
use crate::errors::{CsvError, Result};
use crate::Position;

/// An input construct the default tokenizer tolerates but does not handle
/// faithfully.
///
/// Each of these parses without error, but the resulting table may not
/// say what the author of the input meant.
#[derive(EnumSetType, Debug)]
pub enum Quirk {
    /// A quoted field was still open when the input ended; the rest of
    /// the text became field content.
    UnterminatedQuote,
    /// A quote away from any field boundary: opened after field content,
    /// or closed with content following it.
    StrayQuote,
    /// A carriage return outside quotes that is either kept as cell
    /// content or dropped without a newline after it.
    BareCarriageReturn,
    /// Rows do not all have the same number of cells.
    RaggedRows,
}

struct Finding {
    offset: usize,
    quirk: Quirk,
    message: &'static str,
}

/// Scan for quote and carriage-return quirks, in input order.
///
/// Mirrors the tokenizer's state machine over the raw bytes without
/// building a table: whether a quote or carriage return is tolerable
/// depends on the scanning mode at that point.
fn scan(bytes: &[u8]) -> Vec<Finding> {
    let mut findings = Vec::new();
    let mut in_quotes = false;
    let mut open_quote = 0;
    let mut field_start = 0;
    let mut i = 0;
    while i < bytes.len() {
        if in_quotes {
            i += match memchr(b'"', &bytes[i..]) {
                Some(offset) => offset,
                None => break,
            };
            if bytes.get(i + 1) == Some(&b'"') {
                // Escaped literal quote, still inside the field
                i += 2;
                continue;
            }
            match bytes.get(i + 1) {
                None | Some(&b',') | Some(&b'\n') | Some(&b'\r') => {}
                Some(_) => findings.push(Finding {
                    offset: i,
                    quirk: Quirk::StrayQuote,
                    message: "Content continues after a closing quote. Quotes are only allowed next to a delimiter, a newline, or the ends of the input.",
                }),
            }
            in_quotes = false;
            i += 1;
            continue;
        }
        match bytes[i] {
            b'"' => {
                if field_start != i {
                    findings.push(Finding {
                        offset: i,
                        quirk: Quirk::StrayQuote,
                        message: "Quote in the middle of a field. Quotes are only allowed next to a delimiter, a newline, or the ends of the input.",
                    });
                }
                in_quotes = true;
                open_quote = i;
                field_start = i + 1;
            }
            b',' | b'\n' => field_start = i + 1,
            b'\r' => {
                if field_start == i {
                    if bytes.get(i + 1) != Some(&b'\n') {
                        findings.push(Finding {
                            offset: i,
                            quirk: Quirk::BareCarriageReturn,
                            message: "Carriage return without a following newline. It is dropped from the field.",
                        });
                    }
                    field_start = i + 1;
                } else {
                    findings.push(Finding {
                        offset: i,
                        quirk: Quirk::BareCarriageReturn,
                        message: "Carriage return in the middle of a field. It parses as cell content, not as a line ending.",
                    });
                }
            }
            _ => {}
        }
        i += 1;
    }
    if in_quotes {
        findings.push(Finding {
            offset: open_quote,
            quirk: Quirk::UnterminatedQuote,
            message: "Quote is never closed. The rest of the input parses as field content.",
        });
    }
    findings
}

/// Line and column of a byte offset, both zero-based. Lines are physical,
/// split on `\n`.
fn position_of(bytes: &[u8], offset: usize) -> Position {
    let mut line = 0;
    let mut line_start = 0;
    for newline in memchr_iter(b'\n', &bytes[..offset]) {
        line += 1;
        line_start = newline + 1;
    }
    Position {
        line,
        column: offset - line_start,
    }
}

/// Report every class of quirk present in the input.
///
/// Never fails and never stops early: all quote and carriage-return
/// shapes are collected, and the parsed output is checked for ragged row
/// widths on top. An empty set means [`parse`](crate::parse) handles this
/// input faithfully.
///
/// ```
/// use csvtab::{quirks, Quirk};
/// assert!(quirks("a,b\n1,2\n").is_empty());
/// assert_eq!(quirks("a\"b"), Quirk::StrayQuote | Quirk::UnterminatedQuote);
/// ```
pub fn quirks(input: &str) -> EnumSet<Quirk> {
    let mut set: EnumSet<Quirk> = scan(input.as_bytes())
        .into_iter()
        .map(|finding| finding.quirk)
        .collect();
    if !parse(input).is_rectangular() {
        set |= Quirk::RaggedRows;
    }
    set
}

/// Like [`parse`](crate::parse), but reject input the tokenizer would
/// have to reinterpret.
///
/// The first quote or carriage-return quirk in the input becomes a
/// [`CsvError::MalformedField`] carrying its position. Ragged row widths
/// are not an error here; what widths mean is the caller's business (see
/// [`parse_with_unescaped_delimiters`]).
///
/// ```
/// use csvtab::{parse_strict, CsvError, Position};
/// assert!(parse_strict("a,\"b\"\"c\",d\n").is_ok());
/// let err = parse_strict("a,b\r\nc,d\r\n").unwrap_err();
/// assert!(matches!(err, CsvError::MalformedField(Position { line: 0, column: 3 }, _)));
/// ```
pub fn parse_strict(input: impl Into<String>) -> Result<Table> {
    let text = input.into();
    if let Some(finding) = scan(text.as_bytes()).into_iter().next() {
        return Err(CsvError::MalformedField(
            position_of(text.as_bytes(), finding.offset),
            finding.message,
        ));
    }
    Ok(parse(text))
}

/// Parse input where one known column may contain unescaped delimiters.
///
/// Every row must come out at `expected_column_count` cells. Rows that
/// are wider have the surplus cells folded back into the cell at
/// `invalid_column_index`: the merged cell is the slice of text from the
/// first to the last of them, so the delimiters between them come back
/// verbatim. Rows that are narrower fail with [`CsvError::Invalid`]; the
/// usual cause is an unescaped newline, and with both unescaped
/// delimiters and unescaped newlines there is no deterministic recovery.
///
/// The error position reports the row's index in the parsed output as the
/// line and the expected column count as the column.
pub fn parse_with_unescaped_delimiters(
    input: impl Into<String>,
    expected_column_count: usize,
    invalid_column_index: usize,
) -> Result<Table> {
    debug_assert!(invalid_column_index < expected_column_count);
    let mut table = parse(input);
    for (line, row) in table.rows.iter_mut().enumerate() {
        let apparent_column_count = row.len();
        if apparent_column_count < expected_column_count {
            return Err(CsvError::Invalid(
                Position {
                    line,
                    column: expected_column_count,
                },
                "Not enough columns. There may be an unescaped newline in a field.",
            ));
        } else if apparent_column_count > expected_column_count {
            // Fold the surplus cells back into the invalid column
            let spill_end = invalid_column_index + (apparent_column_count - expected_column_count);
            let start = row[invalid_column_index].start();
            row[invalid_column_index] = Span::new(start, row[spill_end].end() - start);
            row.drain(invalid_column_index + 1..=spill_end);
        }
    }
    Ok(table)
}
