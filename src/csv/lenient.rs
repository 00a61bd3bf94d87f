//! The default tokenizer: one forward pass over the text, lenient about
//! malformed input.
//!
//! Limitations:
//! - A `\r` is only dropped when it is the first byte of a field, which
//!   is just enough to tolerate CRLF on blank lines and after empty
//!   fields. A CRLF ending after a non-empty unquoted field leaves the
//!   `\r` in the cell, and after a quoted field it also defeats the
//!   closing-quote strip.
//! - Malformed quoting is never rejected. An unterminated quote swallows
//!   the rest of the input as field content, and a quote in the middle of
//!   an unquoted field switches modes, abandoning the content before it.
//!
//! [`quirks`](crate::quirks) detects all of these shapes up front for
//! callers that care.

use memchr::memchr;

use super::table::{Span, Table};

/// Tokenize CSV text into a [`Table`] of rows of cell slices.
///
/// Takes ownership of the text (moving an owned `String`, copying a
/// `&str`), so the returned table is self-contained. Quoted fields may
/// span physical lines and contain delimiters; doubled quotes inside them
/// collapse to literal quote characters. Empty lines yield no row. Never
/// fails: malformed input parses under a best-effort reading of the
/// current scanning mode.
///
/// ```
/// let table = csvtab::parse("a,\"b,c\",d\n");
/// assert_eq!(table.row(0).unwrap().iter().collect::<Vec<_>>(), ["a", "b,c", "d"]);
/// ```
///
/// The input is not copied beyond the initial move: cells are byte ranges
/// into the table's own buffer. The exception is doubled-quote escapes,
/// whose removal rewrites the buffer once, during the same forward pass.
pub fn parse(input: impl Into<String>) -> Table {
    let text = input.into();
    let mut rows: Vec<Vec<Span>> = Vec::new();
    let mut row: Vec<Span> = Vec::new();
    let mut in_quotes = false;
    // All offsets below are in normalized coordinates: the original byte
    // index minus the quote bytes deleted so far. They stay valid against
    // the rewritten text assembled at the end.
    let mut field_start = 0;
    let mut removed = 0;
    let mut rewrite: Option<String> = None;
    let mut seg_start = 0;

    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if in_quotes {
            // Everything up to the next quote is literal content,
            // embedded delimiters and newlines included.
            i += match memchr(b'"', &bytes[i..]) {
                Some(offset) => offset,
                // Unterminated quote: the rest of the input is content.
                None => break,
            };
            if bytes.get(i + 1) == Some(&b'"') {
                // Doubled quote, a literal '"' in the field. Drop the
                // first of the pair from the output text; every offset
                // emitted from here on shifts left by one.
                let out = rewrite.get_or_insert_with(|| String::with_capacity(text.len()));
                out.push_str(&text[seg_start..i]);
                seg_start = i + 1;
                removed += 1;
                i += 2;
            } else {
                in_quotes = false;
                i += 1;
            }
            continue;
        }
        let pos = i - removed;
        match bytes[i] {
            b'"' => {
                in_quotes = true;
                // The opening quote is not part of the field content.
                field_start = pos + 1;
            }
            b',' | b'\n' => {
                // An empty field on an otherwise empty row means the line
                // was blank; it contributes no cell and no row.
                let blank_line = row.is_empty() && field_start == pos;
                if bytes[i] == b',' || !blank_line {
                    row.push(cell_span(bytes, i, field_start, pos));
                }
                if bytes[i] == b'\n' && !row.is_empty() {
                    rows.push(std::mem::take(&mut row));
                }
                field_start = pos + 1;
            }
            b'\r' => {
                // Tolerate CRLF: a carriage return opening a field is not
                // part of it. Anywhere else it is ordinary content.
                if field_start == pos {
                    field_start = pos + 1;
                }
            }
            _ => {}
        }
        i += 1;
    }

    // A trailing field with no final newline is terminated by the end of
    // the input.
    let total = bytes.len() - removed;
    if !bytes.is_empty() && bytes[bytes.len() - 1] != b'\n' {
        if !(row.is_empty() && field_start == total) {
            row.push(cell_span(bytes, bytes.len(), field_start, total));
        }
        if !row.is_empty() {
            rows.push(row);
        }
    }

    let text = match rewrite {
        Some(mut out) => {
            out.push_str(&text[seg_start..]);
            out
        }
        None => text,
    };
    Table { text, rows }
}

/// Span of the field ending just before the terminator at `term` (an
/// original byte index; the end of the input counts as a terminator).
/// `pos` is the terminator's normalized offset. A quote sitting against
/// the terminator is the field's closing quote and is stripped.
fn cell_span(bytes: &[u8], term: usize, field_start: usize, pos: usize) -> Span {
    let mut len = pos - field_start;
    if len > 0 && bytes[term - 1] == b'"' {
        len -= 1;
    }
    Span::new(field_start, len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cells(input: &str) -> Vec<Vec<String>> {
        parse(input).to_vecs()
    }

    #[test]
    fn test_simple() {
        assert_eq!(
            cells("a,b,c\n1,2,3\n"),
            vec![vec!["a", "b", "c"], vec!["1", "2", "3"]]
        );
    }

    #[test]
    fn test_quoted_commas() {
        assert_eq!(cells("a,\"b,c\",d\n"), vec![vec!["a", "b,c", "d"]]);
    }

    #[test]
    fn test_escaped_quotes() {
        assert_eq!(cells("\"a\"\"b\",c\n"), vec![vec!["a\"b", "c"]]);
    }

    #[test]
    fn test_newline_in_quotes() {
        let table = parse("a,\"b\nc\",d\n");
        assert_eq!(table.len(), 1);
        assert_eq!(table.cell(0, 1), Some("b\nc"));
    }

    #[test]
    fn test_no_trailing_newline() {
        assert_eq!(cells("x,y"), vec![vec!["x", "y"]]);
        assert_eq!(cells("a,b,c\n1,2,3"), vec![vec!["a", "b", "c"], vec!["1", "2", "3"]]);
        assert_eq!(cells("a"), vec![vec!["a"]]);
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        assert_eq!(cells("a,b\n\nc,d\n"), vec![vec!["a", "b"], vec!["c", "d"]]);
        assert_eq!(cells("\na,b\n"), vec![vec!["a", "b"]]);
        assert_eq!(cells("a,b\n\n\n"), vec![vec!["a", "b"]]);
        assert_eq!(cells("\n\n"), Vec::<Vec<String>>::new());
    }

    #[test]
    fn test_empty_input() {
        let table = parse("");
        assert!(table.is_empty());
        assert_eq!(table.text(), "");
    }

    #[test]
    fn test_empty_fields_still_count() {
        assert_eq!(cells("a,,c\n"), vec![vec!["a", "", "c"]]);
        assert_eq!(cells("a,b,\n"), vec![vec!["a", "b", ""]]);
        assert_eq!(cells(",\n"), vec![vec!["", ""]]);
        assert_eq!(cells("a,"), vec![vec!["a", ""]]);
    }

    #[test]
    fn test_quoted_empty_and_quote_only_cells() {
        assert_eq!(cells("\"\",x\n"), vec![vec!["", "x"]]);
        // A quoted empty field is a cell even on its own line.
        assert_eq!(cells("\"\"\n"), vec![vec![""]]);
        // Four quotes: a quoted field holding one literal quote.
        assert_eq!(cells("\"\"\"\"\n"), vec![vec!["\""]]);
    }

    #[test]
    fn test_multiple_escapes_in_one_field() {
        assert_eq!(cells("\"a\"\"b\"\"c\",d\n"), vec![vec!["a\"b\"c", "d"]]);
        assert_eq!(cells("\"\"\"x\"\"\"\n"), vec![vec!["\"x\""]]);
    }

    #[test]
    fn test_escapes_in_two_fields_on_one_line() {
        assert_eq!(
            cells("\"a\"\"\",\"\"\"b\"\n"),
            vec![vec!["a\"", "\"b"]]
        );
    }

    #[test]
    fn test_text_is_rewritten_only_for_escapes() {
        let untouched = parse("a,\"b,c\",d\n");
        assert_eq!(untouched.text(), "a,\"b,c\",d\n");

        let rewritten = parse("\"a\"\"b\",c\n");
        assert_eq!(rewritten.text(), "\"a\"b\",c\n");
        assert_eq!(rewritten.cell(0, 0), Some("a\"b"));
    }

    #[test]
    fn test_crlf_tolerated_where_fields_are_empty() {
        // Blank CRLF line between LF rows contributes nothing.
        assert_eq!(cells("a,b\n\r\nc,d\n"), vec![vec!["a", "b"], vec!["c", "d"]]);
        // CRLF after an empty final field leaves the field empty.
        assert_eq!(cells("a,\r\nb,\r\n"), vec![vec!["a", ""], vec!["b", ""]]);
        // A file of CRLF blank lines has no rows.
        assert_eq!(cells("\r\n\r\n"), Vec::<Vec<String>>::new());
    }

    #[test]
    fn test_crlf_after_content_stays_in_the_cell() {
        // Documented limitation: only a field-leading \r is dropped, so a
        // CRLF ending after content leaves the \r in the last cell.
        assert_eq!(cells("a,b\r\n"), vec![vec!["a", "b\r"]]);
    }

    #[test]
    fn test_unterminated_quote_swallows_the_rest() {
        assert_eq!(cells("\"abc"), vec![vec!["abc"]]);
        assert_eq!(cells("a,\"b,c\nd,e"), vec![vec!["a", "b,c\nd,e"]]);
        // When the swallowed content ends in a newline there is no
        // trailing field to finalize, so the row never materializes.
        assert_eq!(cells("\"abc\n"), Vec::<Vec<String>>::new());
        // A lone opening quote opens a field that never gets content;
        // with nothing else on the line, no row is emitted.
        assert_eq!(cells("\""), Vec::<Vec<String>>::new());
    }

    #[test]
    fn test_stray_quotes_switch_modes() {
        // A quote mid-field abandons the content scanned before it.
        assert_eq!(cells("ab\"cd,x"), vec![vec!["cd,x"]]);
        // Content after a closing quote keeps the quote in the cell.
        assert_eq!(cells("\"ab\"cd,x\n"), vec![vec!["ab\"cd", "x"]]);
    }

    #[test]
    fn test_takes_ownership_of_owned_input() {
        let input = String::from("x,y\n");
        let table = parse(input);
        assert_eq!(table.cell(0, 1), Some("y"));
    }

    mod props {
        use super::super::parse;
        use itertools::Itertools;
        use proptest::prelude::*;

        /// Re-quote and rejoin parsed cells into canonical CSV text.
        ///
        /// Cells are quoted when empty or containing a structural
        /// character. Empty cells must be written as `""`: a bare empty
        /// sole cell would reconstruct as a blank line, which parses to
        /// no row at all.
        fn to_csv_text(rows: &[Vec<String>]) -> String {
            let specials: &[char] = &['"', ',', '\n', '\r'];
            let mut out = String::new();
            for row in rows {
                let line = row
                    .iter()
                    .map(|cell| {
                        if cell.is_empty() || cell.contains(specials) {
                            format!("\"{}\"", cell.replace('"', "\"\""))
                        } else {
                            cell.clone()
                        }
                    })
                    .join(",");
                out.push_str(&line);
                out.push('\n');
            }
            out
        }

        proptest! {
            #[test]
            fn parse_is_total(input in any::<String>()) {
                let table = parse(input.as_str());
                for row in table.rows() {
                    // No empty rows, and every cell resolves in bounds.
                    prop_assert!(!row.is_empty());
                    for cell in row.iter() {
                        prop_assert!(cell.len() <= table.text().len());
                    }
                }
            }

            #[test]
            fn written_rows_round_trip(
                rows in proptest::collection::vec(
                    proptest::collection::vec("[a-z\",\n\r ]{0,8}", 1..5),
                    0..5,
                )
            ) {
                let table = parse(to_csv_text(&rows).as_str());
                prop_assert_eq!(table.to_vecs(), rows);
            }

            #[test]
            fn reconstruction_reparse_is_identity(input in "[a-z\",\n\r]{0,40}") {
                let first = parse(input.as_str());
                let second = parse(to_csv_text(&first.to_vecs()).as_str());
                prop_assert_eq!(first.to_vecs(), second.to_vecs());
            }
        }
    }
}
