//! The tokenizer's output container: one owned text buffer plus rows of
//! byte-range cells that borrow from it.
//!
//! Cells are stored as offsets rather than string slices so the table can
//! own its text without self-reference. Slices are materialized on access,
//! after the scan and any escape rewriting have finished, which is what
//! makes the in-scan quote deletion in the tokenizer safe.

use itertools::Itertools;

/// Byte range of one cell within a [`Table`]'s text.
///
/// Spans never include the structural bytes around a field: delimiters,
/// newlines, or the enclosing quotes of a quoted field. They carry no
/// quoting metadata; doubled-quote escapes are already collapsed in the
/// text the span indexes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    start: usize,
    len: usize,
}

impl Span {
    pub(crate) fn new(start: usize, len: usize) -> Self {
        Span { start, len }
    }

    /// Offset of the first byte of the cell.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Offset one past the last byte of the cell.
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    /// Length of the cell in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Parsed CSV text: the sole owner of the text buffer, plus an ordered
/// sequence of rows of cells.
///
/// Every `&str` handed out by the accessors borrows from the table and
/// cannot outlive it. Callers that need cells past the table's lifetime
/// copy them out with [`Table::to_vecs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub(crate) text: String,
    pub(crate) rows: Vec<Vec<Span>>,
}

impl Table {
    /// The text the cells index into.
    ///
    /// Identical to the parsed input unless the input contained doubled
    /// quotes, in which case the duplicate quote bytes are gone.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row at `index`, in source order, or `None` past the end.
    pub fn row(&self, index: usize) -> Option<Row<'_>> {
        self.rows.get(index).map(|cells| Row {
            text: &self.text,
            cells,
        })
    }

    /// Iterate over rows in source order.
    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(|cells| Row {
            text: &self.text,
            cells,
        })
    }

    /// Cell content at (`row`, `column`), or `None` when either index is
    /// out of range.
    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.row(row)?.cell(column)
    }

    /// True when every row has the same number of cells. Vacuously true
    /// for an empty table.
    pub fn is_rectangular(&self) -> bool {
        self.rows.iter().map(Vec::len).all_equal()
    }

    /// Copy the cells out into owned rows, for callers that want a plain
    /// collection instead of views tied to the table's lifetime.
    pub fn to_vecs(&self) -> Vec<Vec<String>> {
        self.rows()
            .map(|row| row.iter().map(str::to_string).collect())
            .collect()
    }
}

/// Borrowed view of one row. Resolves cell spans to string slices.
///
/// Rows coming out of the tokenizer always hold at least one cell; empty
/// lines never produce a row.
#[derive(Debug, Clone, Copy)]
pub struct Row<'t> {
    text: &'t str,
    cells: &'t [Span],
}

impl<'t> Row<'t> {
    /// Number of cells in this row.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cell content at `index`, in column order, or `None` past the end.
    pub fn cell(&self, index: usize) -> Option<&'t str> {
        self.cells.get(index).map(|span| &self.text[span.start()..span.end()])
    }

    /// Byte range of the cell at `index` within the table's text.
    pub fn span(&self, index: usize) -> Option<Span> {
        self.cells.get(index).copied()
    }

    /// Iterate over cell contents in column order.
    pub fn iter(&self) -> impl Iterator<Item = &'t str> {
        let text = self.text;
        let cells = self.cells;
        cells.iter().map(move |span| &text[span.start()..span.end()])
    }
}
