//! Tokenize CSV text into a table of rows of cell slices.
//!
//! The default entry point, [`parse`], is a single-pass tokenizer that is
//! deliberately lenient: malformed quoting is reinterpreted under the
//! current scanning mode instead of being rejected, so it never fails and
//! never loses track of where it is. This is the algorithm you should
//! reach for first, because it is deterministic and easy to reason about.
//!
//! The strict layer ([`quirks`], [`parse_strict`]) sits on top for
//! callers that would rather hear about questionable input up front than
//! get a best-effort table back. Nothing routes through it by default;
//! it is a separate, opt-in set of entry points.

mod lenient;
mod strict;
mod table;

pub use lenient::parse;
pub use strict::{parse_strict, parse_with_unescaped_delimiters, quirks, Quirk};
pub use table::{Row, Span, Table};
