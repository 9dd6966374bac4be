// src/augment/rows.rs
use anyhow::{bail, Result};
use std::borrow::Cow;

/// Where the scanner sits relative to the CSV field grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    FieldStart,
    Unquoted,
    Quoted,
    /// Saw a `"` inside a quoted field: either an escape or the closing quote.
    QuoteInQuoted,
}

/// Prepare raw CSV bytes for `csv::Reader`.
///
/// The `csv` reader silently skips blank lines, which would drop rows. Every
/// blank line outside a quoted field is rewritten as a single empty quoted
/// field (`""`), so it parses as a row with one empty field. Blank lines
/// inside a quoted field are field content and are left alone.
///
/// Quotes are tracked the way the reader does: a `"` only opens a quoted field
/// at the start of a field, and `""` inside a quoted field is an escape. Input
/// that ends while still inside a quoted field is rejected, since the reader
/// would otherwise swallow the rest of the file into one field.
///
/// Returns the input unchanged (borrowed) when it has no blank lines.
pub fn preserve_blank_rows(data: &[u8]) -> Result<Cow<'_, [u8]>> {
    let mut state = State::FieldStart;
    let mut record_start = true;
    let mut line = 1usize;
    let mut quote_line = 0usize;
    let mut out: Option<Vec<u8>> = None;

    for (i, &b) in data.iter().enumerate() {
        let newline = b == b'\n' || b == b'\r';

        if record_start && newline {
            out.get_or_insert_with(|| {
                let mut buf = Vec::with_capacity(data.len() + 16);
                buf.extend_from_slice(&data[..i]);
                buf
            })
            .extend_from_slice(b"\"\"");
        }
        if let Some(buf) = out.as_mut() {
            buf.push(b);
        }
        if b == b'\n' {
            line += 1;
        }

        state = match (state, b) {
            (State::Quoted, b'"') => State::QuoteInQuoted,
            (State::Quoted, _) => State::Quoted,
            (State::QuoteInQuoted, b'"') => State::Quoted,
            (State::FieldStart, b'"') => {
                quote_line = line;
                State::Quoted
            }
            (_, b',') => State::FieldStart,
            (_, _) if newline => State::FieldStart,
            _ => State::Unquoted,
        };

        // `\r\n` ends one record, not two.
        record_start = match state {
            State::FieldStart if newline => !(b == b'\r' && data.get(i + 1) == Some(&b'\n')),
            _ => false,
        };
    }

    if state == State::Quoted {
        bail!(
            "malformed CSV: quoted field starting on line {} is never closed",
            quote_line
        );
    }

    Ok(match out {
        Some(buf) => Cow::Owned(buf),
        None => Cow::Borrowed(data),
    })
}
