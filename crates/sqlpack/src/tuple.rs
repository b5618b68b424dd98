//! Row to tuple rendering.
//!
//! A row `["a", "b"]` becomes `('a','b')`. Sizing is left to the packer.

use crate::error::{PackError, PackResult};
use crate::escape::{escaped_len, quote_into};

/// Render `row` as a parenthesized tuple of quoted literals.
///
/// Fails with [`PackError::EmptyRow`] when the row has no fields. The
/// reported index is `0`; the packer reports the real position.
pub fn build_tuple<S: AsRef<str>>(row: &[S]) -> PackResult<String> {
    let mut out = String::with_capacity(tuple_len(row));
    write_tuple(&mut out, row)?;
    Ok(out)
}

/// Append the tuple for `row` to `out`.
///
/// `out` is left untouched on error.
pub fn write_tuple<S: AsRef<str>>(out: &mut String, row: &[S]) -> PackResult<()> {
    let Some((first, rest)) = row.split_first() else {
        return Err(PackError::EmptyRow { index: 0 });
    };

    out.push('(');
    quote_into(out, first.as_ref());
    for field in rest {
        out.push(',');
        quote_into(out, field.as_ref());
    }
    out.push(')');
    Ok(())
}

/// Exact byte length of the rendered tuple, or `0` for an empty row.
pub fn tuple_len<S: AsRef<str>>(row: &[S]) -> usize {
    if row.is_empty() {
        return 0;
    }
    // parens + one comma between fields + two quotes per field
    let framing = 2 + (row.len() - 1) + 2 * row.len();
    framing
        + row
            .iter()
            .map(|f| escaped_len(f.as_ref()))
            .sum::<usize>()
}
