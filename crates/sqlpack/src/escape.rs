//! String literal escaping.
//!
//! Fields are rendered as MySQL-style single-quoted literals: each character
//! that is unsafe inside `'...'` gets a backslash in front of it and is
//! otherwise kept as-is. The input is walked as a sequence of `char`s, so
//! multi-byte text is copied through untouched.
//!
//! # Example
//! ```
//! use sqlpack::escape::{escape, quote};
//!
//! assert_eq!(escape(r"O'Brien\path"), r"O\'Brien\\path");
//! assert_eq!(quote("it's"), r"'it\'s'");
//! ```

pub const BACKSLASH: char = '\\';
pub const ASCII_NUL: char = '\0';
pub const CARRIAGE_RETURN: char = '\r';
pub const NEW_LINE: char = '\n';
pub const CTRL_Z: char = '\x1A';
pub const SINGLE_QUOTE: char = '\'';
pub const DOUBLE_QUOTE: char = '"';

/// Returns `true` if `c` must be backslash-escaped inside a quoted literal.
#[inline]
pub fn needs_escape(c: char) -> bool {
    matches!(
        c,
        BACKSLASH | ASCII_NUL | CARRIAGE_RETURN | NEW_LINE | CTRL_Z | SINGLE_QUOTE | DOUBLE_QUOTE
    )
}

/// Escape `field` for use inside a single-quoted literal.
pub fn escape(field: &str) -> String {
    let mut out = String::with_capacity(escaped_len(field));
    escape_into(&mut out, field);
    out
}

/// Append the escaped form of `field` to `out`.
pub fn escape_into(out: &mut String, field: &str) {
    for c in field.chars() {
        if needs_escape(c) {
            out.push(BACKSLASH);
        }
        out.push(c);
    }
}

/// Wrap the escaped field in single quotes.
pub fn quote(field: &str) -> String {
    let mut out = String::with_capacity(escaped_len(field) + 2);
    quote_into(&mut out, field);
    out
}

/// Append `'` + escaped field + `'` to `out`.
pub fn quote_into(out: &mut String, field: &str) {
    out.push(SINGLE_QUOTE);
    escape_into(out, field);
    out.push(SINGLE_QUOTE);
}

/// Byte length of `escape(field)`, computed without allocating.
///
/// Every escapable character is ASCII, so each one adds exactly one byte.
pub fn escaped_len(field: &str) -> usize {
    field.len() + field.chars().filter(|&c| needs_escape(c)).count()
}

/// Reverse [`escape`]: drop one backslash in front of each escapable character.
///
/// A backslash followed by anything else (or by nothing) is kept.
pub fn unescape(escaped: &str) -> String {
    let mut out = String::with_capacity(escaped.len());
    let mut chars = escaped.chars().peekable();
    while let Some(c) = chars.next() {
        if c == BACKSLASH {
            if let Some(&next) = chars.peek() {
                if needs_escape(next) {
                    out.push(next);
                    chars.next();
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}
