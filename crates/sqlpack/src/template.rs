//! Statement prefixes.
//!
//! The packer treats its template as opaque text. [`Template`] builds the
//! common `REPLACE INTO`/`INSERT INTO` prefixes with a backtick-quoted table
//! name, in the same way `Ident` quoting works for double-quoted names:
//! embedded quote characters are doubled, NUL is refused.
//!
//! # Example
//! ```
//! use sqlpack::Template;
//!
//! let t = Template::replace_into("dummy_2")?;
//! assert_eq!(t.as_str(), "REPLACE INTO `dummy_2` VALUES ");
//! # Ok::<(), sqlpack::PackError>(())
//! ```

use crate::error::{PackError, PackResult};
use std::fmt;

/// A statement prefix that tuples are appended to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template(String);

impl Template {
    /// Use `prefix` verbatim. No separator is added before the first tuple.
    pub fn raw(prefix: impl Into<String>) -> Self {
        Self(prefix.into())
    }

    /// ``REPLACE INTO `table` VALUES ``
    pub fn replace_into(table: &str) -> PackResult<Self> {
        Self::with_verb("REPLACE", table)
    }

    /// ``INSERT INTO `table` VALUES ``
    pub fn insert_into(table: &str) -> PackResult<Self> {
        Self::with_verb("INSERT", table)
    }

    fn with_verb(verb: &str, table: &str) -> PackResult<Self> {
        let mut out = String::with_capacity(verb.len() + table.len() + 16);
        out.push_str(verb);
        out.push_str(" INTO ");
        push_quoted_ident(&mut out, table)?;
        out.push_str(" VALUES ");
        Ok(Self(out))
    }

    /// The prefix text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Byte length of the prefix.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Template {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Template {
    fn from(s: &str) -> Self {
        Self::raw(s)
    }
}

impl From<String> for Template {
    fn from(s: String) -> Self {
        Self::raw(s)
    }
}

impl From<Template> for String {
    fn from(t: Template) -> Self {
        t.0
    }
}

/// Append `` `name` `` to `out`, doubling embedded backticks.
///
/// A dotted name like `db.table` is quoted per part: `` `db`.`table` ``.
pub fn push_quoted_ident(out: &mut String, name: &str) -> PackResult<()> {
    if name.is_empty() {
        return Err(PackError::invalid_identifier("table name cannot be empty"));
    }
    if name.contains('\0') {
        return Err(PackError::invalid_identifier(
            "table name cannot contain NUL character",
        ));
    }

    for (i, part) in name.split('.').enumerate() {
        if part.is_empty() {
            return Err(PackError::invalid_identifier(format!(
                "empty segment in table name '{name}'"
            )));
        }
        if i > 0 {
            out.push('.');
        }
        out.push('`');
        for ch in part.chars() {
            if ch == '`' {
                out.push('`');
            }
            out.push(ch);
        }
        out.push('`');
    }
    Ok(())
}
