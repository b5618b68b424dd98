//! Greedy statement packing.
//!
//! Rows are rendered to tuples and appended to the current statement until
//! the next tuple would push it over the byte limit; then the statement is
//! closed and a new one is started from the template. One pass, row order
//! preserved, no statement ever exceeds the limit.
//!
//! # Example
//! ```
//! use sqlpack::{PackOptions, build_statements};
//!
//! let rows = [["a", "b", "c"]];
//! let stmts = build_statements(&rows, "INSERT INTO t VALUES", 2048, &PackOptions::default())?;
//! assert_eq!(stmts, ["INSERT INTO t VALUES('a','b','c')"]);
//! # Ok::<(), sqlpack::PackError>(())
//! ```

use crate::error::{PackError, PackResult};
use crate::options::{EmptyRowPolicy, MAX_ALLOWED_PACKET, MIN_ALLOWED_PACKET, PackOptions};
use crate::tuple::{tuple_len, write_tuple};
use std::marker::PhantomData;

/// Pack `rows` into as few statements as the byte limit allows.
///
/// Each statement is `template` followed directly by one or more
/// comma-separated tuples. The template is used verbatim.
///
/// Fails with:
/// - [`PackError::InvalidByteLimit`] if range validation is on and the limit
///   is outside `[MIN_ALLOWED_PACKET, MAX_ALLOWED_PACKET]`
/// - [`PackError::EmptyInput`] if there are no rows (or none survive skipping)
/// - [`PackError::EmptyRow`] for a field-less row under [`EmptyRowPolicy::Fail`]
/// - [`PackError::OversizedSingleRow`] if one tuple cannot fit even alone
pub fn build_statements<I, R, S>(
    rows: I,
    template: &str,
    byte_limit: usize,
    options: &PackOptions,
) -> PackResult<Vec<String>>
where
    I: IntoIterator<Item = R>,
    R: AsRef<[S]>,
    S: AsRef<str>,
{
    validate_byte_limit(byte_limit, options)?;
    pack_from::<I, R, S>(rows, 0, template, byte_limit, options)
}

fn validate_byte_limit(byte_limit: usize, options: &PackOptions) -> PackResult<()> {
    if options.validate_byte_limit_range
        && !(MIN_ALLOWED_PACKET..=MAX_ALLOWED_PACKET).contains(&byte_limit)
    {
        return Err(PackError::InvalidByteLimit {
            limit: byte_limit,
            min: MIN_ALLOWED_PACKET,
            max: MAX_ALLOWED_PACKET,
        });
    }
    Ok(())
}

/// Pack rows whose first element has position `first_index` in the caller's input.
fn pack_from<I, R, S>(
    rows: I,
    first_index: usize,
    template: &str,
    byte_limit: usize,
    options: &PackOptions,
) -> PackResult<Vec<String>>
where
    I: IntoIterator<Item = R>,
    R: AsRef<[S]>,
    S: AsRef<str>,
{
    let mut rows = rows.into_iter().peekable();
    if rows.peek().is_none() {
        return Err(PackError::EmptyInput);
    }

    let mut acc = Accumulator::new(template, byte_limit, options.reserved_bytes);
    for (offset, row) in rows.enumerate() {
        let index = first_index + offset;
        let row = row.as_ref();
        if row.is_empty() {
            match options.on_empty_row {
                EmptyRowPolicy::Skip => continue,
                EmptyRowPolicy::Fail => return Err(PackError::EmptyRow { index }),
            }
        }
        acc.push_row(index, row)?;
    }

    let statements = acc.finish()?;

    #[cfg(feature = "tracing")]
    tracing::info!(
        target: "sqlpack.packer",
        statements = statements.len(),
        byte_limit,
        "packed rows into statements"
    );

    Ok(statements)
}

/// The statement under construction plus everything already closed.
struct Accumulator<'a> {
    template: &'a str,
    byte_limit: usize,
    reserved_bytes: usize,
    current: String,
    tuples: usize,
    done: Vec<String>,
}

impl<'a> Accumulator<'a> {
    fn new(template: &'a str, byte_limit: usize, reserved_bytes: usize) -> Self {
        Self {
            template,
            byte_limit,
            reserved_bytes,
            current: String::from(template),
            tuples: 0,
            done: Vec::new(),
        }
    }

    fn push_row<S: AsRef<str>>(&mut self, index: usize, row: &[S]) -> PackResult<()> {
        if self.tuples > 0 {
            let needed = self
                .current
                .len()
                .saturating_add(1)
                .saturating_add(tuple_len(row))
                .saturating_add(self.reserved_bytes);
            if needed > self.byte_limit {
                self.close();
            }
        }

        if self.tuples > 0 {
            self.current.push(',');
            write_tuple(&mut self.current, row)?;
            self.tuples += 1;
            return Ok(());
        }

        write_tuple(&mut self.current, row)?;
        self.tuples = 1;
        if self.current.len() > self.byte_limit {
            return Err(PackError::OversizedSingleRow {
                index,
                len: self.current.len(),
                limit: self.byte_limit,
            });
        }
        Ok(())
    }

    /// Move the current statement to `done` and restart from the template.
    fn close(&mut self) {
        let mut next = String::with_capacity(self.current.capacity());
        next.push_str(self.template);
        let stmt = std::mem::replace(&mut self.current, next);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            target: "sqlpack.packer",
            statement = self.done.len(),
            tuples = self.tuples,
            bytes = stmt.len(),
            "statement closed"
        );

        self.done.push(stmt);
        self.tuples = 0;
    }

    fn finish(mut self) -> PackResult<Vec<String>> {
        if self.tuples == 0 {
            return Err(PackError::EmptyInput);
        }
        self.close();
        Ok(self.done)
    }
}

/// Fluent front end for [`build_statements`].
///
/// # Example
/// ```
/// use sqlpack::{EmptyRowPolicy, StatementPacker, Template};
///
/// let packer = StatementPacker::new(Template::replace_into("foo")?, 1024)
///     .on_empty_row(EmptyRowPolicy::Skip);
/// let stmts = packer.pack(vec![vec!["a", "b"], vec![], vec!["c", "d"]])?;
/// assert_eq!(stmts, ["REPLACE INTO `foo` VALUES ('a','b'),('c','d')"]);
/// # Ok::<(), sqlpack::PackError>(())
/// ```
#[must_use]
#[derive(Debug, Clone)]
pub struct StatementPacker {
    template: String,
    byte_limit: usize,
    options: PackOptions,
}

impl StatementPacker {
    /// Create a packer with default [`PackOptions`].
    pub fn new(template: impl Into<String>, byte_limit: usize) -> Self {
        Self {
            template: template.into(),
            byte_limit,
            options: PackOptions::default(),
        }
    }

    /// Replace all options at once.
    pub fn options(mut self, options: PackOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the empty-row policy.
    pub fn on_empty_row(mut self, policy: EmptyRowPolicy) -> Self {
        self.options.on_empty_row = policy;
        self
    }

    /// Set the number of reserved bytes.
    pub fn reserved_bytes(mut self, bytes: usize) -> Self {
        self.options.reserved_bytes = bytes;
        self
    }

    /// Enable or disable the byte limit range check.
    pub fn validate_byte_limit_range(mut self, enabled: bool) -> Self {
        self.options.validate_byte_limit_range = enabled;
        self
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn byte_limit(&self) -> usize {
        self.byte_limit
    }

    pub fn pack_options(&self) -> &PackOptions {
        &self.options
    }

    /// Pack all rows in one call.
    pub fn pack<I, R, S>(&self, rows: I) -> PackResult<Vec<String>>
    where
        I: IntoIterator<Item = R>,
        R: AsRef<[S]>,
        S: AsRef<str>,
    {
        build_statements::<I, R, S>(rows, &self.template, self.byte_limit, &self.options)
    }

    /// Pack `rows` in independent chunks of at most `rows_per_chunk` rows.
    ///
    /// Each item is the statement list for one chunk; statements never span
    /// chunks. A chunk whose rows were all skipped yields nothing and the
    /// next chunk follows. Dropping the iterator early stops all further
    /// work, which is how long loads are cancelled. Row indices in errors
    /// are positions in the full input. The iterator ends after the first
    /// error; [`PackError::EmptyInput`] is reported only when the whole
    /// input produced no tuple.
    ///
    /// # Panics
    /// If `rows_per_chunk` is zero.
    pub fn chunks<I, R, S>(&self, rows: I, rows_per_chunk: usize) -> PackChunks<'_, I::IntoIter, S>
    where
        I: IntoIterator<Item = R>,
        R: AsRef<[S]>,
        S: AsRef<str>,
    {
        assert!(rows_per_chunk > 0, "rows_per_chunk must be positive");
        PackChunks {
            packer: self,
            rows: rows.into_iter(),
            rows_per_chunk,
            next_index: 0,
            started: false,
            packed_any: false,
            finished: false,
            _fields: PhantomData,
        }
    }
}

/// Iterator returned by [`StatementPacker::chunks`].
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct PackChunks<'a, I, S> {
    packer: &'a StatementPacker,
    rows: I,
    rows_per_chunk: usize,
    next_index: usize,
    started: bool,
    /// At least one chunk produced statements.
    packed_any: bool,
    finished: bool,
    _fields: PhantomData<fn() -> S>,
}

impl<I, R, S> Iterator for PackChunks<'_, I, S>
where
    I: Iterator<Item = R>,
    R: AsRef<[S]>,
    S: AsRef<str>,
{
    type Item = PackResult<Vec<String>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        if !self.started {
            self.started = true;
            if let Err(e) = validate_byte_limit(self.packer.byte_limit, &self.packer.options) {
                self.finished = true;
                return Some(Err(e));
            }
        }

        loop {
            let first = self.next_index;
            let chunk: Vec<R> = self.rows.by_ref().take(self.rows_per_chunk).collect();
            if chunk.is_empty() {
                self.finished = true;
                // No surviving row anywhere in the input is still an error.
                return (!self.packed_any).then_some(Err(PackError::EmptyInput));
            }
            self.next_index += chunk.len();

            match pack_from::<_, R, S>(
                chunk,
                first,
                &self.packer.template,
                self.packer.byte_limit,
                &self.packer.options,
            ) {
                Ok(statements) => {
                    self.packed_any = true;
                    return Some(Ok(statements));
                }
                // Every row of a non-empty chunk was skipped.
                Err(PackError::EmptyInput) => continue,
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            }
        }
    }
}
