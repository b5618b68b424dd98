//! # sqlpack
//!
//! Packs rows of text fields into bulk `INSERT`/`REPLACE` statements that stay
//! under the server's `max_allowed_packet`.
//!
//! ## Features
//!
//! - **Safe literals**: every field is quoted and backslash-escaped
//! - **Fewest statements**: a single greedy pass fills each statement up to the limit
//! - **Order preserving**: rows come out in the order they went in
//! - **Explicit policy**: empty rows, reserved bytes and limit range checks are options
//! - **Pure core**: no I/O; running the statements is left to a [`StatementExecutor`]
//!
//! ## Example
//!
//! ```
//! use sqlpack::{StatementPacker, Template};
//!
//! let rows = vec![
//!     vec!["1", "product", "description"],
//!     vec!["2", "O'Brien", "back\\slash"],
//! ];
//! let stmts = StatementPacker::new(Template::insert_into("items")?, 16 * 1024 * 1024).pack(&rows)?;
//! assert_eq!(
//!     stmts,
//!     ["INSERT INTO `items` VALUES ('1','product','description'),('2','O\\'Brien','back\\\\slash')"]
//! );
//! # Ok::<(), sqlpack::PackError>(())
//! ```

pub mod error;
pub mod escape;
pub mod exec;
pub mod options;
pub mod packer;
pub mod template;
pub mod tuple;

pub use error::{ExecError, ExecResult, PackError, PackResult};
pub use escape::{escape, quote, unescape};
pub use exec::{ExecFailure, ExecOutcome, ExecReport, PoolConfig, StatementExecutor, execute_all};
pub use options::{
    EmptyRowPolicy, MAX_ALLOWED_PACKET, MIN_ALLOWED_PACKET, PackOptions, RESERVED_BYTES,
};
pub use packer::{PackChunks, StatementPacker, build_statements};
pub use template::Template;
pub use tuple::build_tuple;
