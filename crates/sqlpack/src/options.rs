//! Packing policy.
//!
//! The knobs here cover the behaviours that used to differ between copies of
//! the builder: what to do with field-less rows, how many bytes to keep free
//! below the limit, and whether the limit itself is range-checked.

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Smallest accepted byte limit (MariaDB's `max_allowed_packet` floor).
pub const MIN_ALLOWED_PACKET: usize = 1024;

/// Largest accepted byte limit (MariaDB's `max_allowed_packet` ceiling, 1 GiB).
pub const MAX_ALLOWED_PACKET: usize = 1_073_741_824;

/// Bytes kept free below the limit when appending to a non-empty statement.
///
/// Accounts for the framing byte the server counts against the packet on top
/// of the statement text.
pub const RESERVED_BYTES: usize = 1;

/// What the packer does with a row that has no fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyRowPolicy {
    /// Abort the whole batch with [`PackError::EmptyRow`](crate::PackError::EmptyRow).
    #[default]
    Fail,
    /// Drop the row and keep going.
    Skip,
}

impl fmt::Display for EmptyRowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Fail => "fail",
            Self::Skip => "skip",
        })
    }
}

impl FromStr for EmptyRowPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail" => Ok(Self::Fail),
            "skip" => Ok(Self::Skip),
            other => Err(format!("unknown empty-row policy: {other} (expected fail or skip)")),
        }
    }
}

/// Options for [`build_statements`](crate::build_statements).
///
/// Defaults: empty rows fail the batch, one reserved byte, and the limit must
/// lie in `[MIN_ALLOWED_PACKET, MAX_ALLOWED_PACKET]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackOptions {
    /// Policy for field-less rows.
    pub on_empty_row: EmptyRowPolicy,
    /// Bytes kept free when deciding whether another tuple fits.
    pub reserved_bytes: usize,
    /// Whether the byte limit is checked against the allowed packet range.
    pub validate_byte_limit_range: bool,
}

impl Default for PackOptions {
    fn default() -> Self {
        Self {
            on_empty_row: EmptyRowPolicy::Fail,
            reserved_bytes: RESERVED_BYTES,
            validate_byte_limit_range: true,
        }
    }
}

impl PackOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the empty-row policy.
    pub fn with_on_empty_row(mut self, policy: EmptyRowPolicy) -> Self {
        self.on_empty_row = policy;
        self
    }

    /// Set the number of reserved bytes.
    pub fn with_reserved_bytes(mut self, bytes: usize) -> Self {
        self.reserved_bytes = bytes;
        self
    }

    /// Enable or disable the byte limit range check.
    ///
    /// With the check off, any limit is accepted and rows that cannot fit
    /// surface as [`PackError::OversizedSingleRow`](crate::PackError::OversizedSingleRow).
    pub fn with_byte_limit_range_check(mut self, enabled: bool) -> Self {
        self.validate_byte_limit_range = enabled;
        self
    }
}
