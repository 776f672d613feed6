//! Error types for the `lightgrid-world` crate.
//!
//! Grid operations themselves never fail: out-of-range access is treated as
//! blocked. Errors only arise when an activity grid is constructed from
//! external input.

/// Errors that can occur while building world grids from external data.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// The matrix does not have the expected number of rows.
    #[error("activity grid has {actual} rows, expected {expected}")]
    RowCount {
        /// Required row count.
        expected: usize,
        /// Row count that was supplied.
        actual: usize,
    },

    /// A row does not have the expected number of columns.
    #[error("activity grid row {row} has {actual} columns, expected {expected}")]
    ColumnCount {
        /// Zero-based row index.
        row: usize,
        /// Required column count.
        expected: usize,
        /// Column count that was supplied.
        actual: usize,
    },

    /// A cell holds a value outside the accepted activity range.
    #[error("activity value {value} at ({x}, {y}) exceeds maximum {max}")]
    ValueOutOfRange {
        /// Column of the offending cell.
        x: usize,
        /// Row of the offending cell.
        y: usize,
        /// The supplied value.
        value: u8,
        /// Largest accepted value.
        max: u8,
    },
}
