//! Errors surfaced by the core mapping engine.
//!
//! No exceptions escape engine methods. An out-of-footprint point is a
//! silent per-point skip and a degenerate fusion cell is a logged per-cell
//! skip (see `FusionReport`); neither is a variant here. `SizeMismatch` and
//! `LengthMismatch` are the genuine hard errors: caller contract violations
//! that make the requested operation a no-op.

use thiserror::Error;

use crate::grid::GridSize;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MapError {
    #[error("propagation input shape {actual:?} does not match grid shape {expected:?}")]
    SizeMismatch { expected: GridSize, actual: GridSize },

    #[error("{points} points but {variances} variances; inputs must be parallel")]
    LengthMismatch { points: usize, variances: usize },
}
