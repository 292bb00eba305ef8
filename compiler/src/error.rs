//! Error types for composition runs.

use crate::bounds::BoundParseError;
use crate::connect::Operator;
use crate::source::SourceError;
use crate::tile::ShapeError;

/// Result type alias for composition operations.
pub type ComposeResult<T> = Result<T, ComposeError>;

/// Errors that abort a composition run.
#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    /// Boundary-location counts do not fit the operator's shape.
    #[error("connector {} ({operator}) cannot connect: {detail}", operator.connector_name())]
    ConnectionArityMismatch { operator: Operator, detail: String },

    /// An operator was applied with too few operand tiles.
    #[error("operator `{operator}` needs {needed} operand tiles but only {available} available")]
    StackUnderflow {
        operator: Operator,
        needed: usize,
        available: usize,
    },

    /// The expression produced no tile at all.
    #[error("composition produced no tile")]
    EmptyComposition,

    /// The tile source could not provide a tile.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// A loaded tile violates its class shape or structural invariants.
    #[error("tile `{name}` is malformed: {reason}")]
    MalformedTile {
        name: String,
        #[source]
        reason: ShapeError,
    },

    /// A tile's parameter-bound label could not be parsed.
    #[error("invalid parameter bound: {0}")]
    Bound(#[from] BoundParseError),
}
