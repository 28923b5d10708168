use crate::board::{Color, Position};
use thiserror::Error;

/// Every way the engine can decline a request.
///
/// None of these leave the game in a modified state: a rejected request is
/// checked before anything on the board is touched.
#[derive(Debug, Error)]
pub enum ChessError {
    #[error("no piece of the side to move with a legal move on {0}")]
    InvalidSelection(Position),

    #[error("{from} cannot move to {to}")]
    IllegalDestination { from: Position, to: Position },

    #[error("no {0} king on the board")]
    NoKingPresent(Color),

    #[error("nothing to undo")]
    NothingToUndo,

    #[error("invalid square: {0:?}")]
    InvalidSquare(String),

    #[error("invalid argument: {0:?}")]
    InvalidArgument(String),

    #[error("invalid board: {0}")]
    InvalidBoard(String),

    #[error("malformed snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
}
